//! ear agent - preloaded into every process of an observed build.
//!
//! This library is compiled as a cdylib and loaded via LD_PRELOAD (Linux)
//! or DYLD_INSERT_LIBRARIES (macOS). It shadows the exec and posix_spawn
//! families and forwards each call to the real implementation with the
//! interception keys re-injected into the environment, so every
//! descendant process loads the agent as well.

pub mod config;
pub mod environment;
pub mod error;
pub mod forward;
#[cfg(not(test))]
mod hooks;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use environment::{EnvironmentBuilder, EnvironmentView};
pub use error::EnvironmentError;

use std::sync::atomic::{AtomicBool, Ordering};

use ear_protocol::LOG_ENV_VAR;
use log::{debug, info};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Logging stays off unless `EAR_LOG` asks for it: anything the agent
/// writes lands on the observed program's stderr.
fn init_logging() {
    let env = env_logger::Env::new().filter_or(LOG_ENV_VAR, "off");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Agent entry point called when the library is loaded.
///
/// Captures the interception keys from the inherited environment. Safe to
/// call more than once; later calls do nothing.
#[unsafe(no_mangle)]
pub extern "C" fn ear_init() -> i32 {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return 0;
    }

    init_logging();

    let config = config::captured();
    if config.is_empty() {
        info!("No interception keys inherited, forwarding environments unchanged");
    }
    for (key, value) in config.configured() {
        debug!("{} = {}", key, value.to_string_lossy());
    }
    0
}

/// Constructor attribute for automatic initialization on library load (Linux).
#[cfg(all(any(target_os = "linux", target_os = "freebsd"), not(test)))]
#[unsafe(link_section = ".init_array")]
#[used]
static INIT: extern "C" fn() = {
    extern "C" fn init() {
        ear_init();
    }
    init
};

/// Constructor attribute for automatic initialization on library load (macOS).
#[cfg(all(target_os = "macos", not(test)))]
#[unsafe(link_section = "__DATA,__mod_init_func")]
#[used]
static INIT: extern "C" fn() = {
    extern "C" fn init() {
        ear_init();
    }
    init
};
