//! Forwarding of intercepted calls to the real implementation.
//!
//! Every exported hook follows the same sequence: resolve the real
//! function, build the augmented environment, call through with the
//! caller's arguments, and hand back the real result and errno.

use core::ffi::{CStr, c_char, c_int};

use ear_intercept::{Primitive, ResolveError};
use ear_protocol::DistinguishedKey;
use log::{debug, error, warn};

use crate::config::Config;
use crate::environment::{EnvironmentBuilder, EnvironmentView, split_entry};
use crate::error::{EnvironmentError, Result};

/// How a primitive reports failure to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Returns -1 and sets `errno` (exec family).
    Errno,
    /// Returns the error number (posix_spawn family).
    ReturnCode,
}

impl Convention {
    /// Report `code` the way the primitive would.
    pub fn fail(self, code: c_int) -> c_int {
        match self {
            Convention::Errno => {
                set_errno(code);
                -1
            }
            Convention::ReturnCode => code,
        }
    }
}

/// Unwrap a resolved real function, aborting if it is unavailable.
///
/// Returning to the caller would leave only the agent's own export to
/// call, which recurses.
pub fn require<T>(primitive: Primitive, resolved: std::result::Result<T, ResolveError>) -> T {
    match resolved {
        Ok(function) => function,
        Err(e) => {
            error!("Cannot forward {}: {}", primitive.name(), e);
            std::process::abort()
        }
    }
}

/// Stage `config` on `builder` and build the view.
pub fn augment<'a>(
    config: &'a Config,
    mut builder: EnvironmentBuilder<'a>,
) -> Result<EnvironmentView> {
    config.apply(&mut builder)?;
    builder.build()
}

/// Call `real` with `envp` replaced by its augmented copy.
///
/// A null `envp` is an empty environment, so the real function receives
/// only the distinguished keys. The view is released after `real`
/// returns, with `errno` preserved.
///
/// # Safety
/// `envp` must be null or a valid null-terminated environment array.
pub unsafe fn with_environment<F>(
    config: &Config,
    envp: *const *const c_char,
    convention: Convention,
    real: F,
) -> c_int
where
    F: FnOnce(*const *const c_char) -> c_int,
{
    let builder = unsafe { EnvironmentBuilder::from_raw(envp) };
    let view = match augment(config, builder) {
        Ok(view) => view,
        Err(e) => return reject(convention, &e),
    };

    let rc = real(view.as_ptr());
    let saved = errno();
    drop(view);
    set_errno(saved);
    rc
}

/// Bring the live environment to its augmented values, then call `real`.
///
/// For primitives that read the environment from `environ` themselves.
///
/// # Safety
/// No other thread may modify the process environment during the call.
pub unsafe fn with_live_environment<F>(config: &Config, convention: Convention, real: F) -> c_int
where
    F: FnOnce() -> c_int,
{
    let view = match augment(config, unsafe { EnvironmentBuilder::from_process() }) {
        Ok(view) => view,
        Err(e) => return reject(convention, &e),
    };
    if let Err(e) = publish(&view) {
        return reject(convention, &e);
    }
    drop(view);

    real()
}

/// Write the distinguished entries of `view` into the live environment.
///
/// `setenv` replaces the first entry for a key where it stands and appends
/// a missing one, matching the order `build` produces. Later entries for
/// the same key are then removed.
fn publish(view: &EnvironmentView) -> Result<()> {
    for (key, value) in view.distinguished() {
        let rc = unsafe { libc::setenv(key.c_name().as_ptr(), value.as_ptr(), 1) };
        if rc != 0 {
            return Err(EnvironmentError::AllocationFailure);
        }
    }
    unsafe { drop_duplicate_entries() };
    Ok(())
}

/// Remove every distinguished entry of the live environment after the
/// first one for its key, compacting the array in place.
///
/// # Safety
/// No other thread may read or modify the process environment meanwhile.
unsafe fn drop_duplicate_entries() {
    let live = unsafe { *ear_intercept::environment() };
    if live.is_null() {
        return;
    }

    let mut seen = [false; DistinguishedKey::ALL.len()];
    let mut read = live;
    let mut write = live;
    unsafe {
        while !(*read).is_null() {
            let entry = CStr::from_ptr(*read).to_bytes();
            let key = split_entry(entry).and_then(|(name, _)| DistinguishedKey::from_name(name));
            match key {
                Some(key) if core::mem::replace(&mut seen[key.index()], true) => {
                    debug!("Removing duplicate {} from the live environment", key);
                }
                _ => {
                    *write = *read;
                    write = write.add(1);
                }
            }
            read = read.add(1);
        }
        *write = core::ptr::null_mut();
    }
}

fn reject(convention: Convention, e: &EnvironmentError) -> c_int {
    warn!("Failed to build environment: {}", e);
    convention.fail(e.errno())
}

#[cfg(target_os = "linux")]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
fn errno_location() -> *mut c_int {
    unsafe { libc::__error() }
}

fn errno() -> c_int {
    unsafe { *errno_location() }
}

fn set_errno(code: c_int) {
    unsafe { *errno_location() = code }
}
