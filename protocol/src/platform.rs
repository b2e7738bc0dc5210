//! Platform-specific constants and utilities.
//!
//! Centralizes platform-dependent values to avoid scattered #[cfg] blocks.

use std::ffi::CStr;

/// Library file extension for the current platform.
pub const LIB_EXTENSION: &str = if cfg!(target_os = "macos") {
    "dylib"
} else {
    "so"
};

/// Library file prefix for the current platform.
pub const LIB_PREFIX: &str = "lib";

/// Returns the agent library filename for the current platform.
pub fn agent_lib_name() -> String {
    format!("{}ear.{}", LIB_PREFIX, LIB_EXTENSION)
}

/// Environment variable the dynamic loader reads to preload libraries.
pub const PRELOAD_ENV_VAR: &str = if cfg!(target_os = "macos") {
    "DYLD_INSERT_LIBRARIES"
} else {
    "LD_PRELOAD"
};

/// [`PRELOAD_ENV_VAR`] as a C string.
pub const PRELOAD_ENV_VAR_C: &CStr = if cfg!(target_os = "macos") {
    c"DYLD_INSERT_LIBRARIES"
} else {
    c"LD_PRELOAD"
};
