//! Loaded-module lookup and the live environment pointer.

use core::ffi::{CStr, c_void};

use crate::types::ModuleInfo;

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
mod linux;

#[cfg(target_os = "macos")]
pub use darwin::environment;

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
pub use linux::environment;

/// Module that contains `address`, via `dladdr`.
pub fn containing_module(address: usize) -> Option<ModuleInfo> {
    let mut info: libc::Dl_info = unsafe { core::mem::zeroed() };
    let rc = unsafe { libc::dladdr(address as *const c_void, &mut info) };
    if rc == 0 || info.dli_fbase.is_null() {
        return None;
    }

    let path = if info.dli_fname.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(info.dli_fname) }
            .to_string_lossy()
            .into_owned()
    };

    Some(ModuleInfo {
        path,
        base_address: info.dli_fbase as usize,
    })
}

/// Module this crate is linked into (the agent library when preloaded).
pub fn own_module() -> Option<ModuleInfo> {
    containing_module(own_module as fn() -> Option<ModuleInfo> as usize)
}

/// Whether `address` lies inside [`own_module`].
pub fn is_own_address(address: usize) -> bool {
    match (containing_module(address), own_module()) {
        (Some(found), Some(own)) => found.base_address == own.base_address,
        _ => false,
    }
}
