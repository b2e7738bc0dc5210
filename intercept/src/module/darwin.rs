use core::ffi::c_char;

unsafe extern "C" {
    fn _NSGetEnviron() -> *mut *mut *mut c_char;
}

/// Address of the process-wide environment pointer.
///
/// `environ` is not reliably bound inside a dylib on Darwin; the
/// accessor from `<crt_externs.h>` is.
pub fn environment() -> *mut *mut *mut c_char {
    unsafe { _NSGetEnviron() }
}
