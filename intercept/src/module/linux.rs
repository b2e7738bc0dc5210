use core::ffi::c_char;

unsafe extern "C" {
    static mut environ: *mut *mut c_char;
}

/// Address of the process-wide `environ` pointer.
///
/// References from a shared object bind to the canonical copy, which is
/// the one `setenv` and the exec family operate on.
pub fn environment() -> *mut *mut *mut c_char {
    unsafe { &raw mut environ }
}
