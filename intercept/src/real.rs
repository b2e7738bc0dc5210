//! Typed access to the real process-creation functions.
//!
//! This is the only place where a resolved address becomes a callable.

use core::ffi::{c_char, c_int};

use crate::resolver;
use crate::types::{Primitive, ResolveError};

pub type ExecveFn = unsafe extern "C" fn(
    path: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int;

pub type ExecvFn = unsafe extern "C" fn(path: *const c_char, argv: *const *const c_char) -> c_int;

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
pub type ExecvpeFn = unsafe extern "C" fn(
    file: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int;

pub type ExecvpFn = unsafe extern "C" fn(file: *const c_char, argv: *const *const c_char) -> c_int;

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
pub type ExecvPFn = unsafe extern "C" fn(
    file: *const c_char,
    search_path: *const c_char,
    argv: *const *const c_char,
) -> c_int;

#[cfg(target_os = "macos")]
pub type ExectFn = unsafe extern "C" fn(
    path: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int;

pub type PosixSpawnFn = unsafe extern "C" fn(
    pid: *mut libc::pid_t,
    path: *const c_char,
    file_actions: *const libc::posix_spawn_file_actions_t,
    attrp: *const libc::posix_spawnattr_t,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int;

macro_rules! real_function {
    ($(#[$meta:meta])* $name:ident: $ty:ty => $primitive:ident) => {
        $(#[$meta])*
        pub fn $name() -> Result<$ty, ResolveError> {
            let address = resolver::get(Primitive::$primitive)?;
            // SAFETY: `address` is non-null and was resolved for this
            // primitive's symbol, whose C signature is `$ty`.
            Ok(unsafe { core::mem::transmute::<usize, $ty>(address) })
        }
    };
}

real_function!(execve: ExecveFn => Execve);
real_function!(execv: ExecvFn => Execv);
real_function!(
    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    execvpe: ExecvpeFn => Execvpe
);
real_function!(execvp: ExecvpFn => Execvp);
real_function!(
    #[cfg(any(target_os = "macos", target_os = "freebsd"))]
    execv_p: ExecvPFn => ExecvP
);
real_function!(
    #[cfg(target_os = "macos")]
    exect: ExectFn => Exect
);
real_function!(posix_spawn: PosixSpawnFn => PosixSpawn);
real_function!(posix_spawnp: PosixSpawnFn => PosixSpawnp);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessor_matches_resolver() {
        let f = execve().expect("execve must resolve");
        assert_eq!(f as usize, resolver::get(Primitive::Execve).unwrap());
    }

    #[test]
    fn test_typed_accessors_are_stable() {
        assert_eq!(posix_spawn().unwrap() as usize, posix_spawn().unwrap() as usize);
        assert_eq!(execvp().unwrap() as usize, execvp().unwrap() as usize);
    }

    #[test]
    fn test_real_execve_reports_errno() {
        let f = execve().unwrap();
        let argv: [*const c_char; 2] = [c"/nonexistent/ear".as_ptr(), core::ptr::null()];
        let envp: [*const c_char; 1] = [core::ptr::null()];
        let rc = unsafe { f(c"/nonexistent/ear".as_ptr(), argv.as_ptr(), envp.as_ptr()) };
        assert_eq!(rc, -1);
        assert_eq!(
            std::io::Error::last_os_error().raw_os_error(),
            Some(libc::ENOENT)
        );
    }
}
