//! Exported process-creation entry points.
//!
//! Each symbol shadows the libc function of the same name for every
//! library loaded after the agent. The real function receives the
//! caller's arguments unchanged, with the environment augmented.

use core::ffi::{c_char, c_int};

use ear_intercept::{Primitive, real};
use log::debug;

use crate::config;
use crate::forward::{self, Convention};

fn trace_call(primitive: Primitive, path: *const c_char) {
    if log::log_enabled!(log::Level::Debug) && !path.is_null() {
        let path = unsafe { core::ffi::CStr::from_ptr(path) };
        debug!("{} {}", primitive.name(), path.to_string_lossy());
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn execve(
    path: *const c_char,
    argv: *const *mut c_char,
    envp: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::Execve, real::execve());
    trace_call(Primitive::Execve, path);
    unsafe {
        forward::with_environment(
            config::captured(),
            envp as *const *const c_char,
            Convention::Errno,
            |env| real(path, argv as *const *const c_char, env),
        )
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn execv(path: *const c_char, argv: *const *mut c_char) -> c_int {
    let real = forward::require(Primitive::Execv, real::execv());
    trace_call(Primitive::Execv, path);
    unsafe {
        forward::with_live_environment(config::captured(), Convention::Errno, || {
            real(path, argv as *const *const c_char)
        })
    }
}

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn execvpe(
    file: *const c_char,
    argv: *const *mut c_char,
    envp: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::Execvpe, real::execvpe());
    trace_call(Primitive::Execvpe, file);
    unsafe {
        forward::with_environment(
            config::captured(),
            envp as *const *const c_char,
            Convention::Errno,
            |env| real(file, argv as *const *const c_char, env),
        )
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn execvp(file: *const c_char, argv: *const *mut c_char) -> c_int {
    let real = forward::require(Primitive::Execvp, real::execvp());
    trace_call(Primitive::Execvp, file);
    unsafe {
        forward::with_live_environment(config::captured(), Convention::Errno, || {
            real(file, argv as *const *const c_char)
        })
    }
}

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
#[unsafe(export_name = "execvP")]
pub unsafe extern "C" fn execv_p(
    file: *const c_char,
    search_path: *const c_char,
    argv: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::ExecvP, real::execv_p());
    trace_call(Primitive::ExecvP, file);
    unsafe {
        forward::with_live_environment(config::captured(), Convention::Errno, || {
            real(file, search_path, argv as *const *const c_char)
        })
    }
}

#[cfg(target_os = "macos")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exect(
    path: *const c_char,
    argv: *const *mut c_char,
    envp: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::Exect, real::exect());
    trace_call(Primitive::Exect, path);
    unsafe {
        forward::with_environment(
            config::captured(),
            envp as *const *const c_char,
            Convention::Errno,
            |env| real(path, argv as *const *const c_char, env),
        )
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn posix_spawn(
    pid: *mut libc::pid_t,
    path: *const c_char,
    file_actions: *const libc::posix_spawn_file_actions_t,
    attrp: *const libc::posix_spawnattr_t,
    argv: *const *mut c_char,
    envp: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::PosixSpawn, real::posix_spawn());
    trace_call(Primitive::PosixSpawn, path);
    unsafe {
        forward::with_environment(
            config::captured(),
            envp as *const *const c_char,
            Convention::ReturnCode,
            |env| real(pid, path, file_actions, attrp, argv as *const *const c_char, env),
        )
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn posix_spawnp(
    pid: *mut libc::pid_t,
    file: *const c_char,
    file_actions: *const libc::posix_spawn_file_actions_t,
    attrp: *const libc::posix_spawnattr_t,
    argv: *const *mut c_char,
    envp: *const *mut c_char,
) -> c_int {
    let real = forward::require(Primitive::PosixSpawnp, real::posix_spawnp());
    trace_call(Primitive::PosixSpawnp, file);
    unsafe {
        forward::with_environment(
            config::captured(),
            envp as *const *const c_char,
            Convention::ReturnCode,
            |env| real(pid, file, file_actions, attrp, argv as *const *const c_char, env),
        )
    }
}
