use core::ffi::CStr;

use thiserror::Error;

/// A process-creation entry point the agent can shadow.
///
/// Only the primitives the target platform provides are compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `execve(path, argv, envp)`
    Execve,
    /// `execv(path, argv)`
    Execv,
    /// `execvpe(file, argv, envp)`
    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    Execvpe,
    /// `execvp(file, argv)`
    Execvp,
    /// `execvP(file, search_path, argv)`
    #[cfg(any(target_os = "macos", target_os = "freebsd"))]
    ExecvP,
    /// `exect(path, argv, envp)`
    #[cfg(target_os = "macos")]
    Exect,
    /// `posix_spawn(pid, path, file_actions, attrp, argv, envp)`
    PosixSpawn,
    /// `posix_spawnp(pid, file, file_actions, attrp, argv, envp)`
    PosixSpawnp,
}

impl Primitive {
    /// Every primitive available on this platform.
    pub const ALL: &'static [Primitive] = &[
        Primitive::Execve,
        Primitive::Execv,
        #[cfg(any(target_os = "linux", target_os = "freebsd"))]
        Primitive::Execvpe,
        Primitive::Execvp,
        #[cfg(any(target_os = "macos", target_os = "freebsd"))]
        Primitive::ExecvP,
        #[cfg(target_os = "macos")]
        Primitive::Exect,
        Primitive::PosixSpawn,
        Primitive::PosixSpawnp,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Symbol name as passed to `dlsym`.
    pub const fn symbol(self) -> &'static CStr {
        match self {
            Primitive::Execve => c"execve",
            Primitive::Execv => c"execv",
            #[cfg(any(target_os = "linux", target_os = "freebsd"))]
            Primitive::Execvpe => c"execvpe",
            Primitive::Execvp => c"execvp",
            #[cfg(any(target_os = "macos", target_os = "freebsd"))]
            Primitive::ExecvP => c"execvP",
            #[cfg(target_os = "macos")]
            Primitive::Exect => c"exect",
            Primitive::PosixSpawn => c"posix_spawn",
            Primitive::PosixSpawnp => c"posix_spawnp",
        }
    }

    pub fn name(self) -> &'static str {
        // Symbol literals are ASCII.
        self.symbol().to_str().unwrap_or("?")
    }

    /// Whether the primitive receives the environment as an argument.
    pub const fn takes_environment(self) -> bool {
        match self {
            Primitive::Execv | Primitive::Execvp => false,
            #[cfg(any(target_os = "macos", target_os = "freebsd"))]
            Primitive::ExecvP => false,
            _ => true,
        }
    }

    /// Slot in the resolution cache.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("real symbol not found: {0}")]
    SymbolNotFound(&'static str),

    #[error("symbol {0} resolved back into the interposing module")]
    SelfReference(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub path: String,
    pub base_address: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_primitives_have_distinct_slots() {
        let slots: HashSet<usize> = Primitive::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(slots.len(), Primitive::COUNT);
        assert!(slots.iter().all(|&i| i < Primitive::COUNT));
    }

    #[test]
    fn test_symbol_names() {
        assert_eq!(Primitive::Execve.name(), "execve");
        assert_eq!(Primitive::PosixSpawnp.name(), "posix_spawnp");
        let names: HashSet<&str> = Primitive::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), Primitive::COUNT);
    }

    #[test]
    fn test_environment_parameter_shape() {
        assert!(Primitive::Execve.takes_environment());
        assert!(Primitive::PosixSpawn.takes_environment());
        assert!(!Primitive::Execv.takes_environment());
        assert!(!Primitive::Execvp.takes_environment());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_capability_set() {
        assert_eq!(Primitive::COUNT, 6);
        assert!(Primitive::ALL.contains(&Primitive::Execvpe));
    }
}
