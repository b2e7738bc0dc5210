//! Environment keys that carry the interception configuration.
//!
//! The supervisor hands three paths to the agent through its environment.
//! The agent re-injects the same three keys into every environment it
//! forwards, so each descendant process loads the agent again.

use std::ffi::CStr;
use std::fmt;

use crate::platform::{PRELOAD_ENV_VAR, PRELOAD_ENV_VAR_C};

/// Absolute path of the compiler wrapper.
pub const WRAPPER_ENV_VAR: &str = "WRAPPER_PATH";

/// Absolute path the supervisor listens on for reports.
pub const TARGET_ENV_VAR: &str = "TARGET_PATH";

/// Log filter for the agent (`env_logger` syntax). Unset means silent.
pub const LOG_ENV_VAR: &str = "EAR_LOG";

/// One of the environment keys managed by the agent.
///
/// Variant order is the order in which missing keys are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistinguishedKey {
    Wrapper,
    Target,
    Library,
}

impl DistinguishedKey {
    /// All keys, in append order.
    pub const ALL: [DistinguishedKey; 3] = [
        DistinguishedKey::Wrapper,
        DistinguishedKey::Target,
        DistinguishedKey::Library,
    ];

    /// Environment variable name for this key.
    pub const fn name(self) -> &'static str {
        match self {
            DistinguishedKey::Wrapper => WRAPPER_ENV_VAR,
            DistinguishedKey::Target => TARGET_ENV_VAR,
            DistinguishedKey::Library => PRELOAD_ENV_VAR,
        }
    }

    /// [`DistinguishedKey::name`] as a C string, for `setenv`.
    pub const fn c_name(self) -> &'static CStr {
        match self {
            DistinguishedKey::Wrapper => c"WRAPPER_PATH",
            DistinguishedKey::Target => c"TARGET_PATH",
            DistinguishedKey::Library => PRELOAD_ENV_VAR_C,
        }
    }

    /// Position of this key in [`DistinguishedKey::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a key by its exact (case-sensitive) variable name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.name().as_bytes() == name)
    }
}

impl fmt::Display for DistinguishedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_exact_match() {
        assert_eq!(
            DistinguishedKey::from_name(b"WRAPPER_PATH"),
            Some(DistinguishedKey::Wrapper)
        );
        assert_eq!(
            DistinguishedKey::from_name(b"TARGET_PATH"),
            Some(DistinguishedKey::Target)
        );
        assert_eq!(
            DistinguishedKey::from_name(PRELOAD_ENV_VAR.as_bytes()),
            Some(DistinguishedKey::Library)
        );
    }

    #[test]
    fn test_from_name_is_case_sensitive() {
        assert_eq!(DistinguishedKey::from_name(b"wrapper_path"), None);
        assert_eq!(DistinguishedKey::from_name(b"WRAPPER_PATH "), None);
        assert_eq!(DistinguishedKey::from_name(b""), None);
    }

    #[test]
    fn test_index_matches_append_order() {
        for (i, key) in DistinguishedKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_c_names_match_names() {
        for key in DistinguishedKey::ALL {
            assert_eq!(key.c_name().to_bytes(), key.name().as_bytes());
        }
    }

    #[test]
    fn test_display_is_variable_name() {
        assert_eq!(DistinguishedKey::Target.to_string(), "TARGET_PATH");
    }
}
