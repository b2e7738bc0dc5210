//! Interception settings inherited from the supervisor.
//!
//! Captured once per process from the agent's own environment, before the
//! agent has overridden anything, so repeated interceptions always inject
//! the values the process started with.

use core::ffi::CStr;
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStringExt;
use std::sync::OnceLock;

use ear_protocol::DistinguishedKey;

use crate::environment::EnvironmentBuilder;
use crate::error::Result;

static CAPTURED: OnceLock<Config> = OnceLock::new();

/// Values of the distinguished keys. Unset and empty keys are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    values: [Option<CString>; 3],
}

impl Config {
    /// Read the distinguished keys from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Read the distinguished keys through `lookup`.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        let values = DistinguishedKey::ALL.map(|key| {
            lookup(key.name())
                .filter(|value| !value.is_empty())
                .and_then(|value| CString::new(value.into_vec()).ok())
        });
        Self { values }
    }

    pub fn get(&self, key: DistinguishedKey) -> Option<&CStr> {
        self.values[key.index()].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Configured keys, in `DistinguishedKey::ALL` order.
    pub fn configured(&self) -> impl Iterator<Item = (DistinguishedKey, &CStr)> {
        DistinguishedKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Stage every configured value as an override on `builder`.
    pub fn apply<'a>(&'a self, builder: &mut EnvironmentBuilder<'a>) -> Result<()> {
        for (key, value) in self.configured() {
            builder.set(key, value.to_bytes())?;
        }
        Ok(())
    }
}

/// The process-wide configuration, captured on first use.
pub fn captured() -> &'static Config {
    CAPTURED.get_or_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = lookup_from(&[
            ("WRAPPER_PATH", "/bin/wrapper"),
            ("TARGET_PATH", "/tmp/target"),
            (DistinguishedKey::Library.name(), "/lib/libear.so"),
        ]);

        assert_eq!(
            config.get(DistinguishedKey::Wrapper),
            Some(c"/bin/wrapper")
        );
        assert_eq!(config.get(DistinguishedKey::Target), Some(c"/tmp/target"));
        assert_eq!(
            config.get(DistinguishedKey::Library),
            Some(c"/lib/libear.so")
        );
        assert!(!config.is_empty());
    }

    #[test]
    fn test_unset_and_empty_values_are_none() {
        let config = lookup_from(&[("WRAPPER_PATH", ""), ("UNRELATED", "x")]);
        assert!(config.is_empty());
        assert_eq!(config.configured().count(), 0);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_configured_in_fixed_order() {
        let config = lookup_from(&[
            (DistinguishedKey::Library.name(), "/l"),
            ("WRAPPER_PATH", "/w"),
        ]);
        let keys: Vec<DistinguishedKey> = config.configured().map(|(k, _)| k).collect();
        assert_eq!(keys, [DistinguishedKey::Wrapper, DistinguishedKey::Library]);
    }

    #[test]
    fn test_apply_stages_overrides() {
        let config = lookup_from(&[("TARGET_PATH", "/t")]);
        let mut builder = EnvironmentBuilder::new([b"TARGET_PATH=/old".as_slice()]);
        config.apply(&mut builder).unwrap();
        let view = builder.build().unwrap();
        assert_eq!(view.get(b"TARGET_PATH"), Some(b"/t".as_slice()));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_captured_is_stable() {
        let _guard = crate::test_utils::lock_environment();
        let first = captured() as *const Config;
        let second = captured() as *const Config;
        assert_eq!(first, second);
    }
}
