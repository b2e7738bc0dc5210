//! Construction of the environment handed to the real exec/spawn functions.
//!
//! An [`EnvironmentBuilder`] is seeded with the caller's environment and
//! collects overrides for the distinguished keys. [`EnvironmentBuilder::build`]
//! produces an [`EnvironmentView`], which owns a NUL-terminated `envp` array
//! for the duration of one intercepted call.

use core::ffi::{CStr, c_char};
use std::ffi::CString;

use ear_protocol::DistinguishedKey;
use log::debug;

use crate::error::{EnvironmentError, Result};

/// Split a `KEY=VALUE` entry on its first `=`.
///
/// Returns `None` for malformed entries without a separator.
pub fn split_entry(entry: &[u8]) -> Option<(&[u8], &[u8])> {
    let eq = entry.iter().position(|&b| b == b'=')?;
    Some((&entry[..eq], &entry[eq + 1..]))
}

fn distinguished_key(entry: &[u8]) -> Option<DistinguishedKey> {
    split_entry(entry).and_then(|(key, _)| DistinguishedKey::from_name(key))
}

/// Collects a base environment and pending overrides.
///
/// Single use: [`build`](Self::build) consumes the builder. Running out of
/// memory while seeding is reported by `build`.
#[derive(Debug)]
pub struct EnvironmentBuilder<'a> {
    base: Vec<&'a [u8]>,
    overrides: [Option<&'a [u8]>; 3],
    seed_failed: bool,
}

impl<'a> EnvironmentBuilder<'a> {
    /// Seed from `KEY=VALUE` entries.
    ///
    /// An entry is cut at its first NUL byte, which is where a C reader of
    /// the final array would stop.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut base = Vec::new();
        let mut seed_failed = false;
        for entry in entries {
            if base.try_reserve(1).is_err() {
                seed_failed = true;
                break;
            }
            base.push(match entry.iter().position(|&b| b == 0) {
                Some(nul) => &entry[..nul],
                None => entry,
            });
        }
        Self {
            base,
            overrides: [None; 3],
            seed_failed,
        }
    }

    /// Seed from a NUL-terminated `envp` array. A null `envp` is empty.
    ///
    /// # Safety
    /// `envp` must be null or point to a null-terminated array of valid C
    /// strings that outlive the builder.
    pub unsafe fn from_raw(envp: *const *const c_char) -> Self {
        let mut count = 0;
        if !envp.is_null() {
            unsafe {
                while !(*envp.add(count)).is_null() {
                    count += 1;
                }
            }
        }

        let mut base = Vec::new();
        let seed_failed = base.try_reserve_exact(count).is_err();
        if !seed_failed {
            for i in 0..count {
                base.push(unsafe { CStr::from_ptr(*envp.add(i)) }.to_bytes());
            }
        }
        Self {
            base,
            overrides: [None; 3],
            seed_failed,
        }
    }

    /// Seed from the live process environment.
    ///
    /// # Safety
    /// The process environment must not be modified while the builder is
    /// alive.
    pub unsafe fn from_process() -> Self {
        let live = ear_intercept::environment();
        unsafe { Self::from_raw(*live as *const *const c_char) }
    }

    /// Record an override for `key`. A later call for the same key wins.
    pub fn set(&mut self, key: DistinguishedKey, value: &'a [u8]) -> Result<&mut Self> {
        if value.is_empty() || value.contains(&0) {
            return Err(EnvironmentError::InvalidOverrideValue(key));
        }
        self.overrides[key.index()] = Some(value);
        Ok(self)
    }

    pub fn set_wrapper(&mut self, path: &'a [u8]) -> Result<&mut Self> {
        self.set(DistinguishedKey::Wrapper, path)
    }

    pub fn set_target(&mut self, path: &'a [u8]) -> Result<&mut Self> {
        self.set(DistinguishedKey::Target, path)
    }

    pub fn set_library(&mut self, path: &'a [u8]) -> Result<&mut Self> {
        self.set(DistinguishedKey::Library, path)
    }

    /// Produce the augmented environment.
    ///
    /// Overridden keys keep the position of their first occurrence; keys
    /// missing from the base are appended in `DistinguishedKey::ALL` order.
    /// Later occurrences of a distinguished key are dropped. Every other
    /// entry is copied unchanged, in order.
    pub fn build(self) -> Result<EnvironmentView> {
        if self.seed_failed {
            return Err(EnvironmentError::AllocationFailure);
        }
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(self.base.len() + DistinguishedKey::ALL.len())
            .map_err(|_| EnvironmentError::AllocationFailure)?;

        let mut seen = [false; 3];
        for &entry in &self.base {
            let Some(key) = distinguished_key(entry) else {
                entries.push(owned_entry(&[entry])?);
                continue;
            };
            if seen[key.index()] {
                debug!("Dropping duplicate {} entry", key);
                continue;
            }
            seen[key.index()] = true;
            match self.overrides[key.index()] {
                Some(value) => entries.push(override_entry(key, value)?),
                None => entries.push(owned_entry(&[entry])?),
            }
        }

        for key in DistinguishedKey::ALL {
            if seen[key.index()] {
                continue;
            }
            if let Some(value) = self.overrides[key.index()] {
                entries.push(override_entry(key, value)?);
            }
        }

        EnvironmentView::new(entries)
    }
}

/// Concatenate `parts` into a fresh C string.
///
/// Callers guarantee that no part contains a NUL byte: base entries are
/// cut at their first NUL, override values are validated by `set`, and
/// key names are constants.
fn owned_entry(parts: &[&[u8]]) -> Result<CString> {
    let len = parts.iter().map(|part| part.len()).sum::<usize>() + 1;
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| EnvironmentError::AllocationFailure)?;
    for part in parts {
        bytes.extend_from_slice(part);
    }
    bytes.push(0);
    // SAFETY: exactly one NUL, at the end (see above).
    Ok(unsafe { CString::from_vec_with_nul_unchecked(bytes) })
}

fn override_entry(key: DistinguishedKey, value: &[u8]) -> Result<CString> {
    owned_entry(&[key.name().as_bytes(), b"=".as_slice(), value])
}

/// An owned, NUL-terminated environment array.
///
/// Owns every string and the pointer spine; both are freed once, on drop.
/// Raw pointers keep the view on the thread that built it.
#[derive(Debug)]
pub struct EnvironmentView {
    entries: Vec<CString>,
    spine: Vec<*const c_char>,
}

impl EnvironmentView {
    fn new(entries: Vec<CString>) -> Result<Self> {
        let mut spine = Vec::new();
        spine
            .try_reserve_exact(entries.len() + 1)
            .map_err(|_| EnvironmentError::AllocationFailure)?;
        // Moving a CString does not move its heap buffer, so these
        // pointers stay valid for as long as `entries` is alive.
        spine.extend(entries.iter().map(|entry| entry.as_ptr()));
        spine.push(core::ptr::null());
        Ok(Self { entries, spine })
    }

    /// The `envp` array. Valid while `self` is alive.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.spine.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> {
        self.entries.iter().map(CString::as_c_str)
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .filter_map(|entry| split_entry(entry.as_bytes()))
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Distinguished keys present in the view, with their values.
    pub fn distinguished(&self) -> impl Iterator<Item = (DistinguishedKey, &CStr)> {
        self.entries.iter().filter_map(|entry| {
            let bytes = entry.as_bytes_with_nul();
            let eq = bytes.iter().position(|&b| b == b'=')?;
            let key = DistinguishedKey::from_name(&bytes[..eq])?;
            let value = CStr::from_bytes_with_nul(&bytes[eq + 1..]).ok()?;
            Some((key, value))
        })
    }
}
