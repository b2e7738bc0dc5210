//! Lookup of the implementations shadowed by the agent's own exports.
//!
//! Every address is looked up with `RTLD_NEXT`, so the search starts after
//! the module that contains this code. Results are cached per primitive for
//! the process lifetime.

use core::ffi::CStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

use crate::module;
use crate::types::{Primitive, ResolveError};

/// Resolved addresses indexed by `Primitive::index`, 0 while unresolved.
///
/// Threads racing on first use all store the same address.
static RESOLVED: [AtomicUsize; Primitive::COUNT] =
    [const { AtomicUsize::new(0) }; Primitive::COUNT];

/// Address of the real implementation of `primitive`.
pub fn get(primitive: Primitive) -> Result<usize, ResolveError> {
    let slot = &RESOLVED[primitive.index()];
    let cached = slot.load(Ordering::Acquire);
    if cached != 0 {
        return Ok(cached);
    }

    let address = resolve_next(primitive.symbol())?;
    slot.store(address, Ordering::Release);
    debug!("Resolved {} at {:#x}", primitive.name(), address);
    Ok(address)
}

/// Find the next definition of `symbol` after this module in load order.
///
/// Fails with `SelfReference` if the address still lands inside the module
/// that contains the resolver.
pub fn resolve_next(symbol: &'static CStr) -> Result<usize, ResolveError> {
    let name = symbol.to_str().unwrap_or("<non-utf8 symbol>");
    let address = unsafe { libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr()) } as usize;
    if address == 0 {
        return Err(ResolveError::SymbolNotFound(name));
    }
    if module::is_own_address(address) {
        return Err(ResolveError::SelfReference(name));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_is_cached_and_pointer_equal() {
        let first = get(Primitive::Execve).expect("execve must resolve");
        let second = get(Primitive::Execve).expect("execve must resolve");
        assert_ne!(first, 0);
        assert_eq!(first, second);
        assert_eq!(RESOLVED[Primitive::Execve.index()].load(Ordering::Acquire), first);
    }

    #[test]
    fn test_every_primitive_resolves() {
        for &primitive in Primitive::ALL {
            let address = get(primitive)
                .unwrap_or_else(|e| panic!("{} failed to resolve: {}", primitive.name(), e));
            assert_ne!(address, 0);
        }
    }

    #[test]
    fn test_cache_matches_uncached_lookup() {
        let cached = get(Primitive::PosixSpawn).unwrap();
        let direct = resolve_next(c"posix_spawn").unwrap();
        assert_eq!(cached, direct);
    }

    #[test]
    fn test_unknown_symbol_not_found() {
        let err = resolve_next(c"ear_no_such_function_anywhere").unwrap_err();
        assert_eq!(
            err,
            ResolveError::SymbolNotFound("ear_no_such_function_anywhere")
        );
        assert_eq!(
            err.to_string(),
            "real symbol not found: ear_no_such_function_anywhere"
        );
    }

    #[test]
    fn test_error_names_the_primitive_symbol() {
        let err = ResolveError::SymbolNotFound(Primitive::Execvp.name());
        assert_eq!(err, ResolveError::SymbolNotFound("execvp"));
        assert_eq!(err.to_string(), "real symbol not found: execvp");
        assert_eq!(
            ResolveError::SelfReference(Primitive::Execve.name()).to_string(),
            "symbol execve resolved back into the interposing module"
        );
    }

    #[test]
    fn test_resolved_address_is_outside_own_module() {
        let address = get(Primitive::Execve).unwrap();
        assert!(!module::is_own_address(address));

        let own = module::own_module().expect("resolver code belongs to a module");
        let real = module::containing_module(address).expect("libc is a loaded module");
        assert_ne!(own.base_address, real.base_address);
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| get(Primitive::Execvp).unwrap()))
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }
}
