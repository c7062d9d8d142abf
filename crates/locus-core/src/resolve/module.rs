//! Owning-module lookup.

use crate::error::{LocusError, Result};
use crate::provider::{DebugInfoProvider, Module};

/// The module whose runtime range contains `address`, if any.
pub fn locate<P>(provider: &P, address: u64) -> Option<&Module>
where
    P: DebugInfoProvider + ?Sized,
{
    provider.module_containing(address)
}

/// The only loaded module.
///
/// ## Errors
///
/// [`LocusError::AmbiguousModuleSet`] when zero or several modules are loaded.
pub fn sole_module<P>(provider: &P) -> Result<&Module>
where
    P: DebugInfoProvider + ?Sized,
{
    match provider.modules() {
        [module] => Ok(module),
        modules => Err(LocusError::AmbiguousModuleSet(modules.len())),
    }
}
