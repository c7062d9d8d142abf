//! `(section)+offset` resolution.

use tracing::debug;

use super::apply_offset;
use super::module::sole_module;
use crate::error::{LocusError, Result};
use crate::provider::{DebugInfoProvider, ModuleId};
use crate::types::SectionEntry;

/// Absolute address of `offset` bytes into the section called `name`.
///
/// Section names are only unique inside one image, so exactly one module
/// must be loaded. Sections are searched in table order and the first name
/// match is used.
///
/// ## Errors
///
/// - [`LocusError::AmbiguousModuleSet`] unless exactly one module is loaded
/// - [`LocusError::SectionNotFound`] if no section has that name
/// - [`LocusError::OutOfRange`] if `offset` is outside the section
pub fn resolve_section<P>(provider: &P, name: &str, offset: i64) -> Result<u64>
where
    P: DebugInfoProvider + ?Sized,
{
    let module = sole_module(provider)?;
    let section = provider
        .sections_of(module.id)
        .iter()
        .find(|section| section.name == name)
        .ok_or_else(|| LocusError::SectionNotFound(name.to_owned()))?;

    let base = section
        .base()
        .ok_or_else(|| LocusError::out_of_range(offset, name))?;
    let address = apply_offset(base, section.size, offset, name)?;
    debug!(section = name, offset, address = format_args!("{address:#x}"), "resolved section offset");
    Ok(address)
}

/// The section of `module` holding `address`.
pub fn section_containing<P>(provider: &P, module: ModuleId, address: u64) -> Option<&SectionEntry>
where
    P: DebugInfoProvider + ?Sized,
{
    provider
        .sections_of(module)
        .iter()
        .find(|section| section.offset_of(address).is_some())
}
