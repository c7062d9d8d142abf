//! # Resolution Steps
//!
//! Each submodule implements one step of turning an address expression into
//! a [`ResolvedSymbol`](crate::types::ResolvedSymbol). The steps are free
//! functions over a [`DebugInfoProvider`](crate::provider::DebugInfoProvider)
//! so they can be exercised against any backend; the
//! [`Resolver`](crate::Resolver) strings them together.

pub mod line;
pub mod module;
pub mod scope;
pub mod section;
pub mod symbol;

pub use line::{present_path, resolve_line};
pub use module::{locate, sole_module};
pub use scope::{covering_scopes, identify, inline_chain, resolve_function};
pub use section::{resolve_section, section_containing};
pub use symbol::{resolve_symbol, symbol_covering};

use crate::error::{LocusError, Result};

/// Apply a signed `offset` to `base`, checking it against an extent of `size`
/// bytes. A `size` of zero means the extent is unknown and only the address
/// arithmetic itself is checked.
pub(crate) fn apply_offset(base: u64, size: u64, offset: i64, target: &str) -> Result<u64>
{
    if size != 0 && (offset < 0 || offset.unsigned_abs() >= size) {
        return Err(LocusError::out_of_range(offset, target));
    }
    base.checked_add_signed(offset)
        .ok_or_else(|| LocusError::out_of_range(offset, target))
}
