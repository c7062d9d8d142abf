//! Symbol-table lookups: by name, and by covered address.

use tracing::debug;

use super::apply_offset;
use crate::error::{LocusError, Result};
use crate::provider::DebugInfoProvider;
use crate::types::SymbolEntry;

/// Absolute address of `offset` bytes past the symbol called `name`.
///
/// Modules are searched in registration order, each symbol table in table
/// order; the first exact, case-sensitive match wins. Section, file and TLS
/// symbols are never matched.
///
/// ## Errors
///
/// - [`LocusError::SymbolNotFound`] if no usable symbol has that name
/// - [`LocusError::OutOfRange`] if `offset` is outside a sized symbol, or the
///   result does not fit in 64 bits
pub fn resolve_symbol<P>(provider: &P, name: &str, offset: i64) -> Result<u64>
where
    P: DebugInfoProvider + ?Sized,
{
    let symbol = provider
        .modules()
        .iter()
        .flat_map(|module| provider.symbols_of(module.id))
        .filter(|symbol| usable(symbol))
        .find(|symbol| symbol.name == name)
        .ok_or_else(|| LocusError::SymbolNotFound(name.to_owned()))?;

    let address = apply_offset(symbol.value, symbol.size, offset, name)?;
    debug!(symbol = name, offset, address = format_args!("{address:#x}"), "resolved symbol offset");
    Ok(address)
}

/// The symbol covering `address` and the offset of `address` into it.
///
/// A sized symbol covers `[value, value + size)`; among several, the one
/// with the greatest value wins. Symbols without a size only count when no
/// sized symbol covers the address, and then the closest one at or below
/// the address is used.
pub fn symbol_covering(symbols: &[SymbolEntry], address: u64) -> Option<(&SymbolEntry, u64)>
{
    let mut sized: Option<&SymbolEntry> = None;
    let mut sizeless: Option<&SymbolEntry> = None;

    for symbol in symbols.iter().filter(|symbol| usable(symbol) && symbol.value <= address) {
        let best = if symbol.size == 0 {
            &mut sizeless
        } else if address - symbol.value < symbol.size {
            &mut sized
        } else {
            continue;
        };
        if best.map_or(true, |current| symbol.value > current.value) {
            *best = Some(symbol);
        }
    }

    let symbol = sized.or(sizeless)?;
    Some((symbol, address - symbol.value))
}

fn usable(symbol: &SymbolEntry) -> bool
{
    symbol.kind.is_resolvable() && !symbol.name.is_empty()
}
