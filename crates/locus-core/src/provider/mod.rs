//! # Debug-Info Providers
//!
//! The resolver never reads ELF or DWARF bytes itself. Everything it needs
//! from a binary goes through the narrow [`DebugInfoProvider`] query surface:
//! module list, symbol and section tables, compile units, scope chains and
//! line rows.
//!
//! [`ObjectProvider`] is the real implementation, backed by the `object` and
//! `gimli` crates. Tests plug in hand-built providers through the same trait.
//!
//! All addresses crossing this interface are absolute (runtime) addresses; a
//! provider applies its own load bias internally.

mod dwarf;
mod image;
mod object_provider;

use std::path::PathBuf;

pub use image::ImageDescriptor;
pub use object_provider::ObjectProvider;

use crate::types::{AddressClass, LineFlags, ScopeTag, SectionEntry, SourceLocation, SymbolEntry};

/// Index of a module in its provider's module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub usize);

/// A compile unit inside a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompileUnitId
{
    pub module: ModuleId,
    pub index: usize,
}

/// A scope inside a compile unit: an index into the unit's scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId
{
    pub unit: CompileUnitId,
    pub index: usize,
}

/// One loaded binary image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module
{
    pub id: ModuleId,
    /// Short display name (usually the file name).
    pub name: String,
    pub path: PathBuf,
    /// Runtime address range `[start, end)`.
    pub start: u64,
    pub end: u64,
    /// Difference between runtime and link-time addresses.
    pub load_bias: i64,
    pub class: AddressClass,
}

impl Module
{
    pub fn contains(&self, address: u64) -> bool
    {
        address >= self.start && address < self.end
    }

    /// Link-time address for a runtime address.
    pub fn file_address(&self, address: u64) -> Option<u64>
    {
        let bias = self.load_bias;
        if bias >= 0 {
            address.checked_sub(bias.unsigned_abs())
        } else {
            address.checked_add(bias.unsigned_abs())
        }
    }
}

/// One entry of a scope chain, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode
{
    pub id: ScopeId,
    pub tag: ScopeTag,
    /// Display name: linkage name if present, else plain name, following
    /// abstract origins and specifications.
    pub name: Option<String>,
    /// Call site of an inlined subroutine. The path is joined with the
    /// compilation directory when debug info allows it.
    pub call_site: Option<SourceLocation>,
}

/// The line-table row covering an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow
{
    /// Source path, joined with the compilation directory when debug info
    /// allows it.
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub flags: LineFlags,
    /// Compile unit that owns the line table, for compilation-directory lookup.
    pub unit: Option<CompileUnitId>,
}

/// Query surface of a debug-info backend.
///
/// Implementations are expected to be cheap to query repeatedly; caching is
/// their business. Every query degrades to `None`/empty instead of failing:
/// malformed or missing debug info means "unknown", never an error.
pub trait DebugInfoProvider
{
    /// Loaded modules, in registration order.
    fn modules(&self) -> &[Module];

    /// The module whose range contains `address`.
    fn module_containing(&self, address: u64) -> Option<&Module>
    {
        self.modules().iter().find(|module| module.contains(address))
    }

    /// Symbol table of a module, in table order. Values are absolute.
    fn symbols_of(&self, module: ModuleId) -> &[SymbolEntry];

    /// Sections of a module that can anchor a `(section)+offset` expression.
    fn sections_of(&self, module: ModuleId) -> &[SectionEntry];

    /// The compile unit whose code ranges cover `address`.
    fn compile_unit_at(&self, module: ModuleId, address: u64) -> Option<CompileUnitId>;

    /// Scopes covering `address` inside `unit`, innermost first, ending with
    /// the compile unit itself.
    fn scopes_covering(&self, unit: CompileUnitId, address: u64) -> Vec<ScopeNode>;

    /// `scope` followed by all its enclosing scopes, ending with the compile unit.
    fn full_scope_tree_of(&self, scope: ScopeId) -> Vec<ScopeNode>;

    /// The line-table row covering `address`.
    fn line_at(&self, module: ModuleId, address: u64) -> Option<LineRow>;

    /// Value of the compile unit's `DW_AT_comp_dir`.
    fn compilation_directory_of(&self, unit: CompileUnitId) -> Option<String>;
}
