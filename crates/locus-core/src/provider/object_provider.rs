//! [`DebugInfoProvider`] backed by on-disk binaries.

use std::path::PathBuf;

use tracing::{debug, info};

use super::dwarf::{DwarfInfo, ScopeArena};
use super::image::{BinaryImage, ImageDescriptor};
use super::{CompileUnitId, DebugInfoProvider, LineRow, Module, ModuleId, ScopeId, ScopeNode};
use crate::error::Result;
use crate::types::{SectionEntry, SymbolEntry};

/// Reads modules from disk with `object` and their debug info with `gimli`.
///
/// ## Example
///
/// ```rust,no_run
/// use locus_core::provider::{DebugInfoProvider, ObjectProvider};
///
/// let provider = ObjectProvider::open("/usr/bin/true")?;
/// for module in provider.modules() {
///     println!("{} {:#x}-{:#x}", module.name, module.start, module.end);
/// }
/// # Ok::<(), locus_core::LocusError>(())
/// ```
pub struct ObjectProvider
{
    images: Vec<BinaryImage>,
    modules: Vec<Module>,
}

impl ObjectProvider
{
    /// Load a single executable at its link-time addresses.
    ///
    /// ## Errors
    ///
    /// Returns [`LocusError::ModuleUnavailable`](crate::LocusError::ModuleUnavailable)
    /// if the file cannot be read or is not a recognised object format.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self>
    {
        Self::open_images(vec![ImageDescriptor::new(path)])
    }

    /// Load several images, each at its own load address.
    ///
    /// ## Errors
    ///
    /// Fails on the first image that cannot be loaded.
    pub fn open_images(descriptors: Vec<ImageDescriptor>) -> Result<Self>
    {
        let mut images = Vec::with_capacity(descriptors.len());
        for (index, desc) in descriptors.into_iter().enumerate() {
            let image = BinaryImage::parse(desc, ModuleId(index))?;
            info!(path = %image.path().display(), "loaded module");
            images.push(image);
        }
        let modules = images.iter().map(|image| image.module().clone()).collect();
        Ok(Self { images, modules })
    }

    fn image(&self, module: ModuleId) -> Option<&BinaryImage>
    {
        self.images.get(module.0)
    }

    fn dwarf(&self, module: ModuleId) -> Option<&DwarfInfo>
    {
        self.image(module)?.dwarf()
    }

    fn arena(&self, unit: CompileUnitId) -> Option<&ScopeArena>
    {
        self.dwarf(unit.module)?.scopes(unit.index)
    }

    fn file_address(&self, module: ModuleId, address: u64) -> Option<u64>
    {
        self.image(module)?.module().file_address(address)
    }

    fn scope_nodes(&self, unit: CompileUnitId, arena: &ScopeArena, chain: Vec<usize>) -> Vec<ScopeNode>
    {
        chain
            .into_iter()
            .filter_map(|index| {
                let record = arena.get(index)?;
                Some(ScopeNode {
                    id: ScopeId { unit, index },
                    tag: record.tag,
                    name: record.name.clone(),
                    call_site: record.call_site.clone(),
                })
            })
            .collect()
    }
}

impl DebugInfoProvider for ObjectProvider
{
    fn modules(&self) -> &[Module]
    {
        &self.modules
    }

    fn symbols_of(&self, module: ModuleId) -> &[SymbolEntry]
    {
        self.image(module).map(BinaryImage::symbols).unwrap_or_default()
    }

    fn sections_of(&self, module: ModuleId) -> &[SectionEntry]
    {
        self.image(module).map(BinaryImage::sections).unwrap_or_default()
    }

    fn compile_unit_at(&self, module: ModuleId, address: u64) -> Option<CompileUnitId>
    {
        let file_address = self.file_address(module, address)?;
        let index = self.dwarf(module)?.unit_at(file_address)?;
        Some(CompileUnitId { module, index })
    }

    fn scopes_covering(&self, unit: CompileUnitId, address: u64) -> Vec<ScopeNode>
    {
        let Some(file_address) = self.file_address(unit.module, address) else {
            return Vec::new();
        };
        let Some(arena) = self.arena(unit) else {
            return Vec::new();
        };
        let Some(innermost) = arena.innermost(file_address) else {
            debug!(address = format_args!("{address:#x}"), "no scope covers address");
            return Vec::new();
        };
        self.scope_nodes(unit, arena, arena.ancestry(innermost))
    }

    fn full_scope_tree_of(&self, scope: ScopeId) -> Vec<ScopeNode>
    {
        match self.arena(scope.unit) {
            Some(arena) => self.scope_nodes(scope.unit, arena, arena.ancestry(scope.index)),
            None => Vec::new(),
        }
    }

    fn line_at(&self, module: ModuleId, address: u64) -> Option<LineRow>
    {
        let file_address = self.file_address(module, address)?;
        let (index, hit) = self.dwarf(module)?.line_at(file_address)?;
        Some(LineRow {
            file: hit.file,
            line: hit.line,
            column: hit.column,
            flags: hit.flags,
            unit: Some(CompileUnitId { module, index }),
        })
    }

    fn compilation_directory_of(&self, unit: CompileUnitId) -> Option<String>
    {
        self.dwarf(unit.module)?.comp_dir(unit.index).map(str::to_owned)
    }
}
