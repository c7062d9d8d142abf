//! Binary image parsing: module range, symbol table, sections and lazily
//! loaded DWARF.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use object::{Object, ObjectSection, ObjectSegment, ObjectSymbol, SectionKind};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::dwarf::DwarfInfo;
use super::{Module, ModuleId};
use crate::error::{LocusError, Result};
use crate::types::{AddressClass, SectionEntry, SymbolEntry, SymbolKind};

/// Describes a binary image to load, optionally at a runtime address.
///
/// Without a load address the image is taken as mapped at its link-time
/// addresses (load bias zero).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor
{
    pub path: PathBuf,
    pub load_address: Option<u64>,
}

impl ImageDescriptor
{
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self {
            path: path.into(),
            load_address: None,
        }
    }

    #[must_use]
    pub fn loaded_at(mut self, load_address: u64) -> Self
    {
        self.load_address = Some(load_address);
        self
    }
}

/// Parsed binary image with its symbol and section tables.
pub(crate) struct BinaryImage
{
    module: Module,
    data: Arc<[u8]>,
    symbols: Vec<SymbolEntry>,
    sections: Vec<SectionEntry>,
    dwarf_cache: OnceCell<Option<DwarfInfo>>,
}

impl BinaryImage
{
    pub(crate) fn parse(desc: ImageDescriptor, id: ModuleId) -> Result<Self>
    {
        let bytes = fs::read(&desc.path).map_err(|err| LocusError::module_unavailable(&desc.path, err))?;
        let data = Arc::<[u8]>::from(bytes);
        let file = object::File::parse(&*data).map_err(|err| LocusError::module_unavailable(&desc.path, err))?;

        let class = if file.is_64() {
            AddressClass::Elf64
        } else {
            AddressClass::Elf32
        };

        let (link_start, link_end) = link_range(&file);
        let load_bias = desc
            .load_address
            .map_or(0, |load| load.wrapping_sub(link_start) as i64);
        let start = link_start
            .checked_add_signed(load_bias)
            .ok_or_else(|| LocusError::module_unavailable(&desc.path, "load address out of range"))?;
        let end = link_end
            .checked_add_signed(load_bias)
            .ok_or_else(|| LocusError::module_unavailable(&desc.path, "load address out of range"))?;

        let symbols = read_symbols(&file, load_bias);
        let sections = read_sections(&file, load_bias);
        debug!(
            path = %desc.path.display(),
            start = format_args!("{start:#x}"),
            end = format_args!("{end:#x}"),
            load_bias,
            symbols = symbols.len(),
            sections = sections.len(),
            "parsed image"
        );

        let name = desc
            .path
            .file_name()
            .map_or_else(|| desc.path.display().to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self {
            module: Module {
                id,
                name,
                path: desc.path,
                start,
                end,
                load_bias,
                class,
            },
            data,
            symbols,
            sections,
            dwarf_cache: OnceCell::new(),
        })
    }

    pub(crate) fn module(&self) -> &Module
    {
        &self.module
    }

    pub(crate) fn path(&self) -> &Path
    {
        &self.module.path
    }

    pub(crate) fn symbols(&self) -> &[SymbolEntry]
    {
        &self.symbols
    }

    pub(crate) fn sections(&self) -> &[SectionEntry]
    {
        &self.sections
    }

    /// DWARF of this image, parsed on first use. `None` when the image has none.
    pub(crate) fn dwarf(&self) -> Option<&DwarfInfo>
    {
        self.dwarf_cache
            .get_or_init(|| match object::File::parse(&*self.data) {
                Ok(file) => DwarfInfo::load(&file),
                Err(err) => {
                    warn!(path = %self.path().display(), %err, "failed to re-parse image for DWARF");
                    None
                }
            })
            .as_ref()
    }
}

/// Link-time address range covered by the image: loadable segments when
/// present, loadable sections otherwise.
fn link_range(file: &object::File<'_>) -> (u64, u64)
{
    let segments = file
        .segments()
        .filter(|segment| segment.size() > 0)
        .map(|segment| (segment.address(), segment.address().saturating_add(segment.size())));
    if let Some(range) = span(segments) {
        return range;
    }

    let sections = file
        .sections()
        .filter(|section| is_loadable(section.kind()) && section.size() > 0)
        .map(|section| (section.address(), section.address().saturating_add(section.size())));
    span(sections).unwrap_or((0, 0))
}

fn span(ranges: impl Iterator<Item = (u64, u64)>) -> Option<(u64, u64)>
{
    ranges.fold(None, |acc, (start, end)| match acc {
        None => Some((start, end)),
        Some((lo, hi)) => Some((lo.min(start), hi.max(end))),
    })
}

/// Static symbol table, falling back to the dynamic one for stripped images.
fn read_symbols(file: &object::File<'_>, load_bias: i64) -> Vec<SymbolEntry>
{
    let symbols = collect_symbols(file.symbols(), load_bias);
    if !symbols.is_empty() {
        return symbols;
    }
    debug!("no static symbols, using dynamic symbol table");
    collect_symbols(file.dynamic_symbols(), load_bias)
}

fn collect_symbols<'data, S>(symbols: impl Iterator<Item = S>, load_bias: i64) -> Vec<SymbolEntry>
where
    S: ObjectSymbol<'data>,
{
    symbols
        .filter(|symbol| !symbol.is_undefined())
        .filter_map(|symbol| {
            let name = symbol.name().ok().filter(|name| !name.is_empty())?;
            let value = symbol.address().checked_add_signed(load_bias)?;
            let kind = match symbol.kind() {
                object::SymbolKind::Text => SymbolKind::Function,
                object::SymbolKind::Data => SymbolKind::Object,
                object::SymbolKind::Section => SymbolKind::Section,
                object::SymbolKind::File => SymbolKind::File,
                object::SymbolKind::Tls => SymbolKind::Tls,
                _ => SymbolKind::Other,
            };
            Some(SymbolEntry::new(name, value, symbol.size(), kind))
        })
        .collect()
}

fn read_sections(file: &object::File<'_>, load_bias: i64) -> Vec<SectionEntry>
{
    file.sections()
        .filter(|section| is_loadable(section.kind()))
        .filter_map(|section| {
            let name = section.name().ok().filter(|name| !name.is_empty())?;
            Some(SectionEntry {
                name: name.to_owned(),
                address: section.address(),
                size: section.size(),
                load_bias,
            })
        })
        .collect()
}

fn is_loadable(kind: SectionKind) -> bool
{
    matches!(
        kind,
        SectionKind::Text
            | SectionKind::Data
            | SectionKind::ReadOnlyData
            | SectionKind::ReadOnlyString
            | SectionKind::UninitializedData
            | SectionKind::Tls
            | SectionKind::UninitializedTls
    )
}
