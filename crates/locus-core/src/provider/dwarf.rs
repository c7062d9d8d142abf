//! DWARF loading, scope arenas and line tables built on `gimli`.
//!
//! Each compile unit lazily builds two indexes the first time it is queried:
//!
//! - a [`ScopeArena`]: every code-carrying DIE (the unit itself, subprograms,
//!   inlined subroutines, entry points, lexical blocks, ...) flattened in DFS
//!   order, each record pointing at its nearest enclosing record by index;
//! - a [`LineTable`]: the unit's line program decoded into address-sorted
//!   sequences.
//!
//! Parent indices always point backwards, so walking outward from any record
//! terminates.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use gimli::{
    constants, AttributeValue, ColumnType, DebuggingInformationEntry, DwAt, Dwarf, EndianArcSlice, FileEntry,
    LineProgramHeader, Range, RunTimeEndian, SectionId, Unit, UnitSectionOffset,
};
use object::{Object, ObjectSection};
use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::types::{LineFlags, ScopeTag, SourceLocation};

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;
type Die<'abbrev, 'unit> = DebuggingInformationEntry<'abbrev, 'unit, OwnedReader>;

/// How many `DW_AT_abstract_origin`/`DW_AT_specification` hops a name lookup follows.
const MAX_ORIGIN_DEPTH: usize = 16;

const LINKAGE_NAME_ATTRS: &[DwAt] = &[constants::DW_AT_linkage_name, constants::DW_AT_MIPS_linkage_name];
const NAME_ATTRS: &[DwAt] = &[constants::DW_AT_name];

/// Parsed DWARF for one image.
pub(crate) struct DwarfInfo
{
    dwarf: OwnedDwarf,
    units: Vec<UnitEntry>,
}

struct UnitEntry
{
    unit: Unit<OwnedReader>,
    ranges: Vec<Range>,
    comp_dir: Option<String>,
    scopes: OnceCell<ScopeArena>,
    lines: OnceCell<LineTable>,
}

impl DwarfInfo
{
    /// Load the DWARF sections of `file`. `None` when the image carries no
    /// usable debug info.
    pub(crate) fn load(file: &object::File<'_>) -> Option<Self>
    {
        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        if section_bytes(file, SectionId::DebugInfo).is_empty() {
            debug!("image has no .debug_info");
            return None;
        }

        let dwarf = Dwarf::load(|id| Ok::<_, gimli::Error>(EndianArcSlice::new(section_bytes(file, id), endian)))
            .map_err(|err| warn!(%err, "failed to load DWARF sections"))
            .ok()?;

        let units = collect_units(&dwarf)
            .map_err(|err| warn!(%err, "failed to read DWARF unit headers"))
            .ok()?;
        debug!(units = units.len(), "loaded DWARF");

        Some(Self { dwarf, units })
    }

    /// Index of the unit whose ranges cover a link-time address.
    pub(crate) fn unit_at(&self, address: u64) -> Option<usize>
    {
        self.units
            .iter()
            .position(|entry| entry.ranges.iter().any(|range| range_contains(range, address)))
    }

    pub(crate) fn comp_dir(&self, index: usize) -> Option<&str>
    {
        self.units.get(index)?.comp_dir.as_deref()
    }

    pub(crate) fn scopes(&self, index: usize) -> Option<&ScopeArena>
    {
        let entry = self.units.get(index)?;
        Some(entry.scopes.get_or_init(|| {
            self.build_scopes(entry).unwrap_or_else(|err| {
                warn!(unit = index, %err, "failed to walk DIE tree");
                ScopeArena::default()
            })
        }))
    }

    /// The line row covering a link-time address, searching the covering unit
    /// first and then every other unit.
    pub(crate) fn line_at(&self, address: u64) -> Option<(usize, LineHit)>
    {
        let preferred = self.unit_at(address);
        let others = (0..self.units.len()).filter(|index| Some(*index) != preferred);

        let tables = preferred
            .into_iter()
            .chain(others)
            .filter_map(|index| Some((index, self.lines(index)?)));
        first_hit(tables, address)
    }

    fn lines(&self, index: usize) -> Option<&LineTable>
    {
        let entry = self.units.get(index)?;
        Some(entry.lines.get_or_init(|| {
            self.build_lines(entry).unwrap_or_else(|err| {
                warn!(unit = index, %err, "failed to decode line program");
                LineTable::default()
            })
        }))
    }

    fn build_scopes(&self, entry: &UnitEntry) -> gimli::Result<ScopeArena>
    {
        let unit = &entry.unit;
        let mut records: Vec<ScopeRecord> = Vec::new();
        // Records still open on the DFS path: (DIE depth, record index).
        let mut open: Vec<(isize, usize)> = Vec::new();
        let mut depth: isize = 0;

        let mut cursor = unit.entries();
        while let Some((delta, die)) = cursor.next_dfs()? {
            depth += delta;
            while open.last().is_some_and(|&(open_depth, _)| open_depth >= depth) {
                open.pop();
            }

            let is_root = records.is_empty();
            let tag = if is_root {
                ScopeTag::Other
            } else {
                match die.tag() {
                    constants::DW_TAG_subprogram => ScopeTag::Subprogram,
                    constants::DW_TAG_inlined_subroutine => ScopeTag::InlinedSubroutine,
                    constants::DW_TAG_entry_point => ScopeTag::EntryPoint,
                    constants::DW_TAG_lexical_block => ScopeTag::LexicalBlock,
                    constants::DW_TAG_try_block | constants::DW_TAG_catch_block | constants::DW_TAG_with_stmt => {
                        ScopeTag::Other
                    }
                    _ => continue,
                }
            };

            let record = if is_root {
                ScopeRecord {
                    tag,
                    parent: None,
                    depth: 0,
                    ranges: entry.ranges.iter().copied().collect(),
                    name: unit.name.as_ref().and_then(reader_to_string),
                    call_site: None,
                }
            } else {
                ScopeRecord {
                    tag,
                    parent: open.last().map(|&(_, index)| index),
                    depth: open.len(),
                    ranges: self.die_ranges(unit, die),
                    name: self.die_name(unit, die),
                    call_site: if tag == ScopeTag::InlinedSubroutine {
                        self.call_site(unit, die)
                    } else {
                        None
                    },
                }
            };

            open.push((depth, records.len()));
            records.push(record);
        }

        Ok(ScopeArena { records })
    }

    fn build_lines(&self, entry: &UnitEntry) -> gimli::Result<LineTable>
    {
        let Some(program) = entry.unit.line_program.clone() else {
            return Ok(LineTable::default());
        };

        let mut table = LineTable::default();
        let mut current: Vec<RowRecord> = Vec::new();
        let mut rows = program.rows();
        while let Some((header, row)) = rows.next_row()? {
            if row.end_sequence() {
                if let Some(first) = current.first() {
                    table.sequences.push(LineSequence {
                        start: first.address,
                        end: row.address(),
                        rows: std::mem::take(&mut current),
                    });
                }
                continue;
            }

            let file = row.file_index();
            if !table.files.contains_key(&file) {
                if let Some(path) = header
                    .file(file)
                    .and_then(|file_entry| self.render_file(&entry.unit, header, file_entry))
                {
                    table.files.insert(file, path);
                }
            }

            current.push(RowRecord {
                address: row.address(),
                file,
                line: row.line().map_or(0, |line| clamp_u32(line.get())),
                column: match row.column() {
                    ColumnType::LeftEdge => 0,
                    ColumnType::Column(column) => clamp_u32(column.get()),
                },
                flags: LineFlags {
                    is_statement: row.is_stmt(),
                    is_basic_block_start: row.basic_block(),
                    is_prologue_end: row.prologue_end(),
                    is_epilogue_begin: row.epilogue_begin(),
                    isa: clamp_u32(row.isa()),
                    discriminator: clamp_u32(row.discriminator()),
                },
            });
        }

        table.sequences.sort_by_key(|sequence| sequence.start);
        Ok(table)
    }

    fn die_ranges(&self, unit: &Unit<OwnedReader>, die: &Die<'_, '_>) -> SmallVec<[Range; 1]>
    {
        let mut ranges = SmallVec::new();
        let mut iter = match self.dwarf.die_ranges(unit, die) {
            Ok(iter) => iter,
            Err(err) => {
                debug!(%err, "unreadable DIE ranges");
                return ranges;
            }
        };
        loop {
            match iter.next() {
                Ok(Some(range)) if range.begin < range.end => ranges.push(range),
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(err) => {
                    debug!(%err, "truncated DIE range list");
                    break;
                }
            }
        }
        ranges
    }

    /// Linkage name anywhere along the origin chain, else the plain name.
    fn die_name(&self, unit: &Unit<OwnedReader>, die: &Die<'_, '_>) -> Option<String>
    {
        self.integrated_string(unit, die, LINKAGE_NAME_ATTRS, MAX_ORIGIN_DEPTH)
            .or_else(|| self.integrated_string(unit, die, NAME_ATTRS, MAX_ORIGIN_DEPTH))
    }

    /// First string attribute out of `attrs` on `die`, or on the DIEs it
    /// refers to through `DW_AT_abstract_origin`/`DW_AT_specification`.
    fn integrated_string(&self, unit: &Unit<OwnedReader>, die: &Die<'_, '_>, attrs: &[DwAt], budget: usize) -> Option<String>
    {
        for attr in attrs {
            if let Some(value) = die.attr_value(*attr).ok().flatten() {
                if let Some(text) = self.attr_string(unit, value) {
                    return Some(text);
                }
            }
        }

        if budget == 0 {
            return None;
        }

        for origin in [constants::DW_AT_abstract_origin, constants::DW_AT_specification] {
            let found = match die.attr_value(origin).ok().flatten() {
                Some(AttributeValue::UnitRef(offset)) => unit
                    .entry(offset)
                    .ok()
                    .and_then(|target| self.integrated_string(unit, &target, attrs, budget - 1)),
                Some(AttributeValue::DebugInfoRef(offset)) => {
                    let target = UnitSectionOffset::from(offset);
                    self.units.iter().find_map(|other| {
                        let unit_offset = target.to_unit_offset(&other.unit)?;
                        let target_die = other.unit.entry(unit_offset).ok()?;
                        self.integrated_string(&other.unit, &target_die, attrs, budget - 1)
                    })
                }
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn call_site(&self, unit: &Unit<OwnedReader>, die: &Die<'_, '_>) -> Option<SourceLocation>
    {
        let file_index = match die.attr_value(constants::DW_AT_call_file).ok().flatten()? {
            AttributeValue::FileIndex(index) => index,
            other => other.udata_value()?,
        };
        let header = unit.line_program.as_ref()?.header();
        let file = self.render_file(unit, header, header.file(file_index)?)?;
        let line = self.udata_attr(die, constants::DW_AT_call_line);
        let column = self.udata_attr(die, constants::DW_AT_call_column);
        Some(SourceLocation::new(file, line, column))
    }

    fn udata_attr(&self, die: &Die<'_, '_>, attr: DwAt) -> u32
    {
        die.attr_value(attr)
            .ok()
            .flatten()
            .and_then(|value| value.udata_value())
            .map_or(0, clamp_u32)
    }

    /// Full path of a line-table file entry: the compilation directory, then
    /// the entry's directory, then its name. An absolute component replaces
    /// everything before it.
    ///
    /// `FileEntry::directory` already maps index 0 to the compilation
    /// directory (the header's `comp_dir` before DWARF 5, directory entry 0
    /// from DWARF 5 on).
    fn render_file(
        &self,
        unit: &Unit<OwnedReader>,
        header: &LineProgramHeader<OwnedReader>,
        file: &FileEntry<OwnedReader>,
    ) -> Option<String>
    {
        let name = self.attr_string(unit, file.path_name())?;
        let mut path = unit.comp_dir.as_ref().and_then(reader_to_string).unwrap_or_default();
        if let Some(dir) = file.directory(header).and_then(|dir| self.attr_string(unit, dir)) {
            push_path(&mut path, &dir);
        }
        push_path(&mut path, &name);
        Some(path)
    }

    fn attr_string(&self, unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> Option<String>
    {
        let raw = self.dwarf.attr_string(unit, value).ok()?;
        reader_to_string(&raw)
    }
}

/// Every code-carrying scope of one compile unit, in DFS order.
#[derive(Default)]
pub(crate) struct ScopeArena
{
    records: Vec<ScopeRecord>,
}

pub(crate) struct ScopeRecord
{
    pub(crate) tag: ScopeTag,
    pub(crate) parent: Option<usize>,
    depth: usize,
    ranges: SmallVec<[Range; 1]>,
    pub(crate) name: Option<String>,
    pub(crate) call_site: Option<SourceLocation>,
}

impl ScopeArena
{
    pub(crate) fn get(&self, index: usize) -> Option<&ScopeRecord>
    {
        self.records.get(index)
    }

    /// Deepest record whose ranges contain `address`.
    pub(crate) fn innermost(&self, address: u64) -> Option<usize>
    {
        let mut best: Option<usize> = None;
        for (index, record) in self.records.iter().enumerate() {
            if !record.ranges.iter().any(|range| range_contains(range, address)) {
                continue;
            }
            if best.map_or(true, |current| record.depth > self.records[current].depth) {
                best = Some(index);
            }
        }
        best
    }

    /// `index` followed by its enclosing records, outermost last.
    pub(crate) fn ancestry(&self, index: usize) -> Vec<usize>
    {
        let mut chain = Vec::new();
        let mut cursor = self.records.get(index).map(|_| index);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.records[current].parent;
        }
        chain
    }
}

/// Line row data handed back to the provider.
pub(crate) struct LineHit
{
    pub(crate) file: String,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) flags: LineFlags,
}

#[derive(Default)]
struct LineTable
{
    sequences: Vec<LineSequence>,
    files: HashMap<u64, String>,
}

struct LineSequence
{
    start: u64,
    end: u64,
    rows: Vec<RowRecord>,
}

#[derive(Clone, Copy)]
struct RowRecord
{
    address: u64,
    file: u64,
    line: u32,
    column: u32,
    flags: LineFlags,
}

impl LineTable
{
    /// Last row at or before `address` in the sequence containing it.
    fn find(&self, address: u64) -> Option<&RowRecord>
    {
        let sequence = self
            .sequences
            .iter()
            .find(|sequence| sequence.start <= address && address < sequence.end)?;
        let after = sequence.rows.partition_point(|row| row.address <= address);
        sequence.rows.get(after.checked_sub(1)?)
    }
}

/// First table, in iteration order, with a row for `address` whose file is
/// known. Rows naming an unknown file are skipped.
fn first_hit<'a>(tables: impl Iterator<Item = (usize, &'a LineTable)>, address: u64) -> Option<(usize, LineHit)>
{
    for (index, table) in tables {
        let Some(row) = table.find(address) else {
            continue;
        };
        let Some(file) = table.files.get(&row.file) else {
            debug!(unit = index, file = row.file, "line row refers to unknown file");
            continue;
        };
        return Some((
            index,
            LineHit {
                file: file.clone(),
                line: row.line,
                column: row.column,
                flags: row.flags,
            },
        ));
    }
    None
}

fn collect_units(dwarf: &OwnedDwarf) -> gimli::Result<Vec<UnitEntry>>
{
    let mut units = Vec::new();
    let mut headers = dwarf.units();
    while let Some(header) = headers.next()? {
        let unit = match dwarf.unit(header) {
            Ok(unit) => unit,
            Err(err) => {
                warn!(%err, "skipping unparsable compile unit");
                continue;
            }
        };

        let mut ranges = Vec::new();
        let mut iter = dwarf.unit_ranges(&unit)?;
        while let Some(range) = iter.next()? {
            if range.begin < range.end {
                ranges.push(range);
            }
        }

        let comp_dir = unit.comp_dir.as_ref().and_then(reader_to_string);
        units.push(UnitEntry {
            unit,
            ranges,
            comp_dir,
            scopes: OnceCell::new(),
            lines: OnceCell::new(),
        });
    }
    Ok(units)
}

/// Bytes of a DWARF section, trying the ELF name and then the Mach-O `__` spelling.
fn section_bytes(file: &object::File<'_>, id: SectionId) -> Arc<[u8]>
{
    let name = id.name();
    let macho = name.strip_prefix('.').map(|stem| format!("__{stem}"));

    for candidate in std::iter::once(name).chain(macho.as_deref()) {
        let Some(section) = file.section_by_name(candidate) else {
            continue;
        };
        match section.uncompressed_data() {
            Ok(Cow::Borrowed(bytes)) => return Arc::from(bytes),
            Ok(Cow::Owned(bytes)) => return Arc::from(bytes),
            Err(err) => {
                warn!(section = candidate, %err, "failed to read debug section");
                break;
            }
        }
    }

    Arc::from(Vec::new())
}

fn reader_to_string(reader: &OwnedReader) -> Option<String>
{
    use gimli::Reader;

    reader.to_string_lossy().ok().map(Cow::into_owned)
}

fn push_path(path: &mut String, component: &str)
{
    if component.is_empty() {
        return;
    }
    if component.starts_with('/') || path.is_empty() {
        component.clone_into(path);
        return;
    }
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(component);
}

fn range_contains(range: &Range, address: u64) -> bool
{
    range.begin <= address && address < range.end
}

fn clamp_u32(value: u64) -> u32
{
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn table(file: u64, known: Option<&str>, line: u32) -> LineTable
    {
        let row = RowRecord {
            address: 0x1000,
            file,
            line,
            column: 0,
            flags: LineFlags::default(),
        };
        LineTable {
            sequences: vec![LineSequence {
                start: 0x1000,
                end: 0x1100,
                rows: vec![row],
            }],
            files: known.map(|path| (file, path.to_string())).into_iter().collect(),
        }
    }

    #[test]
    fn test_first_hit_skips_row_with_unknown_file()
    {
        let broken = table(7, None, 3);
        let good = table(1, Some("/src/b.c"), 9);

        let (index, hit) = first_hit([(0, &broken), (1, &good)].into_iter(), 0x1010).unwrap();
        assert_eq!(index, 1);
        assert_eq!(hit.file, "/src/b.c");
        assert_eq!(hit.line, 9);
    }

    #[test]
    fn test_first_hit_prefers_earlier_table()
    {
        let first = table(1, Some("/src/a.c"), 3);
        let second = table(1, Some("/src/b.c"), 9);

        let (index, hit) = first_hit([(0, &first), (1, &second)].into_iter(), 0x1000).unwrap();
        assert_eq!(index, 0);
        assert_eq!(hit.file, "/src/a.c");
        assert!(first_hit([(0, &first)].into_iter(), 0x1100).is_none());
    }

    fn joined(parts: &[&str]) -> String
    {
        let mut path = String::new();
        for part in parts {
            push_path(&mut path, part);
        }
        path
    }

    #[test]
    fn test_push_path_joins_relative_components()
    {
        assert_eq!(joined(&["/tmp/build", "t.c"]), "/tmp/build/t.c");
        assert_eq!(joined(&["/tmp/build/", "src", "main.c"]), "/tmp/build/src/main.c");
        assert_eq!(joined(&["/tmp/build", "", "t.c"]), "/tmp/build/t.c");
    }

    #[test]
    fn test_push_path_absolute_component_replaces_prefix()
    {
        // Directory 0 before DWARF 5 is the comp_dir itself
        assert_eq!(joined(&["/tmp/build", "/tmp/build", "t.c"]), "/tmp/build/t.c");
        assert_eq!(joined(&["/tmp/build", "/usr/include", "stdio.h"]), "/usr/include/stdio.h");
        assert_eq!(joined(&["/tmp/build", "src", "/abs/x.c"]), "/abs/x.c");
    }

    #[test]
    fn test_push_path_without_comp_dir_stays_relative()
    {
        assert_eq!(joined(&["", "src", "main.c"]), "src/main.c");
        assert_eq!(joined(&["t.c"]), "t.c");
    }
}
