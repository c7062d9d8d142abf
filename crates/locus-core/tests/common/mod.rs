//! In-memory debug-info provider for integration tests.
//!
//! Scopes are added per compile unit; index 0 of every unit is the unit
//! itself, and each scope names its parent by index.

#![allow(dead_code)]

use std::path::PathBuf;

use locus_core::provider::{CompileUnitId, DebugInfoProvider, LineRow, Module, ModuleId, ScopeId, ScopeNode};
use locus_core::types::{AddressClass, LineFlags, ScopeTag, SectionEntry, SourceLocation, SymbolEntry, SymbolKind};

pub struct FakeScope
{
    pub tag: ScopeTag,
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub start: u64,
    pub end: u64,
    pub call_site: Option<SourceLocation>,
}

pub struct FakeUnit
{
    pub module: ModuleId,
    pub comp_dir: Option<String>,
    pub scopes: Vec<FakeScope>,
}

pub struct FakeLine
{
    pub module: ModuleId,
    pub start: u64,
    pub end: u64,
    pub row: LineRow,
}

#[derive(Default)]
pub struct FakeProvider
{
    pub modules: Vec<Module>,
    pub symbols: Vec<Vec<SymbolEntry>>,
    pub sections: Vec<Vec<SectionEntry>>,
    pub units: Vec<FakeUnit>,
    pub lines: Vec<FakeLine>,
}

impl FakeProvider
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn module(self, name: &str, start: u64, end: u64) -> Self
    {
        self.module_with_class(name, start, end, AddressClass::Elf64)
    }

    pub fn module_with_class(mut self, name: &str, start: u64, end: u64, class: AddressClass) -> Self
    {
        let id = ModuleId(self.modules.len());
        self.modules.push(Module {
            id,
            name: name.to_string(),
            path: PathBuf::from(name),
            start,
            end,
            load_bias: 0,
            class,
        });
        self.symbols.push(Vec::new());
        self.sections.push(Vec::new());
        self
    }

    pub fn symbol(mut self, module: usize, name: &str, value: u64, size: u64, kind: SymbolKind) -> Self
    {
        self.symbols[module].push(SymbolEntry::new(name, value, size, kind));
        self
    }

    pub fn section(mut self, module: usize, name: &str, address: u64, size: u64) -> Self
    {
        self.sections[module].push(SectionEntry {
            name: name.to_string(),
            address,
            size,
            load_bias: 0,
        });
        self
    }

    /// Start a new compile unit; following `scope` calls add to it.
    pub fn unit(mut self, module: usize, start: u64, end: u64, comp_dir: Option<&str>) -> Self
    {
        self.units.push(FakeUnit {
            module: ModuleId(module),
            comp_dir: comp_dir.map(str::to_string),
            scopes: vec![FakeScope {
                tag: ScopeTag::Other,
                name: Some("unit.c".to_string()),
                parent: None,
                start,
                end,
                call_site: None,
            }],
        });
        self
    }

    pub fn scope(mut self, parent: usize, tag: ScopeTag, name: Option<&str>, start: u64, end: u64) -> Self
    {
        self.push_scope(FakeScope {
            tag,
            name: name.map(str::to_string),
            parent: Some(parent),
            start,
            end,
            call_site: None,
        });
        self
    }

    pub fn inlined(mut self, parent: usize, name: &str, start: u64, end: u64, call_site: SourceLocation) -> Self
    {
        self.push_scope(FakeScope {
            tag: ScopeTag::InlinedSubroutine,
            name: Some(name.to_string()),
            parent: Some(parent),
            start,
            end,
            call_site: Some(call_site),
        });
        self
    }

    pub fn line(mut self, module: usize, start: u64, end: u64, location: SourceLocation) -> Self
    {
        let unit = self.unit_covering(ModuleId(module), start);
        self.lines.push(FakeLine {
            module: ModuleId(module),
            start,
            end,
            row: LineRow {
                file: location.file,
                line: location.line,
                column: location.column,
                flags: location.flags,
                unit,
            },
        });
        self
    }

    fn push_scope(&mut self, scope: FakeScope)
    {
        self.units
            .last_mut()
            .expect("add a unit before its scopes")
            .scopes
            .push(scope);
    }

    fn unit_covering(&self, module: ModuleId, address: u64) -> Option<CompileUnitId>
    {
        self.units
            .iter()
            .position(|unit| unit.module == module && contains(&unit.scopes[0], address))
            .map(|index| CompileUnitId { module, index })
    }

    fn depth(scopes: &[FakeScope], mut index: usize) -> usize
    {
        let mut depth = 0;
        while let Some(parent) = scopes[index].parent {
            depth += 1;
            index = parent;
        }
        depth
    }

    fn ancestry(&self, unit: CompileUnitId, index: usize) -> Vec<ScopeNode>
    {
        let scopes = &self.units[unit.index].scopes;
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            let scope = &scopes[current];
            chain.push(ScopeNode {
                id: ScopeId { unit, index: current },
                tag: scope.tag,
                name: scope.name.clone(),
                call_site: scope.call_site.clone(),
            });
            cursor = scope.parent;
        }
        chain
    }
}

impl DebugInfoProvider for FakeProvider
{
    fn modules(&self) -> &[Module]
    {
        &self.modules
    }

    fn symbols_of(&self, module: ModuleId) -> &[SymbolEntry]
    {
        &self.symbols[module.0]
    }

    fn sections_of(&self, module: ModuleId) -> &[SectionEntry]
    {
        &self.sections[module.0]
    }

    fn compile_unit_at(&self, module: ModuleId, address: u64) -> Option<CompileUnitId>
    {
        self.unit_covering(module, address)
    }

    fn scopes_covering(&self, unit: CompileUnitId, address: u64) -> Vec<ScopeNode>
    {
        let scopes = &self.units[unit.index].scopes;
        let innermost = (0..scopes.len())
            .filter(|&index| contains(&scopes[index], address))
            .max_by_key(|&index| Self::depth(scopes, index));
        match innermost {
            Some(index) => self.ancestry(unit, index),
            None => Vec::new(),
        }
    }

    fn full_scope_tree_of(&self, scope: ScopeId) -> Vec<ScopeNode>
    {
        self.ancestry(scope.unit, scope.index)
    }

    fn line_at(&self, module: ModuleId, address: u64) -> Option<LineRow>
    {
        self.lines
            .iter()
            .find(|line| line.module == module && line.start <= address && address < line.end)
            .map(|line| line.row.clone())
    }

    fn compilation_directory_of(&self, unit: CompileUnitId) -> Option<String>
    {
        self.units[unit.index].comp_dir.clone()
    }
}

fn contains(scope: &FakeScope, address: u64) -> bool
{
    scope.start <= address && address < scope.end
}

/// Statement-boundary flags, as a compiler would emit for the first row of a line.
pub fn stmt_flags() -> LineFlags
{
    LineFlags {
        is_statement: true,
        ..LineFlags::default()
    }
}

/// One module `a.out` at `[0x1000, 0x2000)`:
///
/// ```text
/// 0x1000..0x1020  add   (subprogram, symbol size 0x20)     /src/add.c:3
/// 0x1020..0x1050  main  (subprogram, symbol size 0x30)     src/main.c:10 (is_stmt)
///   0x1030..0x1040  square   inlined at main.c:12:7
///     0x1032..0x103c  lexical block
///       0x1034..0x1038  _Z3mulii  inlined at math.h:5:3
/// 0x1060..0x1070  helper (symbol only, no debug info)
/// 0x10c0          label  (sizeless symbol)
/// .text           0x1000, size 0x100
/// ```
pub fn sample_provider() -> FakeProvider
{
    let mut main_line = SourceLocation::new("src/main.c", 10, 0);
    main_line.flags = stmt_flags();

    FakeProvider::new()
        .module("a.out", 0x1000, 0x2000)
        .symbol(0, ".text", 0x1000, 0, SymbolKind::Section)
        .symbol(0, "add.c", 0, 0, SymbolKind::File)
        .symbol(0, "add", 0x1000, 0x20, SymbolKind::Function)
        .symbol(0, "main", 0x1020, 0x30, SymbolKind::Function)
        .symbol(0, "helper", 0x1060, 0x10, SymbolKind::Function)
        .symbol(0, "label", 0x10c0, 0, SymbolKind::Other)
        .section(0, ".text", 0x1000, 0x100)
        .section(0, ".data", 0x1100, 0x40)
        .unit(0, 0x1000, 0x1050, Some("/build"))
        .scope(0, ScopeTag::Subprogram, Some("add"), 0x1000, 0x1020)
        .scope(0, ScopeTag::Subprogram, Some("main"), 0x1020, 0x1050)
        .inlined(2, "square", 0x1030, 0x1040, SourceLocation::new("src/main.c", 12, 7))
        .scope(3, ScopeTag::LexicalBlock, None, 0x1032, 0x103c)
        .inlined(4, "_Z3mulii", 0x1034, 0x1038, SourceLocation::new("include/math.h", 5, 3))
        .line(0, 0x1000, 0x1020, SourceLocation::new("/src/add.c", 3, 0))
        .line(0, 0x1020, 0x1050, main_line)
}
