//! Symbol, scope and source location types.

use std::fmt;

use super::address::Address;

/// Classification of a symbol-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind
{
    /// Code (`STT_FUNC`).
    Function,
    /// Data object (`STT_OBJECT`).
    Object,
    /// Section symbol (`STT_SECTION`).
    Section,
    /// Source file name (`STT_FILE`).
    File,
    /// Thread-local storage (`STT_TLS`).
    Tls,
    /// Anything else, including untyped labels.
    Other,
}

impl SymbolKind
{
    /// Whether an entry of this kind may be the target of a name lookup or
    /// cover an address. Section, file and TLS entries never do.
    pub const fn is_resolvable(self) -> bool
    {
        !matches!(self, SymbolKind::Section | SymbolKind::File | SymbolKind::Tls)
    }
}

/// One entry of a module's symbol table.
///
/// `value` is the absolute (load-bias adjusted) address of the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry
{
    pub name: String,
    pub value: u64,
    pub size: u64,
    pub kind: SymbolKind,
}

impl SymbolEntry
{
    pub fn new(name: impl Into<String>, value: u64, size: u64, kind: SymbolKind) -> Self
    {
        Self {
            name: name.into(),
            value,
            size,
            kind,
        }
    }
}

/// One section of a module, as needed for `(section)+offset` resolution.
///
/// `address` is the link-time address; the runtime address is
/// `address + load_bias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry
{
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub load_bias: i64,
}

impl SectionEntry
{
    /// Runtime address of the first byte of the section.
    pub fn base(&self) -> Option<u64>
    {
        self.address.checked_add_signed(self.load_bias)
    }

    /// Offset of `address` inside this section, if the section contains it.
    pub fn offset_of(&self, address: u64) -> Option<u64>
    {
        let offset = address.checked_sub(self.base()?)?;
        (offset < self.size).then_some(offset)
    }
}

/// Debug-info tag of a scope, reduced to what the scope walk cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeTag
{
    /// A real, out-of-line function (`DW_TAG_subprogram`).
    Subprogram,
    /// A function body expanded inline (`DW_TAG_inlined_subroutine`).
    InlinedSubroutine,
    /// An alternate entry point (`DW_TAG_entry_point`).
    EntryPoint,
    /// A nested block (`DW_TAG_lexical_block`).
    LexicalBlock,
    /// Anything else that carries code ranges, including the compile unit.
    Other,
}

/// Per-row annotations of a line table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineFlags
{
    pub is_statement: bool,
    pub is_basic_block_start: bool,
    pub is_prologue_end: bool,
    pub is_epilogue_begin: bool,
    pub isa: u32,
    pub discriminator: u32,
}

/// Source code location for an address or an inline call site.
///
/// A `line` or `column` of zero means "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation
{
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub flags: LineFlags,
}

impl SourceLocation
{
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self
    {
        Self {
            file: file.into(),
            line,
            column,
            flags: LineFlags::default(),
        }
    }
}

impl fmt::Display for SourceLocation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match (self.line, self.column) {
            (0, _) => write!(f, "{}", self.file),
            (line, 0) => write!(f, "{}:{line}", self.file),
            (line, column) => write!(f, "{}:{line}:{column}", self.file),
        }
    }
}

/// Kind of scope that supplied the function identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind
{
    Subprogram,
    InlinedSubroutine,
}

/// The function the address belongs to, according to debug info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionIdentity
{
    pub name: String,
    pub kind: IdentityKind,
    /// Call sites of the inlines walked through on the way to the enclosing
    /// real function, innermost first. Only filled in verbose (non-pretty) mode.
    pub call_sites: Vec<SourceLocation>,
}

/// One level of inlining that produced the code at an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFrame
{
    /// Name of the inlined function.
    pub name: String,
    /// Nearest enclosing function, entry point or inline it was expanded into.
    pub caller: Option<String>,
    /// Where the call that was inlined appears in the source.
    pub call_site: Option<SourceLocation>,
}

/// The symbol-table entry covering an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch
{
    pub name: String,
    pub offset: u64,
    /// Section holding the address, when section annotation is enabled.
    pub section: Option<String>,
}

/// Everything known about one resolved address.
///
/// Only the address is guaranteed; every other field is absent when the
/// corresponding information is unavailable or disabled in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol
{
    pub address: Address,
    /// Name of the module owning the address.
    pub module: Option<String>,
    /// Best available name: debug-info function, else covering symbol.
    pub primary_name: Option<String>,
    /// Offset of the address from the covering symbol, or from the start of
    /// its section when no symbol covers it.
    pub offset: u64,
    pub section_name: Option<String>,
    pub function: Option<FunctionIdentity>,
    pub symbol: Option<SymbolMatch>,
    pub location: Option<SourceLocation>,
    /// Inline expansion chain, innermost first.
    pub inline_chain: Vec<InlineFrame>,
}

impl ResolvedSymbol
{
    /// A result carrying nothing but the address.
    pub fn unknown(address: Address) -> Self
    {
        Self {
            address,
            module: None,
            primary_name: None,
            offset: 0,
            section_name: None,
            function: None,
            symbol: None,
            location: None,
            inline_chain: Vec::new(),
        }
    }
}
