//! Resolver configuration.
//!
//! Every switch that changes what a resolution reports lives here and is
//! fixed when the [`Resolver`](crate::Resolver) is built, so two resolvers
//! with different settings never interfere.

/// Options controlling what [`Resolver::resolve`](crate::Resolver::resolve) reports.
///
/// The defaults match addr2line-style tools: function names, symbol names,
/// symbol sections and demangling are on, output is single-line ("pretty"),
/// everything else is off.
///
/// ```rust
/// use locus_core::ResolverConfig;
///
/// let config = ResolverConfig::default().with_inlines(true).with_basenames(true);
/// assert!(config.show_inlines);
/// assert!(config.show_functions);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig
{
    /// Prime the address width so callers can print the address before each entry.
    pub print_addresses: bool,
    /// Strip source paths down to their final component.
    pub only_basenames: bool,
    /// Prefix relative source paths with the compile unit's compilation directory.
    pub use_comp_dir: bool,
    /// Report line-table flags (`is_stmt`, `prologue_end`, ...).
    pub show_flags: bool,
    /// Look up the enclosing function in debug info.
    pub show_functions: bool,
    /// Report the covering symbol-table entry.
    pub show_symbols: bool,
    /// Annotate the covering symbol with its section.
    pub show_symbol_sections: bool,
    /// Report the full inline expansion chain.
    pub show_inlines: bool,
    /// Demangle `_Z` names.
    pub demangle: bool,
    /// Single-line presentation: stop at the first inline for the function name.
    pub pretty: bool,
    /// Interpret every literal address as an offset into this section.
    pub just_section: Option<String>,
}

impl Default for ResolverConfig
{
    fn default() -> Self
    {
        Self {
            print_addresses: false,
            only_basenames: false,
            use_comp_dir: false,
            show_flags: false,
            show_functions: true,
            show_symbols: true,
            show_symbol_sections: true,
            show_inlines: false,
            demangle: true,
            pretty: true,
            just_section: None,
        }
    }
}

impl ResolverConfig
{
    #[must_use]
    pub fn with_addresses(mut self, enabled: bool) -> Self
    {
        self.print_addresses = enabled;
        self
    }

    #[must_use]
    pub fn with_basenames(mut self, enabled: bool) -> Self
    {
        self.only_basenames = enabled;
        self
    }

    #[must_use]
    pub fn with_comp_dir(mut self, enabled: bool) -> Self
    {
        self.use_comp_dir = enabled;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, enabled: bool) -> Self
    {
        self.show_flags = enabled;
        self
    }

    #[must_use]
    pub fn with_functions(mut self, enabled: bool) -> Self
    {
        self.show_functions = enabled;
        self
    }

    #[must_use]
    pub fn with_symbols(mut self, enabled: bool) -> Self
    {
        self.show_symbols = enabled;
        self
    }

    #[must_use]
    pub fn with_symbol_sections(mut self, enabled: bool) -> Self
    {
        self.show_symbol_sections = enabled;
        self
    }

    #[must_use]
    pub fn with_inlines(mut self, enabled: bool) -> Self
    {
        self.show_inlines = enabled;
        self
    }

    #[must_use]
    pub fn with_demangle(mut self, enabled: bool) -> Self
    {
        self.demangle = enabled;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, enabled: bool) -> Self
    {
        self.pretty = enabled;
        self
    }

    /// Treat literal addresses as offsets into `section`.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self
    {
        self.just_section = Some(section.into());
        self
    }
}
