//! # Resolver
//!
//! The [`Resolver`] ties the resolution steps together:
//!
//! 1. parse the expression into an [`AddressQuery`]
//! 2. turn section- and symbol-relative queries into an absolute address
//! 3. find the owning module
//! 4. collect the function identity, covering symbol, source line and inline
//!    chain the configuration asks for
//! 5. demangle every name it hands back
//!
//! Steps 1 and 2 are the only ones that can fail. Once an address is known,
//! anything missing (no module, no debug info, no line table) just leaves the
//! matching fields of [`ResolvedSymbol`] empty.

use std::path::PathBuf;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::demangle::Demangler;
use crate::error::{LocusError, Result};
use crate::expr::AddressQuery;
use crate::provider::{CompileUnitId, DebugInfoProvider, ImageDescriptor, ObjectProvider};
use crate::resolve::{
    covering_scopes, identify, inline_chain, locate, present_path, resolve_line, resolve_section, resolve_symbol,
    section_containing, symbol_covering,
};
use crate::types::{address_width, Address, FunctionIdentity, InlineFrame, ResolvedSymbol, SourceLocation, SymbolMatch};

/// Resolves address expressions against a set of loaded modules.
///
/// The resolver owns its provider (and through it the binaries and parsed
/// debug info) for its whole lifetime. `resolve` takes `&mut self` because
/// demangled names are produced in a reusable buffer; use one resolver per
/// thread.
///
/// ## Example
///
/// ```rust,no_run
/// use locus_core::{Resolver, ResolverConfig};
///
/// let mut resolver = Resolver::open("./a.out", ResolverConfig::default().with_inlines(true))?;
/// let resolved = resolver.resolve("main+0x10")?;
/// println!("{:?} at {:?}", resolved.primary_name, resolved.location);
/// # Ok::<(), locus_core::LocusError>(())
/// ```
pub struct Resolver<P = ObjectProvider>
{
    provider: P,
    config: ResolverConfig,
    demangler: Demangler,
}

impl Resolver<ObjectProvider>
{
    /// Load one binary at its link-time addresses.
    ///
    /// ## Errors
    ///
    /// [`LocusError::ModuleUnavailable`] if the binary cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>, config: ResolverConfig) -> Result<Self>
    {
        Ok(Self::with_provider(ObjectProvider::open(path)?, config))
    }

    /// Load several images, each at its own load address.
    ///
    /// ## Errors
    ///
    /// [`LocusError::ModuleUnavailable`] for the first image that fails to load.
    pub fn open_images(images: Vec<ImageDescriptor>, config: ResolverConfig) -> Result<Self>
    {
        Ok(Self::with_provider(ObjectProvider::open_images(images)?, config))
    }
}

impl<P: DebugInfoProvider> Resolver<P>
{
    /// Build a resolver on top of any debug-info backend.
    pub fn with_provider(provider: P, config: ResolverConfig) -> Self
    {
        let demangler = Demangler::new(config.demangle);
        Self {
            provider,
            config,
            demangler,
        }
    }

    pub fn config(&self) -> &ResolverConfig
    {
        &self.config
    }

    pub fn provider(&self) -> &P
    {
        &self.provider
    }

    /// Hex digits used when printing addresses.
    ///
    /// Fixed for the whole process by the first call, from the class of the
    /// first loaded module (16 when none is loaded).
    pub fn address_width(&self) -> usize
    {
        address_width(self.provider.modules().first().map(|module| module.class))
    }

    /// Resolve a textual address expression.
    ///
    /// ## Errors
    ///
    /// - [`LocusError::MalformedExpression`] if `expr` matches no accepted form
    /// - [`LocusError::AmbiguousModuleSet`], [`LocusError::SectionNotFound`] for
    ///   section-relative expressions
    /// - [`LocusError::SymbolNotFound`] for symbol-relative expressions
    /// - [`LocusError::OutOfRange`] if an offset leaves its section or symbol
    pub fn resolve(&mut self, expr: &str) -> Result<ResolvedSymbol>
    {
        let query = AddressQuery::parse(expr)?;
        debug!(expr, query = %query, "parsed address expression");
        let address = self.evaluate(&query)?;
        Ok(self.describe(address))
    }

    /// Resolve a numeric address. A configured `just_section` still applies.
    ///
    /// ## Errors
    ///
    /// Only fails when `just_section` is set; see [`resolve`](Self::resolve).
    pub fn resolve_address(&mut self, address: u64) -> Result<ResolvedSymbol>
    {
        let address = self.evaluate(&AddressQuery::Literal(address))?;
        Ok(self.describe(address))
    }

    /// Turn a parsed query into an absolute address.
    ///
    /// ## Errors
    ///
    /// Same as [`resolve`](Self::resolve), minus parsing.
    pub fn evaluate(&self, query: &AddressQuery) -> Result<u64>
    {
        match query {
            AddressQuery::Literal(value) => match &self.config.just_section {
                Some(section) => {
                    let offset =
                        i64::try_from(*value).map_err(|_| LocusError::out_of_range(*value, section.as_str()))?;
                    resolve_section(&self.provider, section, offset)
                }
                None => Ok(*value),
            },
            AddressQuery::SectionOffset { section, offset } => resolve_section(&self.provider, section, *offset),
            AddressQuery::SymbolOffset { symbol, offset } => resolve_symbol(&self.provider, symbol, *offset),
        }
    }

    fn describe(&mut self, address: u64) -> ResolvedSymbol
    {
        let config = &self.config;
        let provider = &self.provider;
        let demangler = &mut self.demangler;
        let mut result = ResolvedSymbol::unknown(Address::from(address));

        if config.print_addresses {
            let width = address_width(provider.modules().first().map(|module| module.class));
            debug!(width, "address width");
        }

        let Some(module) = locate(provider, address) else {
            debug!(address = %result.address, "address outside every module");
            return result;
        };
        result.module = Some(module.name.clone());

        let scopes = if config.show_functions || config.show_inlines {
            covering_scopes(provider, module, address)
        } else {
            Vec::new()
        };
        let unit = scopes.first().map(|scope| scope.id.unit);

        let function = if config.show_functions {
            identify(&scopes, config.pretty)
        } else {
            None
        };

        let covering = symbol_covering(provider.symbols_of(module.id), address);
        let section = section_containing(provider, module.id, address);
        match covering {
            Some((symbol, offset)) => {
                result.offset = offset;
                if config.show_symbol_sections {
                    result.section_name = section.map(|section| section.name.clone());
                }
                if config.show_symbols {
                    result.symbol = Some(SymbolMatch {
                        name: demangled(demangler, &symbol.name),
                        offset,
                        section: result.section_name.clone(),
                    });
                }
            }
            None => {
                if let Some(section) = section {
                    result.section_name = Some(section.name.clone());
                    result.offset = section.offset_of(address).unwrap_or(0);
                }
            }
        }

        result.primary_name = match (&function, covering) {
            (Some(function), _) => Some(demangled(demangler, &function.name)),
            (None, Some((symbol, _))) if config.show_functions || config.show_symbols => {
                Some(demangled(demangler, &symbol.name))
            }
            _ => None,
        };

        result.function = function.map(|function| FunctionIdentity {
            name: demangled(demangler, &function.name),
            kind: function.kind,
            call_sites: function
                .call_sites
                .into_iter()
                .map(|site| presented(provider, config, site, unit))
                .collect(),
        });

        result.location = resolve_line(provider, module, address, config);

        if config.show_inlines {
            if let Some(innermost) = scopes.first() {
                result.inline_chain = inline_chain(provider, innermost.id, config.show_functions)
                    .into_iter()
                    .map(|frame| InlineFrame {
                        name: demangled(demangler, &frame.name),
                        caller: frame.caller.map(|caller| demangled(demangler, &caller)),
                        call_site: frame.call_site.map(|site| presented(provider, config, site, unit)),
                    })
                    .collect();
            }
        }

        debug!(
            address = %result.address,
            module = %module.name,
            name = result.primary_name.as_deref().unwrap_or("??"),
            inlines = result.inline_chain.len(),
            "resolved address"
        );
        result
    }
}

fn demangled(demangler: &mut Demangler, name: &str) -> String
{
    demangler.demangle(name).to_owned()
}

fn presented<P>(provider: &P, config: &ResolverConfig, site: SourceLocation, unit: Option<CompileUnitId>) -> SourceLocation
where
    P: DebugInfoProvider + ?Sized,
{
    SourceLocation {
        file: present_path(provider, &site.file, unit, config),
        ..site
    }
}
