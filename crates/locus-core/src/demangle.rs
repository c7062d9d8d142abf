//! Symbol demangling.
//!
//! Compilers "mangle" symbol names to encode namespaces and types. Only names
//! carrying the Itanium marker `_Z` are touched here; everything else is
//! returned as-is.
//!
//! ## Schemes
//!
//! - **Rust (legacy)**: `_ZN...17h<hash>E`, decoded with `rustc_demangle`
//!   (hash suffix dropped)
//! - **C++**: Itanium ABI, decoded with `cpp_demangle`
//!
//! Rust symbols are tried first because a legacy Rust name is also a
//! syntactically valid (but unreadable) C++ name.

use std::fmt::Write as _;

use cpp_demangle::DemangleOptions;

/// Prefix shared by every name this module tries to decode.
pub const MANGLED_MARKER: &str = "_Z";

/// Demangler with a reusable output buffer.
///
/// The returned string borrows either the input or the internal buffer, so it
/// is only valid until the next call.
///
/// ## Example
///
/// ```rust
/// use locus_core::demangle::Demangler;
///
/// let mut demangler = Demangler::new(true);
/// assert_eq!(demangler.demangle("_Z3addii"), "add(int, int)");
/// assert_eq!(demangler.demangle("main"), "main");
/// ```
#[derive(Debug, Default)]
pub struct Demangler
{
    enabled: bool,
    buffer: String,
}

impl Demangler
{
    pub fn new(enabled: bool) -> Self
    {
        Self {
            enabled,
            buffer: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool
    {
        self.enabled
    }

    /// Demangle `name`, or return it unchanged when demangling is disabled,
    /// the name is not mangled, or no scheme accepts it.
    pub fn demangle<'a>(&'a mut self, name: &'a str) -> &'a str
    {
        if !self.enabled || !is_mangled(name) {
            return name;
        }

        self.buffer.clear();
        if let Ok(symbol) = rustc_demangle::try_demangle(name) {
            if write!(self.buffer, "{symbol:#}").is_ok() {
                return &self.buffer;
            }
            self.buffer.clear();
        }

        match cpp_demangle::Symbol::new(name)
            .ok()
            .and_then(|symbol| symbol.demangle(&DemangleOptions::default()).ok())
        {
            Some(text) => {
                self.buffer.push_str(&text);
                &self.buffer
            }
            None => name,
        }
    }
}

/// Whether `name` starts with the Itanium mangling marker.
pub fn is_mangled(name: &str) -> bool
{
    name.starts_with(MANGLED_MARKER)
}
