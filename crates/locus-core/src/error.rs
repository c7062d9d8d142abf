//! # Error Types
//!
//! Errors produced while resolving an address expression.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Every variant is terminal for the `resolve` call that produced it: the
//! input and the loaded binary do not change between attempts, so retrying
//! gives the same answer. A missing function name or missing line info is
//! *not* an error; it shows up as absent fields on
//! [`ResolvedSymbol`](crate::types::ResolvedSymbol).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for address resolution
///
/// ## Error Categories
///
/// 1. **Input errors**: MalformedExpression
/// 2. **Lookup errors**: AmbiguousModuleSet, SectionNotFound, SymbolNotFound
/// 3. **Bound errors**: OutOfRange
/// 4. **Loading errors**: ModuleUnavailable
#[derive(Error, Debug)]
pub enum LocusError
{
    /// The address expression matched none of the accepted forms
    ///
    /// Accepted forms are a hex literal (`0x1010`, `1010`), a section-relative
    /// offset (`(.text)+16`) and a symbol-relative offset (`main`, `main+0x10`,
    /// `main-4`).
    #[error("Malformed address expression: '{0}'")]
    MalformedExpression(String),

    /// Section-relative syntax was used while zero or several modules are loaded
    ///
    /// A section name is only meaningful inside a single image, so the
    /// `(section)+offset` form requires exactly one module.
    #[error("Section syntax requires exactly one module, {0} loaded")]
    AmbiguousModuleSet(usize),

    /// No section with the given name exists in the loaded module
    #[error("Cannot find section '{0}'")]
    SectionNotFound(String),

    /// No usable symbol with the given name exists in any loaded module
    ///
    /// Section, file and TLS symbols are never considered, even if their name
    /// matches exactly.
    #[error("Cannot find symbol '{0}'")]
    SymbolNotFound(String),

    /// The offset falls outside the bounds of the symbol or section it is relative to
    ///
    /// Offsets must satisfy `0 <= offset < size`. Symbols and sections with a
    /// recorded size of zero skip the check, but the resulting address must
    /// still fit in 64 bits. The offset is wide enough to hold any signed
    /// expression offset as well as any unsigned literal.
    #[error("Offset {} lies outside '{target}'", signed_hex(*offset))]
    OutOfRange
    {
        /// Requested offset
        offset: i128,
        /// Symbol or section the offset was applied to
        target: String,
    },

    /// The binary could not be opened or parsed
    #[error("Cannot load module {}: {reason}", path.display())]
    ModuleUnavailable
    {
        /// Path of the image that failed to load
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

impl LocusError
{
    pub(crate) fn out_of_range(offset: impl Into<i128>, target: impl Into<String>) -> Self
    {
        LocusError::OutOfRange {
            offset: offset.into(),
            target: target.into(),
        }
    }

    pub(crate) fn module_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self
    {
        LocusError::ModuleUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// `-0x1` rather than the two's complement `0xffffffffffffffff`.
fn signed_hex(offset: i128) -> String
{
    if offset < 0 {
        format!("-{:#x}", offset.unsigned_abs())
    } else {
        format!("{offset:#x}")
    }
}

/// Convenience type alias for `Result<T, LocusError>`
///
/// ```rust
/// use locus_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LocusError>;
