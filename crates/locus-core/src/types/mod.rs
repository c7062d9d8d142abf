//! # Types
//!
//! Data model shared by the parser, the resolvers and the debug-info provider.

pub mod address;
pub mod symbols;

// Re-export all public types
pub use address::{address_width, Address, AddressClass};
pub use symbols::{
    FunctionIdentity, IdentityKind, InlineFrame, LineFlags, ResolvedSymbol, ScopeTag, SectionEntry, SourceLocation,
    SymbolEntry, SymbolKind, SymbolMatch,
};
