//! # locus-core
//!
//! Address resolution for compiled binaries: turn an address, or an
//! expression such as `main+0x10` or `(.text)+16`, into the function, symbol
//! and source line it belongs to.
//!
//! This crate provides:
//! - An address-expression parser ([`AddressQuery`])
//! - Section- and symbol-relative address resolution with bound checks
//! - DWARF scope walking, including inline expansion chains
//! - Line-table lookup with optional line flags
//! - Demangling of Itanium (`_Z`) names, Rust legacy and C++
//!
//! ## Debug-info backends
//!
//! All binary and DWARF access goes through the
//! [`DebugInfoProvider`](provider::DebugInfoProvider) trait.
//! [`ObjectProvider`](provider::ObjectProvider) reads ELF, Mach-O and PE files
//! with `object` and their DWARF with `gimli`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use locus_core::{Resolver, ResolverConfig};
//!
//! let mut resolver = Resolver::open("./a.out", ResolverConfig::default())?;
//! let resolved = resolver.resolve("0x1010")?;
//! if let Some(name) = &resolved.primary_name {
//!     println!("{name}");
//! }
//! # Ok::<(), locus_core::LocusError>(())
//! ```

pub mod config;
pub mod demangle;
pub mod error;
pub mod expr;
pub mod provider;
pub mod resolve;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use config::ResolverConfig;
pub use error::{LocusError, Result};
pub use expr::AddressQuery;
pub use resolver::Resolver;
pub use types::{Address, ResolvedSymbol};
