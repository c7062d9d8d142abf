//! Tests for symbol demangling

use locus_core::demangle::{is_mangled, Demangler};

#[test]
fn test_itanium_cpp_names()
{
    let mut demangler = Demangler::new(true);
    assert_eq!(demangler.demangle("_Z3addii"), "add(int, int)");
    assert_eq!(demangler.demangle("_ZN3foo3barEv"), "foo::bar()");
}

#[test]
fn test_legacy_rust_names_drop_hash()
{
    let mut demangler = Demangler::new(true);
    assert_eq!(
        demangler.demangle("_ZN4core3fmt9Formatter3pad17h0123456789abcdefE"),
        "core::fmt::Formatter::pad"
    );
}

#[test]
fn test_unmangled_names_unchanged()
{
    let mut demangler = Demangler::new(true);
    assert_eq!(demangler.demangle("main"), "main");
    assert_eq!(demangler.demangle("_start"), "_start");
    assert_eq!(demangler.demangle(""), "");
}

#[test]
fn test_invalid_mangling_unchanged()
{
    let mut demangler = Demangler::new(true);
    assert_eq!(demangler.demangle("_Z"), "_Z");
    assert_eq!(demangler.demangle("_Zfoo!"), "_Zfoo!");
}

#[test]
fn test_disabled_demangler_passes_through()
{
    let mut demangler = Demangler::new(false);
    assert!(!demangler.is_enabled());
    assert_eq!(demangler.demangle("_Z3addii"), "_Z3addii");
}

#[test]
fn test_buffer_reuse_across_calls()
{
    let mut demangler = Demangler::new(true);
    let names = ["_Z3addii", "main", "_Z3subii", "_Z1fv"];
    let demangled: Vec<String> = names
        .iter()
        .map(|name| demangler.demangle(name).to_owned())
        .collect();
    assert_eq!(demangled, vec!["add(int, int)", "main", "sub(int, int)", "f()"]);
}

#[test]
fn test_is_mangled_marker()
{
    assert!(is_mangled("_Z3addii"));
    assert!(is_mangled("_ZN4core3fmt5writeE"));
    assert!(!is_mangled("_R"));
    assert!(!is_mangled("Z3addii"));
}
