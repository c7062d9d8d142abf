//! Tests for the shared data model

use locus_core::types::{Address, AddressClass, LineFlags, SectionEntry, SourceLocation, SymbolKind};

#[test]
fn test_address_conversions()
{
    let addr = Address::from(0x1010);
    assert_eq!(addr.value(), 0x1010);
    let value: u64 = addr.into();
    assert_eq!(value, 0x1010);
    assert_eq!(format!("{addr}"), "0x1010");
    assert_eq!(format!("{addr:x}"), "1010");
}

#[test]
fn test_address_padding()
{
    assert_eq!(Address::new(0x1010).padded(8), "0x00001010");
    assert_eq!(Address::new(0x1010).padded(16), "0x0000000000001010");
    assert_eq!(Address::new(u64::MAX).padded(8), "0xffffffffffffffff");
}

#[test]
fn test_address_checked_offset()
{
    let addr = Address::new(0x1000);
    assert_eq!(addr.checked_offset(0x10), Some(Address::new(0x1010)));
    assert_eq!(addr.checked_offset(-0x1000), Some(Address::new(0)));
    assert_eq!(addr.checked_offset(-0x1001), None);
    assert_eq!(Address::new(u64::MAX).checked_offset(1), None);
}

#[test]
fn test_address_class_width()
{
    assert_eq!(AddressClass::Elf32.hex_width(), 8);
    assert_eq!(AddressClass::Elf64.hex_width(), 16);
}

#[test]
fn test_symbol_kind_resolvable()
{
    assert!(SymbolKind::Function.is_resolvable());
    assert!(SymbolKind::Object.is_resolvable());
    assert!(SymbolKind::Other.is_resolvable());
    assert!(!SymbolKind::Section.is_resolvable());
    assert!(!SymbolKind::File.is_resolvable());
    assert!(!SymbolKind::Tls.is_resolvable());
}

#[test]
fn test_section_entry_with_bias()
{
    let section = SectionEntry {
        name: ".text".to_string(),
        address: 0x1000,
        size: 0x100,
        load_bias: 0x5555_0000,
    };
    assert_eq!(section.base(), Some(0x5555_1000));
    assert_eq!(section.offset_of(0x5555_1010), Some(0x10));
    assert_eq!(section.offset_of(0x5555_1100), None);
    assert_eq!(section.offset_of(0x1010), None);

    let negative = SectionEntry {
        load_bias: -0x2000,
        ..section
    };
    assert_eq!(negative.base(), None);
}

#[test]
fn test_source_location_display()
{
    assert_eq!(SourceLocation::new("main.c", 10, 4).to_string(), "main.c:10:4");
    assert_eq!(SourceLocation::new("main.c", 10, 0).to_string(), "main.c:10");
    assert_eq!(SourceLocation::new("main.c", 0, 0).to_string(), "main.c");
}

#[test]
fn test_line_flags_default_off()
{
    let flags = LineFlags::default();
    assert!(!flags.is_statement);
    assert!(!flags.is_basic_block_start);
    assert!(!flags.is_prologue_end);
    assert!(!flags.is_epilogue_begin);
    assert_eq!(flags.isa, 0);
    assert_eq!(flags.discriminator, 0);
    assert_eq!(SourceLocation::new("a.c", 1, 1).flags, flags);
}
