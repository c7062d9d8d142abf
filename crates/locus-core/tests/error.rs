//! Tests for error handling

use std::path::PathBuf;

use locus_core::error::{LocusError, Result};

#[test]
fn test_malformed_expression_message()
{
    let error = LocusError::MalformedExpression("main+zz".to_string());
    let message = format!("{}", error);
    assert!(message.contains("main+zz"));
    assert!(message.contains("Malformed"));
}

#[test]
fn test_ambiguous_module_set_message()
{
    let error = LocusError::AmbiguousModuleSet(3);
    let message = format!("{}", error);
    assert!(message.contains("exactly one module"));
    assert!(message.contains('3'));
}

#[test]
fn test_not_found_messages()
{
    let section = format!("{}", LocusError::SectionNotFound(".bss".to_string()));
    assert!(section.contains("section '.bss'"));

    let symbol = format!("{}", LocusError::SymbolNotFound("main".to_string()));
    assert!(symbol.contains("symbol 'main'"));
}

#[test]
fn test_out_of_range_message()
{
    let error = LocusError::OutOfRange {
        offset: 0x30,
        target: "add".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("0x30"));
    assert!(message.contains("'add'"));
}

#[test]
fn test_module_unavailable_message()
{
    let error = LocusError::ModuleUnavailable {
        path: PathBuf::from("/nonexistent/a.out"),
        reason: "No such file or directory".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("/nonexistent/a.out"));
    assert!(message.contains("No such file"));
}

#[test]
fn test_negative_offset_message_keeps_sign()
{
    let error = LocusError::OutOfRange {
        offset: -1,
        target: "main".to_string(),
    };
    assert_eq!(format!("{}", error), "Offset -0x1 lies outside 'main'");
}

#[test]
fn test_unsigned_literal_offset_message()
{
    let error = LocusError::OutOfRange {
        offset: i128::from(u64::MAX),
        target: ".text".to_string(),
    };
    assert_eq!(format!("{}", error), "Offset 0xffffffffffffffff lies outside '.text'");
}

#[test]
fn test_result_type_alias()
{
    fn returns_result() -> Result<u64>
    {
        Ok(0x1010)
    }

    fn returns_error() -> Result<u64>
    {
        Err(LocusError::SymbolNotFound("missing".to_string()))
    }

    assert_eq!(returns_result().unwrap(), 0x1010);
    assert!(returns_error().is_err());
}
