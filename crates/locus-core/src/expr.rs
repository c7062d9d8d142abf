//! # Address Expressions
//!
//! Parsing of the textual address forms accepted by the resolver.
//!
//! Three forms are recognised, tried in this order:
//!
//! 1. a hex literal (`1010`, `0x1010`)
//! 2. a section-relative offset (`(.text)+16`, `(.data)0x20`)
//! 3. a symbol with an optional offset (`main`, `main+0x10`, `main-4`)
//!
//! A form only matches when it consumes the entire input. Section and symbol
//! forms can both describe the same text (`(.text)+16` is also a valid
//! symbol name followed by an offset), so both are attempted and total
//! consumption decides; when both consume the input the section form wins.
//!
//! Note that a bare word made only of hex digits (`add`, `cafe`) is a
//! literal, not a symbol: the literal form is tried first.

use std::fmt;
use std::str::FromStr;

use crate::error::{LocusError, Result};

/// A parsed address expression, not yet resolved to an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressQuery
{
    /// An absolute address.
    Literal(u64),
    /// An offset relative to the start of a named section.
    SectionOffset
    {
        section: String,
        offset: i64,
    },
    /// An offset relative to the value of a named symbol.
    SymbolOffset
    {
        symbol: String,
        offset: i64,
    },
}

impl AddressQuery
{
    /// Parse an address expression.
    ///
    /// ```rust
    /// use locus_core::AddressQuery;
    ///
    /// assert_eq!(AddressQuery::parse("0x1010").unwrap(), AddressQuery::Literal(0x1010));
    /// assert_eq!(
    ///     AddressQuery::parse("main+0x10").unwrap(),
    ///     AddressQuery::SymbolOffset {
    ///         symbol: "main".into(),
    ///         offset: 0x10
    ///     }
    /// );
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns [`LocusError::MalformedExpression`] when no form consumes the
    /// whole input, including for the empty string.
    pub fn parse(input: &str) -> Result<Self>
    {
        if let Some(value) = parse_hex_literal(input) {
            return Ok(AddressQuery::Literal(value));
        }

        let section = parse_section_form(input);
        let symbol = parse_symbol_form(input);
        section
            .or(symbol)
            .ok_or_else(|| LocusError::MalformedExpression(input.to_owned()))
    }
}

impl FromStr for AddressQuery
{
    type Err = LocusError;

    fn from_str(s: &str) -> Result<Self>
    {
        AddressQuery::parse(s)
    }
}

impl fmt::Display for AddressQuery
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            AddressQuery::Literal(value) => write!(f, "{value:#x}"),
            AddressQuery::SectionOffset { section, offset } => write!(f, "({section}){offset:+}"),
            AddressQuery::SymbolOffset { symbol, offset: 0 } => write!(f, "{symbol}"),
            AddressQuery::SymbolOffset { symbol, offset } => write!(f, "{symbol}{offset:+}"),
        }
    }
}

/// Whole-string base-16 number with an optional `0x` prefix.
fn parse_hex_literal(input: &str) -> Option<u64>
{
    let digits = strip_hex_prefix(input).unwrap_or(input);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// `(<name>)<signed-integer>` where the name has no `)`.
fn parse_section_form(input: &str) -> Option<AddressQuery>
{
    let rest = input.strip_prefix('(')?;
    let close = rest.find(')')?;
    let (name, tail) = (&rest[..close], &rest[close + 1..]);
    if name.is_empty() {
        return None;
    }
    let offset = parse_c_integer(tail)?;
    Some(AddressQuery::SectionOffset {
        section: name.to_owned(),
        offset,
    })
}

/// `<name>[<signed-integer>]` where the name has no `+` or `-`.
fn parse_symbol_form(input: &str) -> Option<AddressQuery>
{
    let split = input.find(|c: char| c == '+' || c == '-').unwrap_or(input.len());
    let (name, tail) = input.split_at(split);
    if name.is_empty() {
        return None;
    }
    let offset = if tail.is_empty() { 0 } else { parse_c_integer(tail)? };
    Some(AddressQuery::SymbolOffset {
        symbol: name.to_owned(),
        offset,
    })
}

fn strip_hex_prefix(input: &str) -> Option<&str>
{
    input.strip_prefix("0x").or_else(|| input.strip_prefix("0X"))
}

/// Signed integer in C `%i` notation: optional sign, then `0x` hex, leading-zero
/// octal or decimal. The whole string must be consumed.
fn parse_c_integer(input: &str) -> Option<i64>
{
    let (negative, body) = match input.as_bytes().first()? {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    let (digits, radix) = if let Some(hex) = strip_hex_prefix(body) {
        (hex, 16)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_c_integer_bases()
    {
        assert_eq!(parse_c_integer("16"), Some(16));
        assert_eq!(parse_c_integer("+0x10"), Some(16));
        assert_eq!(parse_c_integer("-0X10"), Some(-16));
        assert_eq!(parse_c_integer("020"), Some(16));
        assert_eq!(parse_c_integer("0"), Some(0));
        assert_eq!(parse_c_integer("-9223372036854775808"), Some(i64::MIN));
    }

    #[test]
    fn test_c_integer_rejects_leftovers()
    {
        assert_eq!(parse_c_integer(""), None);
        assert_eq!(parse_c_integer("+"), None);
        assert_eq!(parse_c_integer("0x"), None);
        assert_eq!(parse_c_integer("12ab"), None);
        assert_eq!(parse_c_integer("09"), None);
        assert_eq!(parse_c_integer("9223372036854775808"), None);
    }

    #[test]
    fn test_hex_literal_prefix()
    {
        assert_eq!(parse_hex_literal("0x1010"), Some(0x1010));
        assert_eq!(parse_hex_literal("DEADbeef"), Some(0xdead_beef));
        assert_eq!(parse_hex_literal("0x"), None);
        assert_eq!(parse_hex_literal("0x10g"), None);
        assert_eq!(parse_hex_literal("1_000"), None);
    }
}
