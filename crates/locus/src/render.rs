//! addr2line-style text output for resolved addresses.

use std::io::{self, Write};

use locus_core::types::{LineFlags, SourceLocation};
use locus_core::{ResolvedSymbol, ResolverConfig};

const UNKNOWN: &str = "??";
const UNKNOWN_LOCATION: &str = "??:0";

/// Write one resolved address.
///
/// Pretty mode puts the address, the names and the source location on one
/// line; verbose mode puts each on its own line. Inline frames always get a
/// line each.
pub fn render<W: Write>(out: &mut W, resolved: &ResolvedSymbol, config: &ResolverConfig, width: usize) -> io::Result<()>
{
    if config.print_addresses {
        let separator = if config.pretty { ": " } else { "\n" };
        write!(out, "{}{separator}", resolved.address.padded(width))?;
    }

    if config.show_functions || config.show_symbols {
        write!(out, "{}", resolved.primary_name.as_deref().unwrap_or(UNKNOWN))?;
        write_symbol(out, resolved)?;
        if let Some(function) = &resolved.function {
            for site in &function.call_sites {
                write!(out, "\n inlined at {}", location_text(site))?;
            }
        }
        write!(out, "{}", if config.pretty { " at " } else { "\n" })?;
    }

    match &resolved.location {
        Some(location) => {
            write!(out, "{}", location_text(location))?;
            if config.show_flags {
                write_flags(out, &location.flags)?;
            }
        }
        None => write!(out, "{UNKNOWN_LOCATION}")?,
    }
    writeln!(out)?;

    for frame in &resolved.inline_chain {
        let call_site = frame
            .call_site
            .as_ref()
            .map_or_else(|| UNKNOWN_LOCATION.to_string(), location_text);
        let caller = frame.caller.as_deref().unwrap_or(UNKNOWN);
        if config.pretty {
            writeln!(out, " (inlined by) {caller} at {call_site}")?;
        } else {
            writeln!(out, "{caller}\n{call_site}")?;
        }
    }

    Ok(())
}

fn write_symbol<W: Write>(out: &mut W, resolved: &ResolvedSymbol) -> io::Result<()>
{
    match (&resolved.symbol, &resolved.section_name) {
        (Some(symbol), _) => {
            write!(out, " <{}+{:#x}>", symbol.name, symbol.offset)?;
            if let Some(section) = &symbol.section {
                write!(out, " ({section})")?;
            }
        }
        (None, Some(section)) => write!(out, " ({section})+{:#x}", resolved.offset)?,
        (None, None) => {}
    }
    Ok(())
}

fn write_flags<W: Write>(out: &mut W, flags: &LineFlags) -> io::Result<()>
{
    if flags.is_statement {
        write!(out, " (is_stmt)")?;
    }
    if flags.is_basic_block_start {
        write!(out, " (basic_block)")?;
    }
    if flags.is_prologue_end {
        write!(out, " (prologue_end)")?;
    }
    if flags.is_epilogue_begin {
        write!(out, " (epilogue_begin)")?;
    }
    if flags.isa != 0 {
        write!(out, " (isa {})", flags.isa)?;
    }
    if flags.discriminator != 0 {
        write!(out, " (discriminator {})", flags.discriminator)?;
    }
    Ok(())
}

fn location_text(location: &SourceLocation) -> String
{
    match location.column {
        0 => format!("{}:{}", location.file, location.line),
        column => format!("{}:{}:{column}", location.file, location.line),
    }
}

#[cfg(test)]
mod tests
{
    use locus_core::types::{Address, InlineFrame, SymbolMatch};

    use super::*;

    fn resolved() -> ResolvedSymbol
    {
        let mut resolved = ResolvedSymbol::unknown(Address::new(0x1010));
        resolved.primary_name = Some("add".into());
        resolved.symbol = Some(SymbolMatch {
            name: "add".into(),
            offset: 0x10,
            section: Some(".text".into()),
        });
        resolved.location = Some(SourceLocation::new("add.c", 3, 5));
        resolved
    }

    fn render_to_string(resolved: &ResolvedSymbol, config: &ResolverConfig) -> String
    {
        let mut out = Vec::new();
        render(&mut out, resolved, config, 8).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_pretty_line()
    {
        let config = ResolverConfig::default().with_addresses(true);
        assert_eq!(
            render_to_string(&resolved(), &config),
            "0x00001010: add <add+0x10> (.text) at add.c:3:5\n"
        );
    }

    #[test]
    fn test_render_verbose_lines()
    {
        let config = ResolverConfig::default().with_pretty(false);
        assert_eq!(render_to_string(&resolved(), &config), "add <add+0x10> (.text)\nadd.c:3:5\n");
    }

    #[test]
    fn test_render_unknown_address()
    {
        let unknown = ResolvedSymbol::unknown(Address::new(0xdead));
        assert_eq!(render_to_string(&unknown, &ResolverConfig::default()), "?? at ??:0\n");
    }

    #[test]
    fn test_render_flags_and_inlines()
    {
        let mut resolved = resolved();
        if let Some(location) = resolved.location.as_mut() {
            location.flags.is_statement = true;
            location.flags.discriminator = 2;
        }
        resolved.inline_chain.push(InlineFrame {
            name: "add".into(),
            caller: Some("main".into()),
            call_site: Some(SourceLocation::new("main.c", 10, 0)),
        });

        let config = ResolverConfig::default().with_flags(true).with_symbols(false);
        resolved.symbol = None;
        resolved.section_name = None;
        assert_eq!(
            render_to_string(&resolved, &config),
            "add at add.c:3:5 (is_stmt) (discriminator 2)\n (inlined by) main at main.c:10\n"
        );
    }
}
