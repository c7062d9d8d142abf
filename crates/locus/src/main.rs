use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use locus_core::provider::ImageDescriptor;
use locus_core::{Resolver, ResolverConfig};
use locus_utils::{debug, init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};

mod render;

/// Translate addresses in a binary into function names and source locations.
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(version)]
#[command(about = "Translate addresses or symbol expressions into function names and source locations", long_about = None)]
struct Cli
{
    /// Binary to load (default: a.out)
    #[arg(short = 'e', long = "exe", value_name = "FILE", conflicts_with = "images")]
    exe: Option<PathBuf>,
    /// Load an image at a runtime address, as PATH or PATH@LOAD (repeatable)
    #[arg(long = "image", value_name = "PATH[@LOAD]", value_parser = parse_image)]
    images: Vec<ImageDescriptor>,
    /// Treat addresses as offsets relative to this section
    #[arg(short = 'j', long = "section", value_name = "NAME")]
    section: Option<String>,
    /// Print the address before each entry
    #[arg(short = 'a', long = "addresses")]
    print_addresses: bool,
    /// Show only the base name of source files
    #[arg(short = 's', long = "basenames")]
    basenames: bool,
    /// Prefix relative source paths with the compilation directory
    #[arg(short = 'A', long = "absolute")]
    absolute: bool,
    /// Also show line table flags
    #[arg(short = 'F', long = "flags")]
    flags: bool,
    /// Show all source locations that caused inline expansion
    #[arg(short = 'i', long = "inlines")]
    inlines: bool,
    /// Show function names (on by default)
    #[arg(short = 'f', long = "functions", overrides_with = "no_functions")]
    functions: bool,
    /// Do not look up function names in debug info
    #[arg(long = "no-functions", overrides_with = "functions")]
    no_functions: bool,
    /// Do not show the covering symbol-table entry
    #[arg(long = "no-symbols")]
    no_symbols: bool,
    /// Do not show the section of the covering symbol
    #[arg(long = "no-symbol-sections")]
    no_symbol_sections: bool,
    /// Demangle function names (on by default)
    #[arg(short = 'C', long = "demangle", overrides_with = "no_demangle")]
    demangle: bool,
    /// Print names exactly as stored in the binary
    #[arg(long = "no-demangle", overrides_with = "demangle")]
    no_demangle: bool,
    /// One item per line instead of one address per line
    #[arg(long)]
    verbose: bool,
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
    /// Addresses or expressions (`0x1010`, `main+0x10`, `(.text)+16`); read from stdin when omitted
    #[arg(value_name = "ADDR")]
    exprs: Vec<String>,
}

impl Cli
{
    fn config(&self) -> ResolverConfig
    {
        let config = ResolverConfig::default()
            .with_addresses(self.print_addresses)
            .with_basenames(self.basenames)
            .with_comp_dir(self.absolute)
            .with_flags(self.flags)
            .with_inlines(self.inlines)
            .with_functions(self.functions || !self.no_functions)
            .with_symbols(!self.no_symbols)
            .with_symbol_sections(!self.no_symbol_sections)
            .with_demangle(self.demangle || !self.no_demangle)
            .with_pretty(!self.verbose);
        match &self.section {
            Some(section) => config.with_section(section.clone()),
            None => config,
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match setup_logging(cli.log_level.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("locus: error: {e}");
            process::exit(1);
        }
    }
}

fn setup_logging(level: Option<&str>) -> Result<LoggingGuard, LoggingError>
{
    let Some(level) = level else {
        return init_logging();
    };
    let level = LogLevel::from_str(level).map_err(LoggingError::InvalidLevel)?;
    let format = match std::env::var(locus_utils::logging::LOG_FORMAT_ENV) {
        Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat)?,
        Err(_) => LogFormat::Pretty,
    };
    init_logging_with_level(level, format)
}

/// Resolve every requested address. Returns `Ok(false)` if any single
/// address failed; those failures are reported on stderr as they happen.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>>
{
    let config = cli.config();
    let mut resolver = if cli.images.is_empty() {
        let exe = cli.exe.unwrap_or_else(|| PathBuf::from("a.out"));
        debug!(path = %exe.display(), "opening executable");
        Resolver::open(exe, config)?
    } else {
        Resolver::open_images(cli.images, config)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut all_ok = true;

    if cli.exprs.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            let expr = line.trim();
            if expr.is_empty() {
                continue;
            }
            all_ok &= handle(&mut resolver, expr, &mut out)?;
            // Flush per line so interactive pipes see each answer
            out.flush()?;
        }
    } else {
        for expr in &cli.exprs {
            all_ok &= handle(&mut resolver, expr, &mut out)?;
        }
    }

    out.flush()?;
    Ok(all_ok)
}

fn handle<W: Write>(resolver: &mut Resolver, expr: &str, out: &mut W) -> io::Result<bool>
{
    match resolver.resolve(expr) {
        Ok(resolved) => {
            let width = resolver.address_width();
            render::render(out, &resolved, resolver.config(), width)?;
            Ok(true)
        }
        Err(e) => {
            eprintln!("locus: {e}");
            Ok(false)
        }
    }
}

fn parse_image(value: &str) -> Result<ImageDescriptor, String>
{
    let Some((path, load)) = value.rsplit_once('@') else {
        return Ok(ImageDescriptor::new(value));
    };
    let digits = load.strip_prefix("0x").or_else(|| load.strip_prefix("0X")).unwrap_or(load);
    let load_address =
        u64::from_str_radix(digits, 16).map_err(|e| format!("invalid load address '{load}' in '{value}': {e}"))?;
    Ok(ImageDescriptor::new(path).loaded_at(load_address))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_image_with_load_address()
    {
        let image = parse_image("/lib/libc.so.6@0x7f0000000000").unwrap();
        assert_eq!(image.path, PathBuf::from("/lib/libc.so.6"));
        assert_eq!(image.load_address, Some(0x7f00_0000_0000));

        let image = parse_image("./a.out").unwrap();
        assert_eq!(image.load_address, None);

        assert!(parse_image("./a.out@zz").is_err());
    }

    #[test]
    fn test_cli_defaults_match_resolver_defaults()
    {
        let cli = Cli::parse_from(["locus", "-e", "a.out", "0x1010"]);
        assert_eq!(cli.config(), ResolverConfig::default());
        assert_eq!(cli.exprs, vec!["0x1010".to_string()]);
    }

    #[test]
    fn test_cli_flags_map_onto_config()
    {
        let cli = Cli::parse_from(["locus", "-aisF", "-j", ".text", "--no-demangle", "--verbose", "16"]);
        let config = cli.config();
        assert!(config.print_addresses);
        assert!(config.show_inlines);
        assert!(config.only_basenames);
        assert!(config.show_flags);
        assert!(!config.demangle);
        assert!(!config.pretty);
        assert_eq!(config.just_section.as_deref(), Some(".text"));
    }
}
