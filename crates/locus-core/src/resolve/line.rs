//! Source line lookup and path presentation.

use std::path::Path;

use crate::config::ResolverConfig;
use crate::provider::{CompileUnitId, DebugInfoProvider, Module};
use crate::types::SourceLocation;

/// File, line and column for `address`, with the path shaped by `config`.
///
/// Line flags are only copied when `show_flags` is set.
pub fn resolve_line<P>(provider: &P, module: &Module, address: u64, config: &ResolverConfig) -> Option<SourceLocation>
where
    P: DebugInfoProvider + ?Sized,
{
    let row = provider.line_at(module.id, address)?;
    let file = present_path(provider, &row.file, row.unit, config);
    let mut location = SourceLocation::new(file, row.line, row.column);
    if config.show_flags {
        location.flags = row.flags;
    }
    Some(location)
}

/// Apply the path options of `config` to a path recorded in debug info.
///
/// - `only_basenames`: keep the final component only
/// - `use_comp_dir`: prefix a relative path with the compilation directory of
///   `unit`, when that directory is known
pub fn present_path<P>(provider: &P, path: &str, unit: Option<CompileUnitId>, config: &ResolverConfig) -> String
where
    P: DebugInfoProvider + ?Sized,
{
    if config.only_basenames {
        return basename(path).to_owned();
    }

    if config.use_comp_dir && !Path::new(path).is_absolute() {
        if let Some(dir) = unit.and_then(|unit| provider.compilation_directory_of(unit)) {
            return format!("{dir}/{path}");
        }
    }

    path.to_owned()
}

fn basename(path: &str) -> &str
{
    path.rsplit('/').next().unwrap_or(path)
}
