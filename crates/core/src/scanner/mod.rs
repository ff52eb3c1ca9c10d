//! Static discovery of `@njit` kernels.
//!
//! The scan reads and parses every module source of a package directory and
//! records each top-level function carrying the marker decorator, either bare
//! (`@njit`) or called (`@njit(fastmath=True)`). Nothing is imported or
//! executed, so discovery works even when the package cannot be loaded.

pub mod syntax;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;

/// Decorator name marking a function for JIT compilation.
pub const DEFAULT_MARKER: &str = "njit";

/// Module stems that never contribute kernels.
pub const DEFAULT_IGNORE: &[&str] = &["__init__", "__pycache__"];

/// Extension of module source files.
const SOURCE_EXTENSION: &str = "py";

/// Knobs for a scan. `Default` matches the standard package conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Decorator name to look for.
    pub marker: String,
    /// Module stems to skip, compared case-sensitively.
    pub ignore: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One module source file considered by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Module name (the file stem).
    pub name: String,
    pub path: PathBuf,
}

/// List the module sources of `dir`, sorted by module name.
///
/// Skips ignored stems, hidden entries, directories, and non-`.py` files.
pub fn module_sources(dir: &Path, ignore: &[String]) -> KeeperResult<Vec<ModuleSource>> {
    let entries = fs::read_dir(dir).map_err(|e| KeeperError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| KeeperError::io(dir, e))?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('.') || ignore.iter().any(|i| i == stem) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| KeeperError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            continue;
        }
        sources.push(ModuleSource { name: stem.to_string(), path: path.clone() });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

/// Scan `dir` with the default marker and ignore list.
pub fn scan(dir: &Path) -> KeeperResult<Vec<DecoratedFunctionRef>> {
    scan_with(dir, &ScanOptions::default())
}

/// Scan `dir`, returning refs in module order, then file body order.
///
/// Fails on the first module that cannot be read or parsed.
pub fn scan_with(dir: &Path, options: &ScanOptions) -> KeeperResult<Vec<DecoratedFunctionRef>> {
    let mut refs = Vec::new();
    for module in module_sources(dir, &options.ignore)? {
        let source =
            fs::read_to_string(&module.path).map_err(|e| KeeperError::Parse {
                path: module.path.clone(),
                message: e.to_string(),
            })?;
        let found = scan_source(&module.name, &source, &options.marker)
            .map_err(|message| KeeperError::Parse { path: module.path.clone(), message })?;
        debug!(module = %module.name, kernels = found.len(), "scanned module");
        refs.extend(found);
    }
    Ok(refs)
}

/// Scan a single module's source text.
///
/// The error is the parser's message; callers attach the path.
pub fn scan_source(
    module: &str,
    source: &str,
    marker: &str,
) -> Result<Vec<DecoratedFunctionRef>, String> {
    let tree = syntax::parse_python(source)?;
    let root = tree.root();
    let refs = syntax::marked_functions(&root, marker)
        .into_iter()
        .map(|f| DecoratedFunctionRef::new(module, f.name))
        .collect();
    Ok(refs)
}
