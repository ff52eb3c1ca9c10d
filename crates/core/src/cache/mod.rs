//! Cache maintenance for compiled kernels.
//!
//! Four one-shot operations over a freshly discovered kernel set: enable
//! persistent caching, list or clear cached artifacts, and force
//! recompilation (optionally overriding `fastmath`). None of this is a
//! supported interface of the JIT framework, so every operation logs
//! [`CACHE_WARNING`] first.

pub mod site;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;
use crate::options::{FastmathSetting, FASTMATH_OPTION};
use crate::registry::KernelResolver;

pub use site::resolve_site_packages;

pub const CACHE_WARNING: &str = "Caching `numba` functions is purely for experimental purposes \
and should never be used or depended upon as it is not supported! All caching capabilities \
are not tested and may be removed/changed without prior notice. Please proceed with caution!";

/// Subdirectory of the installed package holding cached artifacts.
pub const DEFAULT_CACHE_SUBDIR: &str = "__pycache__";

/// Glob selecting cache artifacts inside the cache directory.
pub const DEFAULT_CACHE_PATTERN: &str = "*nb*";

fn warn_experimental() {
    warn!("{CACHE_WARNING}");
}

/// Where an installed package keeps its compiled-kernel artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    dir: PathBuf,
    pattern: String,
}

impl CacheLocation {
    /// `<site_packages>/<package>/__pycache__` with the `*nb*` pattern.
    pub fn for_package(site_packages: &Path, package: &str) -> Self {
        Self::new(site_packages.join(package).join(DEFAULT_CACHE_SUBDIR), DEFAULT_CACHE_PATTERN)
    }

    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self { dir: dir.into(), pattern: pattern.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Regular files in the cache dir matching the pattern, sorted.
    ///
    /// A missing directory simply yields nothing.
    pub fn artifacts(&self) -> KeeperResult<Vec<PathBuf>> {
        let full = format!("{}/{}", glob::Pattern::escape(&self.dir.to_string_lossy()), self.pattern);
        let entries = glob::glob(&full).map_err(|e| KeeperError::Pattern {
            pattern: self.pattern.clone(),
            message: e.to_string(),
        })?;
        let mut paths: Vec<PathBuf> =
            entries.filter_map(|entry| entry.ok()).filter(|path| path.is_file()).collect();
        paths.sort();
        Ok(paths)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

/// Names of the cached artifacts currently on disk.
pub fn list_cache(location: &CacheLocation) -> KeeperResult<Vec<String>> {
    warn_experimental();
    Ok(location.artifacts()?.iter().map(|p| file_name(p)).collect())
}

/// Delete every cached artifact, returning the names removed.
///
/// Directories and files not matching the pattern are left alone.
pub fn clear_cache(location: &CacheLocation) -> KeeperResult<Vec<String>> {
    warn_experimental();
    let mut removed = Vec::new();
    for path in location.artifacts()? {
        fs::remove_file(&path).map_err(|e| KeeperError::io(&path, e))?;
        debug!(artifact = %path.display(), "removed cache artifact");
        removed.push(file_name(&path));
    }
    Ok(removed)
}

/// Turn on persistent caching for every kernel in `refs`.
pub fn enable_caching<R: KernelResolver + ?Sized>(
    refs: &[DecoratedFunctionRef],
    resolver: &mut R,
) -> KeeperResult<()> {
    warn_experimental();
    for reference in refs {
        resolver.resolve(reference)?.enable_caching()?;
        debug!(kernel = %reference, "enabled caching");
    }
    Ok(())
}

/// The kernels a recompilation applies to: `target` alone, or all of `refs`.
///
/// A target outside `refs` is [`KeeperError::NotFound`].
pub fn select_targets(
    refs: &[DecoratedFunctionRef],
    target: Option<&DecoratedFunctionRef>,
    marker: &str,
) -> KeeperResult<Vec<DecoratedFunctionRef>> {
    match target {
        None => Ok(refs.to_vec()),
        Some(target) if refs.contains(target) => Ok(vec![target.clone()]),
        Some(target) => Err(KeeperError::NotFound {
            function: target.qualified_name(),
            marker: marker.to_string(),
        }),
    }
}

/// Recompile `target`, or every kernel in `refs` when `target` is `None`.
///
/// A target outside `refs` fails with [`KeeperError::NotFound`] before any
/// kernel is touched. When `fastmath` is given it replaces that single
/// option ahead of each recompilation; otherwise options are left as-is.
pub fn recompile<R: KernelResolver + ?Sized>(
    refs: &[DecoratedFunctionRef],
    resolver: &mut R,
    target: Option<&DecoratedFunctionRef>,
    fastmath: Option<&FastmathSetting>,
    marker: &str,
) -> KeeperResult<Vec<DecoratedFunctionRef>> {
    warn_experimental();

    let targets = select_targets(refs, target, marker)?;
    for reference in &targets {
        let kernel = resolver.resolve(reference)?;
        if let Some(setting) = fastmath {
            kernel.target_options_mut().insert(FASTMATH_OPTION, setting.clone().into());
        }
        kernel.recompile()?;
    }
    Ok(targets)
}
