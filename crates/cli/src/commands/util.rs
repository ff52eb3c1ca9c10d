use std::path::PathBuf;

use anyhow::{Context, Result};
use jitkeeper_core::cache::CacheLocation;
use jitkeeper_core::config::KeeperContext;
use jitkeeper_core::DecoratedFunctionRef;
use tracing::debug;

use crate::canonicalize_or_current;

/// Resolve the root and load the package context (config file or defaults).
pub fn open_context(root: &str, package: Option<&str>) -> Result<KeeperContext> {
    let root_path = canonicalize_or_current(root)?;
    KeeperContext::from_root(&root_path, package)
        .with_context(|| format!("Failed to load jitkeeper context at {}", root_path.display()))
}

/// Scan the package, attaching the package dir to any failure.
pub fn discover(ctx: &KeeperContext) -> Result<Vec<DecoratedFunctionRef>> {
    let package_dir = ctx.package_dir();
    let refs =
        ctx.scan().with_context(|| format!("Failed to scan {}", package_dir.display()))?;
    debug!(kernels = refs.len(), dir = %package_dir.display(), "discovered kernels");
    Ok(refs)
}

/// Resolve the cache location, preferring an explicit `--site-packages`.
pub fn cache_location(ctx: &KeeperContext, site_packages: Option<&str>) -> Result<CacheLocation> {
    let explicit: Option<PathBuf> = site_packages.map(|p| canonicalize_or_current(p)).transpose()?;
    let location = ctx
        .cache_location(explicit.as_deref())
        .context("Failed to locate the package cache directory (try --site-packages)")?;
    debug!(dir = %location.dir().display(), pattern = location.pattern(), "cache location");
    Ok(location)
}
