use anyhow::{Context, Result};
use jitkeeper_core::cache::{self, CacheLocation};
use jitkeeper_core::options::FastmathSetting;
use jitkeeper_core::DecoratedFunctionRef;

use crate::commands::{cache_location, discover, open_context};

/// Options for `recompile`, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RecompileArgs {
    /// `module.function`; all kernels when absent.
    pub function: Option<String>,
    /// `true`, `false`, or a comma-separated fast-math flag list.
    pub fastmath: Option<String>,
    /// Enable caching first so fresh artifacts are persisted.
    pub cache: bool,
    pub site_packages: Option<String>,
}

/// Force recompilation of one or all kernels.
///
/// The cache directory is only resolved when `--cache` or `--site-packages`
/// is given; otherwise kernels recompile without touching the cache.
pub fn recompile_command(root: &str, package: Option<&str>, args: &RecompileArgs) -> Result<()> {
    let target: Option<DecoratedFunctionRef> =
        args.function.as_deref().map(str::parse).transpose()?;
    let fastmath: Option<FastmathSetting> = args.fastmath.as_deref().map(str::parse).transpose()?;

    let ctx = open_context(root, package)?;
    let refs = discover(&ctx)?;
    let marker = ctx.config.marker.as_str();

    let location: Option<CacheLocation> = if args.cache || args.site_packages.is_some() {
        Some(cache_location(&ctx, args.site_packages.as_deref())?)
    } else {
        None
    };
    let mut registry = ctx.registry(location.as_ref().map(|l| l.dir()));

    if args.cache {
        let targets = cache::select_targets(&refs, target.as_ref(), marker)?;
        cache::enable_caching(&targets, &mut registry).context("Failed to enable caching")?;
    }

    let done = cache::recompile(&refs, &mut registry, target.as_ref(), fastmath.as_ref(), marker)
        .context("Recompilation failed")?;

    println!("Recompiled {} kernel(s)", done.len());
    for reference in &done {
        println!("  - {reference}");
    }
    Ok(())
}
