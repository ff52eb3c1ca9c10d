use anyhow::{Context, Result};
use jitkeeper_core::cache;

use crate::commands::{cache_location, discover, open_context};

/// List cached artifacts of the installed package.
pub fn cache_list_command(
    root: &str,
    package: Option<&str>,
    site_packages: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = open_context(root, package)?;
    let location = cache_location(&ctx, site_packages)?;
    let names = cache::list_cache(&location)
        .with_context(|| format!("Failed to list {}", location.dir().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No cached artifacts in {}", location.dir().display());
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}

/// Delete cached artifacts of the installed package.
pub fn cache_clear_command(
    root: &str,
    package: Option<&str>,
    site_packages: Option<&str>,
) -> Result<()> {
    let ctx = open_context(root, package)?;
    let location = cache_location(&ctx, site_packages)?;
    let removed = cache::clear_cache(&location)
        .with_context(|| format!("Failed to clear {}", location.dir().display()))?;

    println!("Removed {} cache artifact(s) from {}", removed.len(), location.dir().display());
    Ok(())
}

/// Enable persistent caching for every discovered kernel.
pub fn cache_enable_command(
    root: &str,
    package: Option<&str>,
    site_packages: Option<&str>,
) -> Result<()> {
    let ctx = open_context(root, package)?;
    let refs = discover(&ctx)?;
    let location = cache_location(&ctx, site_packages)?;
    let mut registry = ctx.registry(Some(location.dir()));

    cache::enable_caching(&refs, &mut registry).context("Failed to enable caching")?;

    println!("Enabled caching for {} kernel(s) in {}", refs.len(), location.dir().display());
    Ok(())
}
