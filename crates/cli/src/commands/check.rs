use anyhow::{Context, Result};
use jitkeeper_core::audit;

use crate::commands::{discover, open_context};

/// Audit every kernel for the required target option.
///
/// Silent on success; on violation the error names every offending kernel.
pub fn check_command(root: &str, package: Option<&str>) -> Result<()> {
    let ctx = open_context(root, package)?;
    let refs = discover(&ctx)?;
    let mut registry = ctx.registry(None);

    audit::audit(&refs, &mut registry, &ctx.config.marker, &ctx.config.required_option)
        .with_context(|| format!("Flag audit failed for package `{}`", ctx.config.package))
}
