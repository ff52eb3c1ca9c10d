use anyhow::Result;

use crate::commands::{discover, open_context};

/// Print every discovered kernel as `module.function`, or as JSON.
pub fn scan_command(root: &str, package: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root, package)?;
    let refs = discover(&ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&refs)?);
        return Ok(());
    }

    for reference in &refs {
        println!("{reference}");
    }
    Ok(())
}
