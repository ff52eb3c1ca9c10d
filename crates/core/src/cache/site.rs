use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{KeeperError, KeeperResult};

/// Environment variable naming the site-packages root directly.
pub const SITE_PACKAGES_ENV: &str = "JITKEEPER_SITE_PACKAGES";

/// Environment variable naming the interpreter to ask.
pub const PYTHON_ENV: &str = "JITKEEPER_PYTHON";

const DEFAULT_PYTHON: &str = "python3";

/// Resolve the site-packages root the package is installed under.
///
/// Precedence:
/// - `explicit`, usually from the CLI or config.
/// - `JITKEEPER_SITE_PACKAGES`.
/// - The first entry of `site.getsitepackages()` as reported by `python`,
///   falling back to `JITKEEPER_PYTHON` and then `python3`.
pub fn resolve_site_packages(explicit: Option<&Path>, python: Option<&str>) -> KeeperResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(p) = env::var(SITE_PACKAGES_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }

    let interpreter = match python {
        Some(p) => p.to_string(),
        None => env::var(PYTHON_ENV).unwrap_or_else(|_| DEFAULT_PYTHON.to_string()),
    };
    query_interpreter(&interpreter).map_err(KeeperError::SitePackages)
}

fn query_interpreter(interpreter: &str) -> Result<PathBuf, String> {
    let output = Command::new(interpreter)
        .arg("-c")
        .arg("import site; print(site.getsitepackages()[0])")
        .output()
        .map_err(|e| format!("failed to spawn {interpreter}: {e}"))?;
    if !output.status.success() {
        return Err(format!("{interpreter} exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap_or("").trim();
    if first.is_empty() {
        Err(format!("{interpreter} reported no site-packages directory"))
    } else {
        Ok(PathBuf::from(first))
    }
}
