//! Project layout and the optional `jitkeeper.json` config.
//!
//! For now we define:
//! - `KeeperLayout`: computed paths for a project root (no IO).
//! - `KeeperConfig`: serializable settings, every field defaulted.
//! - `KeeperContext`: layout + resolved config, the entry point frontends use
//!   to scan, import, and locate the cache.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{self, CacheLocation, DEFAULT_CACHE_PATTERN, DEFAULT_CACHE_SUBDIR};
use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;
use crate::options::FASTMATH_OPTION;
use crate::registry::{KernelRegistry, SourceImporter};
use crate::scanner::{self, ScanOptions, DEFAULT_IGNORE, DEFAULT_MARKER};

/// File name of the project config, relative to the root.
pub const CONFIG_FILE_NAME: &str = "jitkeeper.json";

/// Logical layout of a project on disk.
///
/// This is derived from a chosen root path. It does *not* touch the
/// filesystem.
#[derive(Debug, Clone)]
pub struct KeeperLayout {
    /// Root directory of the project (the directory holding the package).
    pub root: PathBuf,
    /// Path to the project config file (JSON).
    pub config_path: PathBuf,
}

impl KeeperLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let config_path = root.join(CONFIG_FILE_NAME);
        Self { root, config_path }
    }

    /// Resolve a config path that may be relative to the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

/// Where cached artifacts live and how to find site-packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Explicit site-packages root. When absent it is discovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_packages: Option<String>,
    /// Interpreter used to discover site-packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    #[serde(default = "default_cache_subdir")]
    pub subdir: String,
    #[serde(default = "default_cache_pattern")]
    pub pattern: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            site_packages: None,
            python: None,
            subdir: default_cache_subdir(),
            pattern: default_cache_pattern(),
        }
    }
}

/// Serializable configuration for one package.
///
/// This lives (optionally) at `jitkeeper.json` in the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Import name of the package, e.g. `stumpy`.
    pub package: String,
    /// Package source directory relative to the root. Defaults to `package`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_dir: Option<String>,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_required_option")]
    pub required_option: String,
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl KeeperConfig {
    /// Configuration with every default for `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            package_dir: None,
            marker: default_marker(),
            required_option: default_required_option(),
            ignore: default_ignore(),
            cache: CacheConfig::default(),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions { marker: self.marker.clone(), ignore: self.ignore.clone() }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_required_option() -> String {
    FASTMATH_OPTION.to_string()
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()
}

fn default_cache_subdir() -> String {
    DEFAULT_CACHE_SUBDIR.to_string()
}

fn default_cache_pattern() -> String {
    DEFAULT_CACHE_PATTERN.to_string()
}

/// Load the config JSON from disk for a given layout.
pub fn load_config(layout: &KeeperLayout) -> KeeperResult<KeeperConfig> {
    let path = &layout.config_path;
    let json = fs::read_to_string(path).map_err(|e| KeeperError::io(path, e))?;
    serde_json::from_str(&json)
        .map_err(|e| KeeperError::Config { path: path.clone(), message: e.to_string() })
}

/// Infer a package name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `package`.
pub fn infer_package_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("package").to_string()
}

/// Convenience wrapper bundling layout and resolved config.
#[derive(Debug, Clone)]
pub struct KeeperContext {
    pub layout: KeeperLayout,
    pub config: KeeperConfig,
}

impl KeeperContext {
    /// Load `jitkeeper.json` when present, otherwise use defaults with the
    /// package named after the root directory. `package` overrides either.
    pub fn from_root(root: impl AsRef<Path>, package: Option<&str>) -> KeeperResult<Self> {
        let layout = KeeperLayout::new(root);
        let mut config = if layout.config_path.is_file() {
            load_config(&layout)?
        } else {
            KeeperConfig::new(infer_package_name(&layout.root))
        };
        if let Some(package) = package {
            config.package = package.to_string();
        }
        debug!(package = %config.package, root = %layout.root.display(), "loaded context");
        Ok(Self { layout, config })
    }

    /// Directory holding the package's module sources.
    pub fn package_dir(&self) -> PathBuf {
        self.layout.resolve(self.config.package_dir.as_deref().unwrap_or(&self.config.package))
    }

    pub fn scan(&self) -> KeeperResult<Vec<DecoratedFunctionRef>> {
        scanner::scan_with(&self.package_dir(), &self.config.scan_options())
    }

    /// Cache location under the resolved site-packages root.
    ///
    /// `site_packages` takes precedence over the config value.
    pub fn cache_location(&self, site_packages: Option<&Path>) -> KeeperResult<CacheLocation> {
        let configured = self.config.cache.site_packages.as_deref().map(|p| self.layout.resolve(p));
        let root = cache::resolve_site_packages(
            site_packages.or(configured.as_deref()),
            self.config.cache.python.as_deref(),
        )?;
        let dir = root.join(&self.config.package).join(&self.config.cache.subdir);
        Ok(CacheLocation::new(dir, self.config.cache.pattern.clone()))
    }

    /// Registry importing from this package, persisting to `cache_dir`.
    pub fn registry(&self, cache_dir: Option<&Path>) -> KernelRegistry<SourceImporter> {
        let mut importer = SourceImporter::new(self.package_dir(), self.config.marker.clone());
        if let Some(dir) = cache_dir {
            importer = importer.with_cache_dir(dir);
        }
        KernelRegistry::new(importer)
    }
}
