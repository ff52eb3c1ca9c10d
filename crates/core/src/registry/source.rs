//! Importer that builds kernels straight from module source.
//!
//! Importing a module parses `<package_dir>/<module>.py` and registers a
//! [`SourceKernel`] for every top-level marked function. Target options come
//! from the marker's keyword arguments, the same place the JIT framework
//! takes them from. No code is generated: recompiling snapshots the options
//! and, with caching on, persists index and data artifacts in the cache dir.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;
use crate::options::{self, OptionValue, TargetOptions, CACHE_OPTION};
use crate::registry::{Kernel, ModuleImporter};
use crate::scanner::syntax;

/// Contents of a kernel's `.nbi` index artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    pub function: String,
    pub line: usize,
    pub generation: u32,
    pub target_options: TargetOptions,
}

/// Imports modules of one package directory.
#[derive(Debug, Clone)]
pub struct SourceImporter {
    package_dir: PathBuf,
    marker: String,
    cache_dir: Option<PathBuf>,
}

impl SourceImporter {
    pub fn new(package_dir: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self { package_dir: package_dir.into(), marker: marker.into(), cache_dir: None }
    }

    /// Directory where kernels persist cache artifacts.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

impl ModuleImporter for SourceImporter {
    fn import(&self, module: &str) -> KeeperResult<Vec<Box<dyn Kernel>>> {
        let path = self.package_dir.join(format!("{module}.py"));
        if !path.is_file() {
            return Err(KeeperError::Import {
                module: module.to_string(),
                message: format!("no module source at {}", path.display()),
            });
        }
        let source = fs::read_to_string(&path).map_err(|e| KeeperError::Import {
            module: module.to_string(),
            message: e.to_string(),
        })?;
        let tree = syntax::parse_python(&source)
            .map_err(|message| KeeperError::Import { module: module.to_string(), message })?;
        let root = tree.root();

        let mut kernels: Vec<Box<dyn Kernel>> = Vec::new();
        for marked in syntax::marked_functions(&root, &self.marker) {
            let options: TargetOptions = syntax::keyword_arguments(&marked.decorator)
                .into_iter()
                .map(|(name, value)| (name, options::evaluate(&value)))
                .collect();
            let reference = DecoratedFunctionRef::new(module, marked.name);
            debug!(kernel = %reference, options = options.len(), "registered kernel");
            kernels.push(Box::new(SourceKernel::new(
                reference,
                marked.line,
                options,
                self.cache_dir.clone(),
            )));
        }
        Ok(kernels)
    }
}

/// Kernel backed by its decorator's source text.
#[derive(Debug, Clone)]
pub struct SourceKernel {
    reference: DecoratedFunctionRef,
    line: usize,
    options: TargetOptions,
    cache_dir: Option<PathBuf>,
    caching: bool,
    generation: u32,
    compiled: Option<TargetOptions>,
}

impl SourceKernel {
    /// Caching starts on when the decorator asks for it or an index artifact
    /// from an earlier run is present.
    pub fn new(
        reference: DecoratedFunctionRef,
        line: usize,
        options: TargetOptions,
        cache_dir: Option<PathBuf>,
    ) -> Self {
        let mut kernel = Self {
            reference,
            line,
            options,
            cache_dir,
            caching: false,
            generation: 0,
            compiled: None,
        };
        let requested = kernel.options.get(CACHE_OPTION) == Some(&OptionValue::Bool(true));
        let persisted = kernel.index_path().is_some_and(|p| p.is_file());
        kernel.caching = kernel.cache_dir.is_some() && (requested || persisted);
        kernel
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn caching_enabled(&self) -> bool {
        self.caching
    }

    /// Number of recompilations performed in this process.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Options in effect at the last recompilation.
    pub fn compiled_options(&self) -> Option<&TargetOptions> {
        self.compiled.as_ref()
    }

    /// `<module>.<function>-<line>`, shared by both artifacts.
    fn artifact_stem(&self) -> String {
        format!("{}-{}", self.reference.qualified_name(), self.line)
    }

    pub fn index_path(&self) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        Some(dir.join(format!("{}.nbi", self.artifact_stem())))
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        Some(dir.join(format!("{}.nbc", self.artifact_stem())))
    }

    fn write_artifact(&self, path: &Path, options: &TargetOptions) -> KeeperResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KeeperError::io(parent, e))?;
        }
        let index = CacheIndex {
            function: self.reference.qualified_name(),
            line: self.line,
            generation: self.generation,
            target_options: options.clone(),
        };
        let json = serde_json::to_string_pretty(&index).map_err(|e| {
            KeeperError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        fs::write(path, json).map_err(|e| KeeperError::io(path, e))
    }
}

impl Kernel for SourceKernel {
    fn reference(&self) -> &DecoratedFunctionRef {
        &self.reference
    }

    fn target_options(&self) -> &TargetOptions {
        &self.options
    }

    fn target_options_mut(&mut self) -> &mut TargetOptions {
        &mut self.options
    }

    fn enable_caching(&mut self) -> KeeperResult<()> {
        let index = self
            .index_path()
            .ok_or_else(|| KeeperError::NoCacheDir(self.reference.qualified_name()))?;
        self.write_artifact(&index, &self.options)?;
        self.caching = true;
        Ok(())
    }

    fn recompile(&mut self) -> KeeperResult<()> {
        self.generation += 1;
        self.compiled = Some(self.options.clone());
        debug!(kernel = %self.reference, generation = self.generation, "recompiled kernel");

        if self.caching {
            if let (Some(index), Some(data)) = (self.index_path(), self.data_path()) {
                self.write_artifact(&index, &self.options)?;
                self.write_artifact(&data, &self.options)?;
            }
        }
        Ok(())
    }
}
