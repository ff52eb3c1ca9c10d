//! Registry of live kernels.
//!
//! A statically discovered [`DecoratedFunctionRef`] only names a function.
//! To audit or recompile it we need the compiled kernel: its mutable target
//! options and its lifecycle operations. Modules are imported through a
//! [`ModuleImporter`] the first time one of their kernels is requested, and
//! stay loaded for the rest of the process.

pub mod source;

use std::collections::HashMap;

use tracing::debug;

use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;
use crate::options::TargetOptions;

pub use source::{CacheIndex, SourceImporter, SourceKernel};

/// A compiled, decorated function owned by the registry.
pub trait Kernel {
    fn reference(&self) -> &DecoratedFunctionRef;

    fn target_options(&self) -> &TargetOptions;

    fn target_options_mut(&mut self) -> &mut TargetOptions;

    /// Switch on persistent caching of compiled code.
    fn enable_caching(&mut self) -> KeeperResult<()>;

    /// Recompile with the current target options. Blocks until done.
    fn recompile(&mut self) -> KeeperResult<()>;
}

/// Loads every kernel defined by a module.
pub trait ModuleImporter {
    fn import(&self, module: &str) -> KeeperResult<Vec<Box<dyn Kernel>>>;
}

/// Turns a discovered ref into its live kernel.
pub trait KernelResolver {
    fn resolve(&mut self, reference: &DecoratedFunctionRef) -> KeeperResult<&mut dyn Kernel>;
}

/// Module table plus the importer that fills it.
pub struct KernelRegistry<I> {
    importer: I,
    modules: HashMap<String, HashMap<String, Box<dyn Kernel>>>,
}

impl<I: ModuleImporter> KernelRegistry<I> {
    pub fn new(importer: I) -> Self {
        Self { importer, modules: HashMap::new() }
    }

    pub fn importer(&self) -> &I {
        &self.importer
    }

    /// Whether `module` has already been imported in this process.
    pub fn is_loaded(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    fn load(&mut self, module: &str) -> KeeperResult<()> {
        if self.modules.contains_key(module) {
            return Ok(());
        }
        let kernels = self.importer.import(module)?;
        debug!(module, kernels = kernels.len(), "imported module");
        // Later definitions shadow earlier ones, as rebinding a name would.
        let table: HashMap<String, Box<dyn Kernel>> =
            kernels.into_iter().map(|k| (k.reference().function.clone(), k)).collect();
        self.modules.insert(module.to_string(), table);
        Ok(())
    }
}

impl<I: ModuleImporter> KernelResolver for KernelRegistry<I> {
    fn resolve(&mut self, reference: &DecoratedFunctionRef) -> KeeperResult<&mut dyn Kernel> {
        self.load(&reference.module)?;
        match self.modules.get_mut(&reference.module).and_then(|t| t.get_mut(&reference.function))
        {
            Some(kernel) => Ok(kernel.as_mut()),
            None => Err(KeeperError::Unresolved {
                module: reference.module.clone(),
                function: reference.function.clone(),
            }),
        }
    }
}
