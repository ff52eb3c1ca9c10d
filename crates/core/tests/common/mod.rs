#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use jitkeeper_core::options::{OptionValue, TargetOptions};
use jitkeeper_core::registry::{Kernel, KernelResolver};
use jitkeeper_core::{DecoratedFunctionRef, KeeperError, KeeperResult};

/// Lifecycle calls observed on a [`RecordingKernel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    EnableCaching(String),
    /// Kernel name and the options in effect when recompilation started.
    Recompile(String, TargetOptions),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// In-memory kernel that logs every lifecycle call.
pub struct RecordingKernel {
    reference: DecoratedFunctionRef,
    options: TargetOptions,
    log: EventLog,
}

impl Kernel for RecordingKernel {
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
        self.log.borrow_mut().push(Event::EnableCaching(self.reference.qualified_name()));
        Ok(())
    }

    fn recompile(&mut self) -> KeeperResult<()> {
        self.log
            .borrow_mut()
            .push(Event::Recompile(self.reference.qualified_name(), self.options.clone()));
        Ok(())
    }
}

/// Resolver over a fixed set of recording kernels.
#[derive(Default)]
pub struct MapResolver {
    kernels: HashMap<DecoratedFunctionRef, RecordingKernel>,
    pub log: EventLog,
    pub resolved: Vec<DecoratedFunctionRef>,
}

impl MapResolver {
    pub fn add(&mut self, module: &str, function: &str, options: &[(&str, OptionValue)]) -> DecoratedFunctionRef {
        let reference = DecoratedFunctionRef::new(module, function);
        let options: TargetOptions =
            options.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        self.kernels.insert(
            reference.clone(),
            RecordingKernel { reference: reference.clone(), options, log: Rc::clone(&self.log) },
        );
        reference
    }

    pub fn options(&self, reference: &DecoratedFunctionRef) -> &TargetOptions {
        &self.kernels[reference].options
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }
}

impl KernelResolver for MapResolver {
    fn resolve(&mut self, reference: &DecoratedFunctionRef) -> KeeperResult<&mut dyn Kernel> {
        self.resolved.push(reference.clone());
        match self.kernels.get_mut(reference) {
            Some(kernel) => Ok(kernel),
            None => Err(KeeperError::Unresolved {
                module: reference.module.clone(),
                function: reference.function.clone(),
            }),
        }
    }
}
