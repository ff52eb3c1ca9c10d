//! Core data model: identifiers for statically discovered kernels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeeperError;

/// Names a function discovered by the scanner as `(module, function)`.
///
/// This is a lightweight key, not a resource: it is produced by the scanner
/// and consumed by the auditor and the cache maintainer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecoratedFunctionRef {
    pub module: String,
    pub function: String,
}

impl DecoratedFunctionRef {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self { module: module.into(), function: function.into() }
    }

    /// `module.function`, the form used in reports and on the command line.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }
}

impl fmt::Display for DecoratedFunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

impl FromStr for DecoratedFunctionRef {
    type Err = KeeperError;

    /// Parse `module.function`. Modules are top-level, so the split happens at
    /// the first dot and the function part must not contain another one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('.') {
            Some((module, function))
                if !module.is_empty() && !function.is_empty() && !function.contains('.') =>
            {
                Ok(Self::new(module, function))
            }
            _ => Err(KeeperError::InvalidReference(s.to_string())),
        }
    }
}
