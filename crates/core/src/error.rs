//! Error type shared by every jitkeeper operation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for discovery, audit, registry, and cache operations.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// A module source could not be read or did not parse cleanly.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// One or more discovered kernels lack the required target option.
    ///
    /// Carries every offender so a single run reports the whole batch.
    #[error(
        "Found one or more `@{marker}` functions that are missing the `{option}` flag. \
         The function(s) are:\n {}",
        functions.join(", ")
    )]
    AuditFailure { marker: String, option: String, functions: Vec<String> },

    /// A function named for targeted recompilation is not a discovered kernel.
    #[error("The function `{function}` is not a recognized `@{marker}` function")]
    NotFound { function: String, marker: String },

    /// A module could not be imported into the registry.
    #[error("Failed to import module `{module}`: {message}")]
    Import { module: String, message: String },

    /// The module imported, but has no kernel under the requested name.
    #[error("Module `{module}` has no compiled kernel named `{function}`")]
    Unresolved { module: String, function: String },

    /// A `module.function` reference string was malformed.
    #[error("Invalid function reference '{0}'; expected `module.function`")]
    InvalidReference(String),

    /// A fastmath override value could not be parsed.
    #[error(
        "Invalid fastmath setting '{0}'. Use true, false, or a comma-separated list of: \
         afn, arcp, contract, fast, ninf, nnan, nsz, reassoc"
    )]
    InvalidFastmath(String),

    /// Caching was requested for a kernel that has nowhere to persist artifacts.
    #[error("No cache directory available for `{0}`")]
    NoCacheDir(String),

    /// The site-packages root could not be determined.
    #[error("Could not locate site-packages: {0}")]
    SitePackages(String),

    /// The cache artifact glob was malformed.
    #[error("Invalid cache pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// The jitkeeper config file was unreadable or malformed.
    #[error("Invalid config at {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Underlying filesystem error, tagged with the path involved.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KeeperError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeeperError::Io { path: path.into(), source }
    }
}

/// Convenience result type for jitkeeper operations.
pub type KeeperResult<T> = Result<T, KeeperError>;
