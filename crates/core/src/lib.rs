//! jitkeeper-core
//!
//! Core library for finding `@njit` kernels in a Python package and keeping
//! them in line: auditing their compile options, driving recompilation, and
//! maintaining the persisted compile cache.
//!
//! Discovery is a pure pass over source text. Everything that needs a "live"
//! kernel goes through the [`registry`], which imports modules on demand.
//! Frontends (the CLI) stay thin; all substantive logic lives here so it can
//! be tested without spawning the binary.

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod options;
pub mod registry;
pub mod scanner;

pub use error::{KeeperError, KeeperResult};
pub use model::DecoratedFunctionRef;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
