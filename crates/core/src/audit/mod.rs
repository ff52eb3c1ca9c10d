//! Flag audit over discovered kernels.
//!
//! Every kernel must set the required target option (by default `fastmath`).
//! The audit is a batch: all kernels are checked before anything is
//! reported, so one run names every offender.

use tracing::{debug, info};

use crate::error::{KeeperError, KeeperResult};
use crate::model::DecoratedFunctionRef;
use crate::registry::KernelResolver;

/// Return `module.function` for every kernel missing `required_option`.
///
/// A kernel whose marker passes `**mapping` is given the benefit of the
/// doubt, since the mapping is only known at runtime. Import and resolution errors abort the audit unchanged.
pub fn find_violations<R: KernelResolver + ?Sized>(
    refs: &[DecoratedFunctionRef],
    resolver: &mut R,
    required_option: &str,
) -> KeeperResult<Vec<String>> {
    let mut missing = Vec::new();
    for reference in refs {
        let kernel = resolver.resolve(reference)?;
        if !kernel.target_options().may_set(required_option) {
            debug!(kernel = %reference, option = required_option, "missing target option");
            missing.push(reference.qualified_name());
        }
    }
    Ok(missing)
}

/// Fail with [`KeeperError::AuditFailure`] when any kernel lacks the option.
pub fn audit<R: KernelResolver + ?Sized>(
    refs: &[DecoratedFunctionRef],
    resolver: &mut R,
    marker: &str,
    required_option: &str,
) -> KeeperResult<()> {
    let missing = find_violations(refs, resolver, required_option)?;
    if !missing.is_empty() {
        return Err(KeeperError::AuditFailure {
            marker: marker.to_string(),
            option: required_option.to_string(),
            functions: missing,
        });
    }
    info!(kernels = refs.len(), option = required_option, "audit passed");
    Ok(())
}
