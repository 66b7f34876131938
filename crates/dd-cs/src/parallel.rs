use std::num::NonZeroUsize;

use dd_core::DdError;
use tracing::warn;

/// Number of workers this machine can run concurrently (at least 1).
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Resolves the requested worker count against local parallelism.
pub fn resolve_cores(requested: usize) -> Result<usize, DdError> {
    resolve_cores_with(requested, available_cores())
}

/// Resolves `requested` against an explicit `available` count.
///
/// Zero workers is rejected. Requests above `available` are capped to it
/// with a warning.
pub fn resolve_cores_with(requested: usize, available: usize) -> Result<usize, DdError> {
    if requested == 0 {
        return Err(DdError::invalid_config(
            "zero-cores",
            "at least one worker is required",
            "cores",
            requested,
        ));
    }
    let available = available.max(1);
    if requested > available {
        warn!(
            requested,
            available,
            "requested worker count exceeds locally available cores; using all available cores"
        );
        return Ok(available);
    }
    Ok(requested)
}
