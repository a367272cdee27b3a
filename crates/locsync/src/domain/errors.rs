//! Failure modes that terminate a reconciliation batch.

use thiserror::Error;

use crate::infra::host::HostError;

/// Errors that abort reconciliation as a whole.
///
/// Failures scoped to a single record never surface here; they are captured
/// as outcomes so the rest of the batch can proceed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No valid container was designated. Nothing has been written when this
    /// is returned.
    #[error("select a frame, section, component, group, or instance first")]
    InvalidRoot,
    /// The variable store failed outside the per-record guard; remaining
    /// records were not processed.
    #[error("variable store failure: {0}")]
    Store(#[from] HostError),
}
