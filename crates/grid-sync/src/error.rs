use grid_model::StoreError;
use thiserror::Error;

/// Failure taxonomy at the synchronization boundary.
///
/// Every mutation failure is caught at the pipeline boundary and resolved
/// into a rollback; none of these variants leaves the local store in a
/// half-applied state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Entity missing server-side or not owned by the caller.
    #[error("entity not found")]
    NotFound,
    /// Bad shape or range (e.g. column width out of bounds, page too large).
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// Entity changed unexpectedly between read and write. Handled like any
    /// other failure: rollback, then the reconciling refetch pulls truth.
    #[error("conflict: entity changed between read and write")]
    Conflict,
    #[error("network failure: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    /// Server-side bulk insert aborted.
    #[error("bulk job failed: {0}")]
    JobFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
