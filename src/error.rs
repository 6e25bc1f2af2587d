// Engine error types — terminal failures only.
//
// `InvalidPost` and numeric-underflow conditions are not represented here:
// they're normalized to skip/default policies inside `model` and `stats`
// rather than surfaced as errors, since they're recoverable per-item
// conditions, not engine-wide failures.

use thiserror::Error;

/// Terminal errors the engine can surface to a caller.
///
/// A terminal error means no `Report` is produced; progress events already
/// emitted remain valid observations of work that happened before the
/// failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("embedding model unavailable: {0}")]
    EmbeddingModelUnavailable(String),

    #[error("embedding output shape mismatch: {0}")]
    EmbeddingShapeMismatch(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
