// error.rs — Error types for batch propagation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use archon_repo::{ObjectId, RepoError};

/// A failure against one propagation target. Accumulated into the batch
/// report; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropagationError {
    /// The target vanished between enumeration and write.
    #[error("target object '{object}' not found")]
    NotFound { object: ObjectId },

    /// The policy write failed for this target.
    #[error("failed to write policy to '{object}': {reason}")]
    Write { object: ObjectId, reason: String },

    /// Enumerating targets failed; the batch ends with what it has.
    #[error("target enumeration failed: {reason}")]
    Enumeration { reason: String },
}

impl PropagationError {
    /// Map a repository error for one target into the batch taxonomy.
    pub fn from_repo(object: &ObjectId, err: RepoError) -> Self {
        match err {
            RepoError::NotFound(object) => PropagationError::NotFound { object },
            other => PropagationError::Write {
                object: object.clone(),
                reason: other.to_string(),
            },
        }
    }
}

/// Errors joining a batch task.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch was aborted before completion. Targets written before the
    /// abort keep their new policy; there is no rollback.
    #[error("batch was aborted before completion")]
    Aborted,

    /// The batch task panicked.
    #[error("batch task panicked: {0}")]
    Panicked(String),
}
