// error.rs — Error types for repository collaborators.

use thiserror::Error;

use crate::ids::ObjectId;

/// Errors that can occur when talking to the object store.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The requested object does not exist in the repository.
    #[error("object '{0}' not found")]
    NotFound(ObjectId),

    /// The backend rejected or failed the operation.
    #[error("repository backend error for '{object}': {reason}")]
    Backend { object: ObjectId, reason: String },

    /// An I/O failure underneath the backend.
    #[error("repository i/o error: {0}")]
    Io(#[from] std::io::Error),
}
