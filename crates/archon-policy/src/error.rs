// error.rs — Error types for the policy document model.

use thiserror::Error;

use archon_repo::ObjectId;

use crate::document::RuleKind;

/// Errors that can occur loading, validating, or serializing a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The stored policy bytes are not a well-formed document.
    /// Fatal to the editing session: it must not open.
    #[error("failed to parse stored policy for '{object}': {reason}")]
    Parse { object: ObjectId, reason: String },

    /// A rule failed structural validation (e.g., a malformed pattern).
    #[error("invalid {rule} rule: pattern '{pattern}' does not compile: {reason}")]
    Validation {
        rule: RuleKind,
        pattern: String,
        reason: String,
    },

    /// The document could not be serialized for write-back.
    #[error("failed to serialize policy for '{object}': {reason}")]
    Serialize { object: ObjectId, reason: String },
}
