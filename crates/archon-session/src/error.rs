// error.rs — Error and warning types for editing sessions.
//
// The split matters: SessionError blocks the caller synchronously (bad
// stored policy, lockout, repository failure), while ValidationWarning is
// surfaced to the user and the rejected operation becomes a no-op.

use thiserror::Error;

use archon_policy::{FilterKind, PolicyError};
use archon_repo::{ObjectId, RepoError};

use crate::lockout::LockoutError;

/// Fatal session errors — these block progress.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The object to edit does not exist; no session opens.
    #[error("object '{0}' not found")]
    NotFound(ObjectId),

    /// The stored policy failed to parse or validate; the session must not
    /// proceed to edit. Reported, not retried.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Commit blocked: the staged rules would lock an identity out.
    #[error("commit blocked by {} lockout error(s)", .0.len())]
    Lockout(Vec<LockoutError>),

    /// A propagation scope key that no provider contributed.
    #[error("unknown propagation scope '{0}'")]
    UnknownScope(String),

    /// The repository collaborator failed.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Non-fatal rejections of a staging operation. The operation does not
/// mutate state; the warning is surfaced for user feedback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    /// Empty or whitespace-only filter value.
    #[error("no {} value entered", .0.label())]
    EmptyValue(FilterKind),

    /// The value is already an applied or staged filter.
    #[error("the {} '{value}' was not added as it already exists as a filter", .kind.label())]
    Duplicate { kind: FilterKind, value: String },

    /// The value is on the admin-configured deny-list.
    #[error("the {} '{value}' was not added as it is restricted by the admin settings", .kind.label())]
    Restricted { kind: FilterKind, value: String },

    /// Remove-selected was invoked with nothing selected.
    #[error("please select the filters you wish to remove")]
    EmptySelection,

    /// A removal row key did not parse as `<kind>---<value>`.
    #[error("unrecognized filter row key '{0}'")]
    UnknownRowKey(String),
}
