//! # archon-session
//!
//! The staged-edit state machine at the heart of the policy editor.
//!
//! A [`Session`] exclusively owns the edit state for one object: the loaded
//! [`PolicyDocument`](archon_policy::PolicyDocument), the [`StagingStore`]
//! tracking pending filter additions/removals, and the staged rule edits.
//! Every interaction reconciles staging against the document, so the
//! "current effective" filter set is always derivable; commit is gated by
//! the [`LockoutValidator`] so an editor can never write a policy that locks
//! the admin — or themselves — out of the object.
//!
//! ## Key invariants
//!
//! - After every reconciliation, `selected[k] = (document[k] ∪ added[k]) −
//!   hidden[k]` for each filter kind, and `added[k] ∩ hidden[k] = ∅`.
//! - Rejected staging operations (duplicates, deny-listed or empty values,
//!   empty removal selections) are warnings and never mutate state.
//! - Commit clears each rule and repopulates it from staged values, so a
//!   written document never carries stale values from a previous round.

pub mod error;
pub mod lockout;
pub mod session;
pub mod staging;

pub use error::{SessionError, ValidationWarning};
pub use lockout::{LockoutError, LockoutValidator, Trigger};
pub use session::{CommitOutcome, FilterRow, Session};
pub use staging::StagingStore;
