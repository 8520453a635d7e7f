//! # archon-policy
//!
//! The policy document attached to a repository object: three rules
//! (viewing, management, datastream) with allowed users/roles, and — for the
//! datastream rule — DSID/MIME filters in four kinds (exact and regex).
//!
//! The document is mutated only through the staging layer in
//! `archon-session` and written back atomically at commit. The on-disk byte
//! format is owned by this crate's serde model; the repository treats it as
//! an opaque blob.
//!
//! ## Key invariants
//!
//! - A rule is *populated* iff it names at least one user, role, or (for the
//!   datastream rule) at least one filter.
//! - At load time `enabled` is normalized to `is_populated()`; the two may
//!   diverge during editing until commit.
//! - Pattern filters must compile as regexes; a document with a malformed
//!   pattern fails to load and the session does not open.

pub mod document;
pub mod error;
pub mod filter;
pub mod restriction;

pub use document::{AccessRule, DatastreamRule, PolicyDocument, RuleKind};
pub use error::PolicyError;
pub use filter::FilterKind;
pub use restriction::RestrictionPolicy;
