//! # archon-repo
//!
//! Collaborator interfaces for the Archon policy editor: the digital-object
//! store the policies live in, and the identity directory the rules refer to.
//!
//! The editing core never talks to a concrete repository. It goes through
//! [`ObjectStore`] and [`IdentityDirectory`], so embedders can plug in their
//! backend while tests use the bundled [`MemoryStore`] / [`MemoryDirectory`].

pub mod directory;
pub mod error;
pub mod ids;
pub mod memory;
pub mod store;

pub use directory::IdentityDirectory;
pub use error::RepoError;
pub use ids::{ObjectId, RoleId, TypeId, UserId};
pub use memory::{MemoryDirectory, MemoryStore};
pub use store::{ObjectStore, StoredObject, Traversal};
