// store.rs — The object store the policy editor operates against.
//
// The store owns digital objects; each object may carry a stored policy as an
// opaque byte blob plus a set of content-model type tags. Child enumeration
// is lazy so very large hierarchies never have to be materialized up front.

use std::collections::BTreeSet;

use crate::error::RepoError;
use crate::ids::{ObjectId, TypeId};

/// A digital object as loaded from the repository.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: ObjectId,
    /// Content-model tags; drives which child-query providers apply.
    pub type_tags: BTreeSet<TypeId>,
    /// The stored policy bytes, if the object carries a policy.
    pub policy: Option<Vec<u8>>,
}

impl StoredObject {
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            type_tags: BTreeSet::new(),
            policy: None,
        }
    }

    pub fn with_type(mut self, tag: impl Into<TypeId>) -> Self {
        self.type_tags.insert(tag.into());
        self
    }

    pub fn has_type(&self, tag: &TypeId) -> bool {
        self.type_tags.contains(tag)
    }
}

/// How far down the hierarchy a child enumeration reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// All descendants, depth-first.
    Deep,
    /// Immediate children only.
    Shallow,
}

/// The repository the editor loads objects from and writes policies back to.
///
/// Implementations must be shareable across threads: the batch propagator
/// runs on a background task.
pub trait ObjectStore: Send + Sync {
    /// Load an object by id. Missing objects are [`RepoError::NotFound`].
    fn load(&self, id: &ObjectId) -> Result<StoredObject, RepoError>;

    /// Write `bytes` as the stored policy of the given object.
    fn write_policy(&self, id: &ObjectId, bytes: &[u8]) -> Result<(), RepoError>;

    /// Enumerate children of `root` lazily.
    ///
    /// `restrict_to` narrows the result to objects carrying at least one of
    /// the given type tags; `None` means no restriction. The iterator yields
    /// per-object results so one unreadable child does not end the walk.
    fn children(
        &self,
        root: &ObjectId,
        traversal: Traversal,
        restrict_to: Option<&BTreeSet<TypeId>>,
    ) -> Result<Box<dyn Iterator<Item = Result<ObjectId, RepoError>> + Send>, RepoError>;

    /// Count the objects `children` would yield, for batch progress totals.
    fn count_children(
        &self,
        root: &ObjectId,
        traversal: Traversal,
        restrict_to: Option<&BTreeSet<TypeId>>,
    ) -> Result<usize, RepoError> {
        let mut n = 0;
        for item in self.children(root, traversal, restrict_to)? {
            item?;
            n += 1;
        }
        Ok(n)
    }
}
