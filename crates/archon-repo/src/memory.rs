// memory.rs — In-memory store and directory.
//
// Backs the workspace's tests and doubles as a reference implementation for
// embedders. Objects live in a mutex-guarded map with explicit parent→child
// edges; `fail_writes_for` lets tests exercise per-target batch failures.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::directory::{IdentityDirectory, ANONYMOUS_USER};
use crate::error::RepoError;
use crate::ids::{ObjectId, RoleId, TypeId, UserId};
use crate::store::{ObjectStore, StoredObject, Traversal};

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectId, StoredObject>,
    children: BTreeMap<ObjectId, Vec<ObjectId>>,
    failing_writes: BTreeSet<ObjectId>,
}

/// In-memory [`ObjectStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn put(&self, object: StoredObject) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.objects.insert(object.id.clone(), object);
    }

    /// Record a parent→child edge. Both objects should already exist.
    pub fn link(&self, parent: &ObjectId, child: &ObjectId) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .children
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
    }

    /// Make every subsequent `write_policy` against `id` fail.
    pub fn fail_writes_for(&self, id: &ObjectId) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.failing_writes.insert(id.clone());
    }

    /// The stored policy bytes of an object, if any.
    pub fn policy_of(&self, id: &ObjectId) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.objects.get(id).and_then(|o| o.policy.clone())
    }

    fn collect(
        &self,
        root: &ObjectId,
        traversal: Traversal,
        restrict_to: Option<&BTreeSet<TypeId>>,
        out: &mut Vec<ObjectId>,
    ) {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut stack: Vec<ObjectId> = inner
            .children
            .get(root)
            .map(|c| c.iter().rev().cloned().collect())
            .unwrap_or_default();

        while let Some(id) = stack.pop() {
            let matches = match restrict_to {
                Some(tags) => inner
                    .objects
                    .get(&id)
                    .is_some_and(|o| tags.iter().any(|t| o.has_type(t))),
                None => true,
            };
            if matches {
                out.push(id.clone());
            }
            if traversal == Traversal::Deep {
                if let Some(grandchildren) = inner.children.get(&id) {
                    stack.extend(grandchildren.iter().rev().cloned());
                }
            }
        }
    }
}

impl ObjectStore for MemoryStore {
    fn load(&self, id: &ObjectId) -> Result<StoredObject, RepoError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .objects
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    fn write_policy(&self, id: &ObjectId, bytes: &[u8]) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.failing_writes.contains(id) {
            return Err(RepoError::Backend {
                object: id.clone(),
                reason: "write rejected".to_string(),
            });
        }
        match inner.objects.get_mut(id) {
            Some(object) => {
                object.policy = Some(bytes.to_vec());
                Ok(())
            }
            None => Err(RepoError::NotFound(id.clone())),
        }
    }

    fn children(
        &self,
        root: &ObjectId,
        traversal: Traversal,
        restrict_to: Option<&BTreeSet<TypeId>>,
    ) -> Result<Box<dyn Iterator<Item = Result<ObjectId, RepoError>> + Send>, RepoError> {
        // The in-memory tree is small; eagerly walking it here keeps the
        // iterator free of lock lifetimes. Real backends page lazily.
        let mut ids = Vec::new();
        self.collect(root, traversal, restrict_to, &mut ids);
        Ok(Box::new(ids.into_iter().map(Ok)))
    }
}

/// In-memory [`IdentityDirectory`] with a fixed user and role list.
pub struct MemoryDirectory {
    users: Vec<(UserId, String)>,
    roles: Vec<(RoleId, String)>,
    admin: UserId,
}

impl MemoryDirectory {
    /// Build a directory with the given admin plus the anonymous identity.
    pub fn new(admin: impl Into<UserId>) -> Self {
        let admin = admin.into();
        Self {
            users: vec![
                (UserId::new(ANONYMOUS_USER), ANONYMOUS_USER.to_string()),
                (admin.clone(), admin.to_string()),
            ],
            roles: Vec::new(),
            admin,
        }
    }

    pub fn with_user(mut self, id: impl Into<UserId>, display: impl Into<String>) -> Self {
        self.users.push((id.into(), display.into()));
        self
    }

    pub fn with_role(mut self, id: impl Into<RoleId>, label: impl Into<String>) -> Self {
        self.roles.push((id.into(), label.into()));
        self
    }
}

impl IdentityDirectory for MemoryDirectory {
    fn users(&self) -> Vec<(UserId, String)> {
        self.users.clone()
    }

    fn roles(&self) -> Vec<(RoleId, String)> {
        self.roles.clone()
    }

    fn admin_user(&self) -> UserId {
        self.admin.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_tree() -> MemoryStore {
        // root ─┬─ a ─── a1
        //       └─ b
        let store = MemoryStore::new();
        store.put(StoredObject::new("root").with_type("collection"));
        store.put(StoredObject::new("a").with_type("collection"));
        store.put(StoredObject::new("a1").with_type("item"));
        store.put(StoredObject::new("b").with_type("item"));
        store.link(&"root".into(), &"a".into());
        store.link(&"root".into(), &"b".into());
        store.link(&"a".into(), &"a1".into());
        store
    }

    #[test]
    fn load_missing_object_is_not_found() {
        let store = MemoryStore::new();
        let result = store.load(&"obj:404".into());
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[test]
    fn write_policy_round_trips() {
        let store = MemoryStore::new();
        store.put(StoredObject::new("obj:1"));
        store.write_policy(&"obj:1".into(), b"bytes").unwrap();
        assert_eq!(store.policy_of(&"obj:1".into()), Some(b"bytes".to_vec()));
    }

    #[test]
    fn deep_traversal_reaches_grandchildren() {
        let store = store_with_tree();
        let ids: Vec<ObjectId> = store
            .children(&"root".into(), Traversal::Deep, None)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(ids, vec!["a".into(), "a1".into(), "b".into()]);
    }

    #[test]
    fn shallow_traversal_stops_at_children() {
        let store = store_with_tree();
        let ids: Vec<ObjectId> = store
            .children(&"root".into(), Traversal::Shallow, None)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(ids, vec!["a".into(), "b".into()]);
    }

    #[test]
    fn type_restriction_filters_children() {
        let store = store_with_tree();
        let tags: BTreeSet<TypeId> = [TypeId::new("collection")].into_iter().collect();
        let ids: Vec<ObjectId> = store
            .children(&"root".into(), Traversal::Deep, Some(&tags))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(ids, vec!["a".into()]);
    }

    #[test]
    fn count_matches_enumeration() {
        let store = store_with_tree();
        assert_eq!(
            store
                .count_children(&"root".into(), Traversal::Deep, None)
                .unwrap(),
            3
        );
    }

    #[test]
    fn failing_write_surfaces_backend_error() {
        let store = MemoryStore::new();
        store.put(StoredObject::new("obj:1"));
        store.fail_writes_for(&"obj:1".into());
        let result = store.write_policy(&"obj:1".into(), b"x");
        assert!(matches!(result, Err(RepoError::Backend { .. })));
    }

    #[test]
    fn directory_includes_anonymous_and_admin() {
        let dir = MemoryDirectory::new("admin").with_user("alice", "Alice");
        let users: Vec<String> = dir.users().into_iter().map(|(id, _)| id.0).collect();
        assert!(users.contains(&ANONYMOUS_USER.to_string()));
        assert!(users.contains(&"admin".to_string()));
        assert_eq!(dir.admin_user(), UserId::new("admin"));
    }
}
