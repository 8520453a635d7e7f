// selector.rs — Propagation-scope choices contributed by content-model plugins.
//
// Each registered provider looks at the edited object and contributes zero
// or more keyed QueryChoices. Choices from different providers are merged
// associatively; order of registration does not matter. The implicit
// "newchildren" choice is always available and means "apply to future
// children at ingest" — it never starts a batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use archon_repo::{StoredObject, Traversal, TypeId};

/// The implicit default scope: future children only, applied at ingest.
pub const NEW_CHILDREN_KEY: &str = "newchildren";

/// Conventional key for "every descendant of this object".
pub const ALL_CHILDREN_KEY: &str = "all_children";

/// Derived key for the shallow, collections-only variant of `all_children`.
pub const FLAT_COLLECTION_KEY: &str = "flat_collection";

/// One selectable propagation scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryChoice {
    pub key: String,
    /// Shown in the scope selection menu.
    pub description: String,
    /// Restrict targets to objects carrying one of these type tags.
    /// `None` means unrestricted.
    pub restricted_to_types: Option<std::collections::BTreeSet<TypeId>>,
    pub traversal: Traversal,
}

impl QueryChoice {
    /// An unrestricted deep-traversal choice.
    pub fn deep(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            restricted_to_types: None,
            traversal: Traversal::Deep,
        }
    }
}

/// Per-type provider of propagation scopes.
pub type ChoiceProvider = Box<dyn Fn(&StoredObject) -> BTreeMap<String, QueryChoice> + Send + Sync>;

/// Registry of content-model providers and the merge that aggregates their
/// contributions into one scope menu.
pub struct ChildSelector {
    providers: Vec<(TypeId, ChoiceProvider)>,
    /// The type tag identifying collection objects; used by the derived
    /// `flat_collection` choice.
    collection_type: TypeId,
}

impl ChildSelector {
    pub fn new(collection_type: impl Into<TypeId>) -> Self {
        Self {
            providers: Vec::new(),
            collection_type: collection_type.into(),
        }
    }

    /// Register a provider invoked for objects carrying `type_tag`.
    pub fn register<F>(&mut self, type_tag: impl Into<TypeId>, provider: F)
    where
        F: Fn(&StoredObject) -> BTreeMap<String, QueryChoice> + Send + Sync + 'static,
    {
        self.providers.push((type_tag.into(), Box::new(provider)));
    }

    /// Aggregate choices for one object across all matching providers.
    ///
    /// Colliding keys merge rather than overwrite: type restrictions union
    /// (an unrestricted contribution wins), the first non-empty description
    /// is kept, as is the first traversal. The merge is associative, so
    /// provider order never changes the result.
    ///
    /// Post-merge, an `all_children` contribution derives a
    /// `flat_collection` variant: shallow traversal, restricted to the
    /// collection type. That coupling is deliberate policy carried over from
    /// the original content-model plugins.
    pub fn choices_for(&self, object: &StoredObject) -> BTreeMap<String, QueryChoice> {
        let mut merged: BTreeMap<String, QueryChoice> = BTreeMap::new();

        for (tag, provider) in &self.providers {
            if !object.has_type(tag) {
                continue;
            }
            for (key, choice) in provider(object) {
                merge_choice(&mut merged, key, choice);
            }
        }

        if let Some(all) = merged.get(ALL_CHILDREN_KEY) {
            let mut flat = all.clone();
            flat.key = FLAT_COLLECTION_KEY.to_string();
            flat.description =
                "All immediate children of the collection (shallow traversal)".to_string();
            flat.restricted_to_types =
                Some([self.collection_type.clone()].into_iter().collect());
            flat.traversal = Traversal::Shallow;
            merged.insert(FLAT_COLLECTION_KEY.to_string(), flat);
        }

        merged
    }

    /// The ordered selection menu: the implicit `newchildren` default first,
    /// then the aggregated choices as `(key, description)`.
    pub fn selection_menu(choices: &BTreeMap<String, QueryChoice>) -> Vec<(String, String)> {
        let mut menu = vec![(
            NEW_CHILDREN_KEY.to_string(),
            "New children of this object.".to_string(),
        )];
        menu.extend(
            choices
                .iter()
                .map(|(key, choice)| (key.clone(), choice.description.clone())),
        );
        menu
    }
}

fn merge_choice(merged: &mut BTreeMap<String, QueryChoice>, key: String, incoming: QueryChoice) {
    match merged.get_mut(&key) {
        None => {
            merged.insert(key, incoming);
        }
        Some(existing) => {
            if existing.description.is_empty() {
                existing.description = incoming.description;
            }
            existing.restricted_to_types =
                match (existing.restricted_to_types.take(), incoming.restricted_to_types) {
                    (Some(a), Some(b)) => Some(a.union(&b).cloned().collect()),
                    // Either side unrestricted: the union is unrestricted.
                    _ => None,
                };
        }
    }
}
