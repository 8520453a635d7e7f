// document.rs — The in-memory policy document.
//
// One document per repository object, holding the three rules. Loaded from
// stored bytes (or constructed empty for objects without a policy), mutated
// through the staging layer, serialized and written back at commit.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use archon_repo::{ObjectId, RoleId, UserId};

use crate::error::PolicyError;
use crate::filter::FilterKind;

/// The three access dimensions a policy governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Viewing,
    Management,
    Datastream,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RuleKind::Viewing => "viewing",
            RuleKind::Management => "management",
            RuleKind::Datastream => "datastream",
        })
    }
}

/// A viewing- or management-style rule: who is allowed, and whether the
/// restriction is in force.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub enabled: bool,
    pub users: BTreeSet<UserId>,
    pub roles: BTreeSet<RoleId>,
}

impl AccessRule {
    pub fn is_populated(&self) -> bool {
        !self.users.is_empty() || !self.roles.is_empty()
    }

    pub fn clear(&mut self) {
        self.enabled = false;
        self.users.clear();
        self.roles.clear();
    }
}

/// The datastream rule: an access rule plus the four filter sets that scope
/// it to specific sub-resources. Pattern sets hold regex source strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastreamRule {
    #[serde(flatten)]
    pub access: AccessRule,
    pub dsids: BTreeSet<String>,
    pub mime_types: BTreeSet<String>,
    pub dsid_patterns: BTreeSet<String>,
    pub mime_patterns: BTreeSet<String>,
}

impl DatastreamRule {
    pub fn is_populated(&self) -> bool {
        self.access.is_populated() || FilterKind::ALL.iter().any(|k| !self.filters(*k).is_empty())
    }

    pub fn clear(&mut self) {
        self.access.clear();
        for kind in FilterKind::ALL {
            self.filters_mut(kind).clear();
        }
    }

    pub fn filters(&self, kind: FilterKind) -> &BTreeSet<String> {
        match kind {
            FilterKind::Dsid => &self.dsids,
            FilterKind::Mime => &self.mime_types,
            FilterKind::DsidPattern => &self.dsid_patterns,
            FilterKind::MimePattern => &self.mime_patterns,
        }
    }

    pub fn filters_mut(&mut self, kind: FilterKind) -> &mut BTreeSet<String> {
        match kind {
            FilterKind::Dsid => &mut self.dsids,
            FilterKind::Mime => &mut self.mime_types,
            FilterKind::DsidPattern => &mut self.dsid_patterns,
            FilterKind::MimePattern => &mut self.mime_patterns,
        }
    }
}

/// A complete policy document for one repository object.
///
/// Document identity is the owning object's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub object_id: ObjectId,
    pub viewing: AccessRule,
    pub management: AccessRule,
    pub datastream: DatastreamRule,
}

impl PolicyDocument {
    /// An empty document for an object that has no stored policy yet.
    pub fn new(object_id: impl Into<ObjectId>) -> Self {
        Self {
            object_id: object_id.into(),
            viewing: AccessRule::default(),
            management: AccessRule::default(),
            datastream: DatastreamRule::default(),
        }
    }

    /// Load a document from stored bytes.
    ///
    /// The document follows the object it is attached to, so `object_id`
    /// overrides whatever identity the bytes carry. Structural validation
    /// runs before the document is handed out; `enabled` is normalized to
    /// `is_populated()` per rule.
    pub fn load(object_id: impl Into<ObjectId>, bytes: &[u8]) -> Result<Self, PolicyError> {
        let object_id = object_id.into();
        let mut doc: PolicyDocument =
            serde_json::from_slice(bytes).map_err(|e| PolicyError::Parse {
                object: object_id.clone(),
                reason: e.to_string(),
            })?;
        doc.object_id = object_id;
        doc.validate()?;
        doc.viewing.enabled = doc.viewing.is_populated();
        doc.management.enabled = doc.management.is_populated();
        doc.datastream.access.enabled = doc.datastream.is_populated();
        tracing::debug!(object = %doc.object_id, "loaded policy document");
        Ok(doc)
    }

    /// Check that every pattern filter compiles. Fail-closed: a document
    /// with a malformed pattern never reaches the editor.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for kind in [FilterKind::DsidPattern, FilterKind::MimePattern] {
            for pattern in self.datastream.filters(kind) {
                Regex::new(pattern).map_err(|e| PolicyError::Validation {
                    rule: RuleKind::Datastream,
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    pub fn rule(&self, kind: RuleKind) -> &AccessRule {
        match kind {
            RuleKind::Viewing => &self.viewing,
            RuleKind::Management => &self.management,
            RuleKind::Datastream => &self.datastream.access,
        }
    }

    pub fn rule_mut(&mut self, kind: RuleKind) -> &mut AccessRule {
        match kind {
            RuleKind::Viewing => &mut self.viewing,
            RuleKind::Management => &mut self.management,
            RuleKind::Datastream => &mut self.datastream.access,
        }
    }

    pub fn is_populated(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::Viewing => self.viewing.is_populated(),
            RuleKind::Management => self.management.is_populated(),
            RuleKind::Datastream => self.datastream.is_populated(),
        }
    }

    /// Reset a rule to empty before re-population from staged values. This
    /// guarantees the written document never carries stale values from a
    /// previous edit round.
    pub fn clear(&mut self, kind: RuleKind) {
        match kind {
            RuleKind::Viewing => self.viewing.clear(),
            RuleKind::Management => self.management.clear(),
            RuleKind::Datastream => self.datastream.clear(),
        }
    }

    pub fn add_users(&mut self, kind: RuleKind, users: impl IntoIterator<Item = UserId>) {
        self.rule_mut(kind).users.extend(users);
    }

    pub fn add_roles(&mut self, kind: RuleKind, roles: impl IntoIterator<Item = RoleId>) {
        self.rule_mut(kind).roles.extend(roles);
    }

    pub fn filters(&self, kind: FilterKind) -> &BTreeSet<String> {
        self.datastream.filters(kind)
    }

    /// Add a datastream filter. Returns false if it was already present.
    pub fn add_filter(&mut self, kind: FilterKind, value: impl Into<String>) -> bool {
        self.datastream.filters_mut(kind).insert(value.into())
    }

    /// Remove a datastream filter. Returns false if it was not present.
    pub fn remove_filter(&mut self, kind: FilterKind, value: &str) -> bool {
        self.datastream.filters_mut(kind).remove(value)
    }

    /// Serialize for write-back. Output is deterministic (sorted sets,
    /// pretty JSON) so unchanged documents produce identical bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec_pretty(self).map_err(|e| PolicyError::Serialize {
            object: self.object_id.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_populated_rules() {
        let doc = PolicyDocument::new("obj:1");
        assert!(!doc.is_populated(RuleKind::Viewing));
        assert!(!doc.is_populated(RuleKind::Management));
        assert!(!doc.is_populated(RuleKind::Datastream));
    }

    #[test]
    fn filters_alone_populate_the_datastream_rule() {
        let mut doc = PolicyDocument::new("obj:1");
        doc.add_filter(FilterKind::Dsid, "OCR");
        assert!(doc.is_populated(RuleKind::Datastream));
        assert!(!doc.is_populated(RuleKind::Management));
    }

    #[test]
    fn load_normalizes_enabled_to_populated() {
        let mut doc = PolicyDocument::new("obj:1");
        doc.add_users(RuleKind::Management, [UserId::new("admin")]);
        // Stored with enabled = false; load flips it to match population.
        let bytes = doc.serialize().unwrap();
        let loaded = PolicyDocument::load("obj:1", &bytes).unwrap();
        assert!(loaded.management.enabled);
        assert!(!loaded.viewing.enabled);
    }

    #[test]
    fn load_keeps_the_owning_object_identity() {
        let doc = PolicyDocument::new("obj:1");
        let bytes = doc.serialize().unwrap();
        let loaded = PolicyDocument::load("obj:2", &bytes).unwrap();
        assert_eq!(loaded.object_id, ObjectId::new("obj:2"));
    }

    #[test]
    fn garbage_bytes_fail_with_parse_error() {
        let result = PolicyDocument::load("obj:1", b"not json");
        assert!(matches!(result, Err(PolicyError::Parse { .. })));
    }

    #[test]
    fn malformed_pattern_fails_validation_on_load() {
        let mut doc = PolicyDocument::new("obj:1");
        doc.add_filter(FilterKind::DsidPattern, "TECH(");
        let bytes = doc.serialize().unwrap();
        let result = PolicyDocument::load("obj:1", &bytes);
        assert!(matches!(result, Err(PolicyError::Validation { .. })));
    }

    #[test]
    fn clear_resets_all_datastream_state() {
        let mut doc = PolicyDocument::new("obj:1");
        doc.add_users(RuleKind::Datastream, [UserId::new("alice")]);
        doc.add_filter(FilterKind::Mime, "text/plain");
        doc.add_filter(FilterKind::MimePattern, "image/.*");
        doc.clear(RuleKind::Datastream);
        assert!(!doc.is_populated(RuleKind::Datastream));
        for kind in FilterKind::ALL {
            assert!(doc.filters(kind).is_empty());
        }
    }

    #[test]
    fn serialize_is_deterministic() {
        let mut doc = PolicyDocument::new("obj:1");
        doc.add_filter(FilterKind::Dsid, "OCR");
        doc.add_filter(FilterKind::Dsid, "MODS");
        doc.add_users(RuleKind::Viewing, [UserId::new("bob"), UserId::new("alice")]);
        assert_eq!(doc.serialize().unwrap(), doc.serialize().unwrap());
    }

    #[test]
    fn add_filter_reports_duplicates() {
        let mut doc = PolicyDocument::new("obj:1");
        assert!(doc.add_filter(FilterKind::Dsid, "OCR"));
        assert!(!doc.add_filter(FilterKind::Dsid, "OCR"));
        assert!(doc.remove_filter(FilterKind::Dsid, "OCR"));
        assert!(!doc.remove_filter(FilterKind::Dsid, "OCR"));
    }
}
