// staging.rs — Per-session scratch state for datastream filter edits.
//
// Four maps, each keyed by the closed FilterKind enumeration:
// - added:    values staged for addition, carried until removed or committed
// - removed:  values the user asked to remove this cycle, drained on reconcile
// - hidden:   values removed from the document; kept so repeated renders of
//             a round-tripped document do not resurrect them
// - selected: the authoritative "current effective" snapshot, recomputed on
//             every reconciliation and used for both the UI table and commit

use std::collections::{BTreeMap, BTreeSet};

use archon_policy::{FilterKind, PolicyDocument};

/// Staging state for the four filter kinds of one editing session.
#[derive(Debug, Clone, Default)]
pub struct StagingStore {
    added: BTreeMap<FilterKind, BTreeSet<String>>,
    removed: BTreeMap<FilterKind, BTreeSet<String>>,
    hidden: BTreeMap<FilterKind, BTreeSet<String>>,
    selected: BTreeMap<FilterKind, BTreeSet<String>>,
}

impl StagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a value for addition. Duplicate/deny-list checks happen in the
    /// session before this is called.
    pub fn stage_add(&mut self, kind: FilterKind, value: impl Into<String>) {
        self.added.entry(kind).or_default().insert(value.into());
    }

    /// Stage a value for removal in the next reconciliation.
    pub fn stage_remove(&mut self, kind: FilterKind, value: impl Into<String>) {
        self.removed.entry(kind).or_default().insert(value.into());
    }

    /// Values staged for addition but not yet reconciled into `selected`.
    pub fn added(&self, kind: FilterKind) -> &BTreeSet<String> {
        self.added.get(&kind).unwrap_or(empty())
    }

    /// Values hidden from the document (removed, kept from resurrection).
    pub fn hidden(&self, kind: FilterKind) -> &BTreeSet<String> {
        self.hidden.get(&kind).unwrap_or(empty())
    }

    /// The current effective filter set, as of the last reconciliation.
    pub fn selected(&self, kind: FilterKind) -> &BTreeSet<String> {
        self.selected.get(&kind).unwrap_or(empty())
    }

    /// Whether any kind currently has an effective filter.
    pub fn any_selected(&self) -> bool {
        FilterKind::ALL.iter().any(|k| !self.selected(*k).is_empty())
    }

    /// Total number of effective filter rows across all kinds.
    pub fn selected_count(&self) -> usize {
        FilterKind::ALL.iter().map(|k| self.selected(*k).len()).sum()
    }

    /// Reconcile staging against the document. Runs once per interaction
    /// cycle, in fixed order per kind:
    ///
    /// 1. Drain this cycle's removals: a value present in the document moves
    ///    to `hidden`; a value that was only staged for addition simply
    ///    disappears.
    /// 2. Re-assert `hidden` against the document, in case the document
    ///    round-tripped since the value was removed.
    /// 3. Apply staged additions not already present; a re-added value is no
    ///    longer hidden.
    /// 4. Snapshot the document's resulting filter set into `selected`.
    pub fn reconcile(&mut self, doc: &mut PolicyDocument) {
        for kind in FilterKind::ALL {
            let removed = self.removed.remove(&kind).unwrap_or_default();
            for value in removed {
                if doc.remove_filter(kind, &value) {
                    self.hidden.entry(kind).or_default().insert(value.clone());
                }
                if let Some(added) = self.added.get_mut(&kind) {
                    added.remove(&value);
                }
            }

            if let Some(hidden) = self.hidden.get(&kind) {
                for value in hidden {
                    doc.remove_filter(kind, value);
                }
            }

            if let Some(added) = self.added.get(&kind) {
                let staged: Vec<String> = added.iter().cloned().collect();
                for value in staged {
                    doc.add_filter(kind, value.clone());
                    if let Some(hidden) = self.hidden.get_mut(&kind) {
                        hidden.remove(&value);
                    }
                }
            }

            self.selected.insert(kind, doc.filters(kind).clone());
        }
    }
}

fn empty() -> &'static BTreeSet<String> {
    static EMPTY: BTreeSet<String> = BTreeSet::new();
    &EMPTY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(dsids: &[&str]) -> PolicyDocument {
        let mut doc = PolicyDocument::new("obj:1");
        for d in dsids {
            doc.add_filter(FilterKind::Dsid, *d);
        }
        doc
    }

    #[test]
    fn reconcile_snapshots_document_filters() {
        let mut doc = doc_with(&["OCR", "MODS"]);
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);

        let selected: Vec<&String> = staging.selected(FilterKind::Dsid).iter().collect();
        assert_eq!(selected, ["MODS", "OCR"]);
        assert!(staging.selected(FilterKind::Mime).is_empty());
    }

    #[test]
    fn staged_add_lands_in_document_and_selected() {
        let mut doc = doc_with(&[]);
        let mut staging = StagingStore::new();
        staging.stage_add(FilterKind::Mime, "text/plain");
        staging.reconcile(&mut doc);

        assert!(doc.filters(FilterKind::Mime).contains("text/plain"));
        assert!(staging.selected(FilterKind::Mime).contains("text/plain"));
        // The add stays staged across cycles until removed.
        assert!(staging.added(FilterKind::Mime).contains("text/plain"));
    }

    #[test]
    fn removing_a_document_value_hides_it() {
        let mut doc = doc_with(&["OCR"]);
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);

        staging.stage_remove(FilterKind::Dsid, "OCR");
        staging.reconcile(&mut doc);

        assert!(!doc.filters(FilterKind::Dsid).contains("OCR"));
        assert!(staging.hidden(FilterKind::Dsid).contains("OCR"));
        assert!(staging.selected(FilterKind::Dsid).is_empty());
    }

    #[test]
    fn hidden_values_stay_removed_when_the_document_round_trips() {
        let mut doc = doc_with(&["OCR"]);
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);
        staging.stage_remove(FilterKind::Dsid, "OCR");
        staging.reconcile(&mut doc);

        // Simulate the document being reloaded with the original value back.
        doc.add_filter(FilterKind::Dsid, "OCR");
        staging.reconcile(&mut doc);

        assert!(!doc.filters(FilterKind::Dsid).contains("OCR"));
        assert!(staging.selected(FilterKind::Dsid).is_empty());
    }

    #[test]
    fn removing_a_staged_add_just_drops_it() {
        let mut doc = doc_with(&[]);
        let mut staging = StagingStore::new();
        staging.stage_add(FilterKind::Dsid, "TECHMD");
        staging.stage_remove(FilterKind::Dsid, "TECHMD");
        staging.reconcile(&mut doc);

        assert!(staging.added(FilterKind::Dsid).is_empty());
        assert!(staging.selected(FilterKind::Dsid).is_empty());
        // Never persisted, so nothing to hide.
        assert!(staging.hidden(FilterKind::Dsid).is_empty());
    }

    #[test]
    fn readding_a_hidden_value_unhides_it() {
        let mut doc = doc_with(&["OCR"]);
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);
        staging.stage_remove(FilterKind::Dsid, "OCR");
        staging.reconcile(&mut doc);

        staging.stage_add(FilterKind::Dsid, "OCR");
        staging.reconcile(&mut doc);

        assert!(staging.selected(FilterKind::Dsid).contains("OCR"));
        assert!(staging.hidden(FilterKind::Dsid).is_empty());
        assert!(doc.filters(FilterKind::Dsid).contains("OCR"));
    }

    #[test]
    fn added_and_hidden_stay_disjoint() {
        let mut doc = doc_with(&["A", "B"]);
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);
        staging.stage_remove(FilterKind::Dsid, "A");
        staging.stage_add(FilterKind::Dsid, "C");
        staging.reconcile(&mut doc);
        staging.stage_add(FilterKind::Dsid, "A");
        staging.reconcile(&mut doc);

        for kind in FilterKind::ALL {
            assert!(staging.added(kind).is_disjoint(staging.hidden(kind)));
        }
        let selected: Vec<&String> = staging.selected(FilterKind::Dsid).iter().collect();
        assert_eq!(selected, ["A", "B", "C"]);
    }

    #[test]
    fn kinds_reconcile_independently() {
        let mut doc = doc_with(&["OCR"]);
        doc.add_filter(FilterKind::Mime, "text/plain");
        let mut staging = StagingStore::new();
        staging.reconcile(&mut doc);

        staging.stage_remove(FilterKind::Dsid, "OCR");
        staging.stage_add(FilterKind::MimePattern, "image/.*");
        staging.reconcile(&mut doc);

        assert!(staging.selected(FilterKind::Dsid).is_empty());
        assert!(staging.selected(FilterKind::Mime).contains("text/plain"));
        assert!(staging.selected(FilterKind::MimePattern).contains("image/.*"));
        assert_eq!(staging.selected_count(), 2);
    }
}
