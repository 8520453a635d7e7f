// session.rs — The editing session for one object's policy.
//
// A session exclusively owns the edit state between open and commit: the
// loaded document, the staging store, staged copies of the three rules, and
// the chosen propagation scope. Every staging operation reconciles before
// returning, so callers always observe the current effective filter set.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use archon_policy::{
    AccessRule, FilterKind, PolicyDocument, RestrictionPolicy, RuleKind,
};
use archon_propagate::{
    BatchHandle, BatchJob, BatchPropagator, ChildSelector, QueryChoice, NEW_CHILDREN_KEY,
};
use archon_repo::{IdentityDirectory, ObjectId, ObjectStore, RepoError, RoleId, UserId};

use crate::error::{SessionError, ValidationWarning};
use crate::lockout::{LockoutError, LockoutValidator, Trigger};
use crate::staging::StagingStore;

/// Separator between the kind token and the value in a filter row key.
const ROW_KEY_SEPARATOR: &str = "---";

/// One row of the current-filters table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRow {
    pub kind: FilterKind,
    pub value: String,
}

impl FilterRow {
    /// Stable row key, `<kind>---<value>`, accepted back by
    /// [`Session::stage_remove_selected`].
    pub fn key(&self) -> String {
        format!("{}{}{}", self.kind.as_str(), ROW_KEY_SEPARATOR, self.value)
    }
}

/// What a successful commit produced.
pub enum CommitOutcome {
    /// The policy was written to the edited object only.
    Applied { serialized: Vec<u8> },
    /// The policy was written and a background batch is propagating it to
    /// the chosen scope.
    PropagationStarted(BatchHandle),
}

/// An editing session over one object's policy document.
pub struct Session {
    store: Arc<dyn ObjectStore>,
    object_id: ObjectId,
    validator: LockoutValidator,
    restrictions: RestrictionPolicy,
    doc: PolicyDocument,
    staging: StagingStore,
    staged_viewing: AccessRule,
    staged_management: AccessRule,
    staged_datastream: AccessRule,
    choices: BTreeMap<String, QueryChoice>,
    scope: Option<QueryChoice>,
}

impl Session {
    /// Open a session on `object_id`.
    ///
    /// Loads the object, parses its stored policy (an object without one
    /// starts from an empty document), snapshots the rules for staging, and
    /// aggregates the propagation scopes its content models contribute. A
    /// missing object or an unparseable stored policy refuses to open.
    pub fn start(
        store: Arc<dyn ObjectStore>,
        directory: &dyn IdentityDirectory,
        current_user: UserId,
        restrictions: RestrictionPolicy,
        selector: &ChildSelector,
        object_id: impl Into<ObjectId>,
    ) -> Result<Self, SessionError> {
        let object_id = object_id.into();
        let object = store.load(&object_id).map_err(|e| match e {
            RepoError::NotFound(id) => SessionError::NotFound(id),
            other => SessionError::Repo(other),
        })?;

        let doc = match &object.policy {
            Some(bytes) => PolicyDocument::load(object_id.clone(), bytes)?,
            None => PolicyDocument::new(object_id.clone()),
        };

        let choices = selector.choices_for(&object);
        tracing::debug!(
            object = %object_id,
            editor = %current_user,
            scopes = choices.len(),
            "opened policy editing session"
        );

        let mut session = Self {
            store,
            object_id,
            validator: LockoutValidator::new(directory.admin_user(), current_user),
            restrictions,
            staged_viewing: doc.viewing.clone(),
            staged_management: doc.management.clone(),
            staged_datastream: doc.datastream.access.clone(),
            doc,
            staging: StagingStore::new(),
            choices,
            scope: None,
        };
        session.staging.reconcile(&mut session.doc);
        Ok(session)
    }

    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.doc
    }

    /// The staged copy of a rule, as it would be committed.
    pub fn rule(&self, kind: RuleKind) -> &AccessRule {
        match kind {
            RuleKind::Viewing => &self.staged_viewing,
            RuleKind::Management => &self.staged_management,
            RuleKind::Datastream => &self.staged_datastream,
        }
    }

    fn rule_mut(&mut self, kind: RuleKind) -> &mut AccessRule {
        match kind {
            RuleKind::Viewing => &mut self.staged_viewing,
            RuleKind::Management => &mut self.staged_management,
            RuleKind::Datastream => &mut self.staged_datastream,
        }
    }

    pub fn set_rule_enabled(&mut self, kind: RuleKind, enabled: bool) {
        self.rule_mut(kind).enabled = enabled;
    }

    /// Replace the staged user set of a rule.
    pub fn set_rule_users(&mut self, kind: RuleKind, users: impl IntoIterator<Item = UserId>) {
        self.rule_mut(kind).users = users.into_iter().collect();
    }

    /// Replace the staged role set of a rule.
    pub fn set_rule_roles(&mut self, kind: RuleKind, roles: impl IntoIterator<Item = RoleId>) {
        self.rule_mut(kind).roles = roles.into_iter().collect();
    }

    /// Stage a filter value for addition. Returns a warning (and leaves all
    /// state untouched) when the value is empty, already a filter, or on the
    /// admin deny-list.
    pub fn stage_add(&mut self, kind: FilterKind, value: &str) -> Option<ValidationWarning> {
        let value = value.trim();
        if value.is_empty() {
            return Some(warn(ValidationWarning::EmptyValue(kind)));
        }
        if self.staging.selected(kind).contains(value) || self.staging.added(kind).contains(value) {
            return Some(warn(ValidationWarning::Duplicate {
                kind,
                value: value.to_string(),
            }));
        }
        if self.restrictions.denies(kind, value) {
            return Some(warn(ValidationWarning::Restricted {
                kind,
                value: value.to_string(),
            }));
        }

        self.staging.stage_add(kind, value);
        self.staging.reconcile(&mut self.doc);
        None
    }

    /// Stage the filters named by `row_keys` for removal. Unparseable keys
    /// are skipped with a warning; an empty selection is itself a warning.
    pub fn stage_remove_selected<S: AsRef<str>>(&mut self, row_keys: &[S]) -> Vec<ValidationWarning> {
        if row_keys.is_empty() {
            return vec![warn(ValidationWarning::EmptySelection)];
        }

        let mut warnings = Vec::new();
        for key in row_keys {
            let key = key.as_ref();
            match parse_row_key(key) {
                Some((kind, value)) => self.staging.stage_remove(kind, value),
                None => warnings.push(warn(ValidationWarning::UnknownRowKey(key.to_string()))),
            }
        }
        self.staging.reconcile(&mut self.doc);
        warnings
    }

    /// Stage every current filter for removal. Returns how many were staged.
    pub fn stage_remove_all(&mut self) -> usize {
        let mut staged = 0;
        for kind in FilterKind::ALL {
            let values: Vec<String> = self.staging.selected(kind).iter().cloned().collect();
            for value in values {
                self.staging.stage_remove(kind, value);
                staged += 1;
            }
        }
        self.staging.reconcile(&mut self.doc);
        staged
    }

    /// The current effective filters, ordered by kind then value.
    pub fn current_rows(&self) -> Vec<FilterRow> {
        let mut rows = Vec::with_capacity(self.staging.selected_count());
        for kind in FilterKind::ALL {
            for value in self.staging.selected(kind) {
                rows.push(FilterRow {
                    kind,
                    value: value.clone(),
                });
            }
        }
        rows
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    /// The ordered scope menu for this object, `newchildren` first.
    pub fn scope_menu(&self) -> Vec<(String, String)> {
        ChildSelector::selection_menu(&self.choices)
    }

    /// Choose the propagation scope for commit. `newchildren` means no
    /// batch; any other key must have been contributed by a provider.
    pub fn choose_scope(&mut self, key: &str) -> Result<(), SessionError> {
        if key == NEW_CHILDREN_KEY {
            self.scope = None;
            return Ok(());
        }
        match self.choices.get(key) {
            Some(choice) => {
                self.scope = Some(choice.clone());
                Ok(())
            }
            None => Err(SessionError::UnknownScope(key.to_string())),
        }
    }

    /// Run the lockout checks against the staged rules.
    pub fn validate(&self, trigger: Trigger) -> Vec<LockoutError> {
        self.validator.validate(
            &self.staged_management,
            &self.staged_datastream,
            self.staging.any_selected(),
            trigger,
        )
    }

    /// Commit the staged edits: reconcile, validate, rebuild each rule from
    /// its staged copy, write the document back, and start a propagation
    /// batch if a scope was chosen.
    ///
    /// Each rule is cleared and repopulated, so a committed document never
    /// carries values from a previous edit round. A disabled rule commits
    /// empty. Committing with a chosen scope must happen within a tokio
    /// runtime; the returned handle is the only coupling to the batch.
    pub fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        self.staging.reconcile(&mut self.doc);

        let errors = self.validate(Trigger::Submit);
        if !errors.is_empty() {
            return Err(SessionError::Lockout(errors));
        }

        for kind in [RuleKind::Viewing, RuleKind::Management] {
            let staged = self.rule(kind).clone();
            self.doc.clear(kind);
            if staged.enabled {
                self.doc.add_users(kind, staged.users);
                self.doc.add_roles(kind, staged.roles);
            }
            self.doc.rule_mut(kind).enabled = staged.enabled;
        }

        let staged = self.staged_datastream.clone();
        self.doc.clear(RuleKind::Datastream);
        if staged.enabled {
            self.doc.add_users(RuleKind::Datastream, staged.users);
            self.doc.add_roles(RuleKind::Datastream, staged.roles);
            for kind in FilterKind::ALL {
                for value in self.staging.selected(kind) {
                    self.doc.add_filter(kind, value.clone());
                }
            }
        }
        self.doc.rule_mut(RuleKind::Datastream).enabled = staged.enabled;

        // Staged pattern filters are only compiled here; a malformed one
        // must never reach the store.
        self.doc.validate()?;
        let serialized = self.doc.serialize()?;
        self.store.write_policy(&self.object_id, &serialized)?;
        tracing::info!(
            object = %self.object_id,
            bytes = serialized.len(),
            scope = self.scope.as_ref().map(|c| c.key.as_str()).unwrap_or(NEW_CHILDREN_KEY),
            "policy committed"
        );

        match self.scope.clone() {
            Some(choice) => {
                let job = BatchJob::new(serialized, self.object_id.clone(), choice);
                let handle = BatchPropagator::spawn(self.store.clone(), job);
                Ok(CommitOutcome::PropagationStarted(handle))
            }
            None => Ok(CommitOutcome::Applied { serialized }),
        }
    }
}

fn parse_row_key(key: &str) -> Option<(FilterKind, &str)> {
    let (token, value) = key.split_once(ROW_KEY_SEPARATOR)?;
    Some((FilterKind::parse(token)?, value))
}

fn warn(warning: ValidationWarning) -> ValidationWarning {
    tracing::warn!(%warning, "staging operation rejected");
    warning
}
