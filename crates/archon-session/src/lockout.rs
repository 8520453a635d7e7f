// lockout.rs — The invariant checker that gates commit.
//
// A committed policy must never leave the designated admin or the editing
// user unable to manage or access the object. Viewing restrictions are
// deliberately exempt: losing view access never costs edit capability.

use thiserror::Error;

use archon_policy::{AccessRule, RuleKind};
use archon_repo::UserId;

/// What kind of interaction is asking for validation.
///
/// During an add-filter cycle the zero-filters check is relaxed — the add
/// is about to land, so an otherwise-empty filter table is tolerated for
/// that one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// One of the four add-filter actions.
    AddFilter,
    /// Any other interaction, including final submit.
    Submit,
}

/// A rule-scoped lockout condition that blocks commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockoutError {
    /// The designated admin is missing from the rule's user set.
    #[error("select '{admin}' in the {rule} section to prevent locking the admin out of the object")]
    AdminMissing { rule: RuleKind, admin: UserId },

    /// The editing user is missing from the rule's user set.
    #[error("select '{user}' in the {rule} section to prevent locking yourself out of the object")]
    CurrentUserMissing { rule: RuleKind, user: UserId },

    /// Both identities are missing.
    #[error("select '{admin}' and '{user}' in the {rule} section to prevent locking yourself and the admin out of the object")]
    BothMissing {
        rule: RuleKind,
        admin: UserId,
        user: UserId,
    },

    /// The datastream rule is enabled but no filter rows are applied.
    #[error("there are no filters applied in the datastream and MIME type section")]
    NoFilters,
}

/// Validates staged rules against the lockout invariants before commit.
pub struct LockoutValidator {
    admin: UserId,
    current: UserId,
}

impl LockoutValidator {
    pub fn new(admin: UserId, current: UserId) -> Self {
        Self { admin, current }
    }

    /// Check the staged management and datastream rules. Returns every
    /// violated invariant; commit proceeds only on an empty result.
    pub fn validate(
        &self,
        management: &AccessRule,
        datastream: &AccessRule,
        has_filters: bool,
        trigger: Trigger,
    ) -> Vec<LockoutError> {
        let mut errors = Vec::new();

        // Management: both the admin and the current editor must stay in.
        if management.enabled {
            if let Some(error) = self.check_identities(RuleKind::Management, management) {
                errors.push(error);
            }
        }

        // Datastream: the current editor must stay in, and an enabled rule
        // with no filters restricts nothing — reject it, except while an
        // add-filter action is in flight.
        if datastream.enabled {
            if !datastream.users.contains(&self.current) {
                errors.push(self.missing_current(RuleKind::Datastream));
            }
            if !has_filters && trigger != Trigger::AddFilter {
                errors.push(LockoutError::NoFilters);
            }
        }

        errors
    }

    fn check_identities(&self, rule: RuleKind, staged: &AccessRule) -> Option<LockoutError> {
        let admin_ok = staged.users.contains(&self.admin);
        let current_ok = staged.users.contains(&self.current);
        match (admin_ok, current_ok) {
            (true, true) => None,
            (false, true) => Some(LockoutError::AdminMissing {
                rule,
                admin: self.admin.clone(),
            }),
            (true, false) => Some(LockoutError::CurrentUserMissing {
                rule,
                user: self.current.clone(),
            }),
            (false, false) => Some(if self.admin == self.current {
                LockoutError::AdminMissing {
                    rule,
                    admin: self.admin.clone(),
                }
            } else {
                LockoutError::BothMissing {
                    rule,
                    admin: self.admin.clone(),
                    user: self.current.clone(),
                }
            }),
        }
    }

    fn missing_current(&self, rule: RuleKind) -> LockoutError {
        // When the editor is the admin, report the admin-scoped message.
        if self.admin == self.current {
            LockoutError::AdminMissing {
                rule,
                admin: self.admin.clone(),
            }
        } else {
            LockoutError::CurrentUserMissing {
                rule,
                user: self.current.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn rule(enabled: bool, users: &[&str]) -> AccessRule {
        AccessRule {
            enabled,
            users: users.iter().map(|u| UserId::new(*u)).collect(),
            roles: BTreeSet::new(),
        }
    }

    fn validator() -> LockoutValidator {
        LockoutValidator::new(UserId::new("admin"), UserId::new("alice"))
    }

    #[test]
    fn disabled_rules_are_never_checked() {
        let errors = validator().validate(
            &rule(false, &[]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn management_requires_both_identities() {
        let errors = validator().validate(
            &rule(true, &["admin", "alice"]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn admin_missing_variant() {
        let errors = validator().validate(
            &rule(true, &["alice"]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            LockoutError::AdminMissing {
                rule: RuleKind::Management,
                ..
            }
        ));
    }

    #[test]
    fn current_user_missing_variant() {
        let errors = validator().validate(
            &rule(true, &["admin"]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert!(matches!(
            errors[0],
            LockoutError::CurrentUserMissing {
                rule: RuleKind::Management,
                ..
            }
        ));
    }

    #[test]
    fn both_missing_variant() {
        let errors = validator().validate(
            &rule(true, &["bob"]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert!(matches!(errors[0], LockoutError::BothMissing { .. }));
    }

    #[test]
    fn admin_editing_gets_single_identity_message() {
        let validator = LockoutValidator::new(UserId::new("admin"), UserId::new("admin"));
        let errors = validator.validate(
            &rule(true, &["bob"]),
            &rule(false, &[]),
            false,
            Trigger::Submit,
        );
        assert!(matches!(errors[0], LockoutError::AdminMissing { .. }));
    }

    #[test]
    fn datastream_requires_current_user_and_filters() {
        let errors = validator().validate(
            &rule(false, &[]),
            &rule(true, &["admin"]),
            false,
            Trigger::Submit,
        );
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            LockoutError::CurrentUserMissing {
                rule: RuleKind::Datastream,
                ..
            }
        ));
        assert!(matches!(errors[1], LockoutError::NoFilters));
    }

    #[test]
    fn add_filter_trigger_tolerates_zero_filters() {
        let errors = validator().validate(
            &rule(false, &[]),
            &rule(true, &["alice"]),
            false,
            Trigger::AddFilter,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn viewing_rule_is_never_a_lockout_concern() {
        // The validator does not even take the viewing rule; locking
        // everyone out of viewing is allowed.
        let errors = validator().validate(
            &rule(false, &[]),
            &rule(true, &["alice"]),
            true,
            Trigger::Submit,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn management_and_datastream_errors_accumulate() {
        let errors = validator().validate(
            &rule(true, &[]),
            &rule(true, &[]),
            false,
            Trigger::Submit,
        );
        assert_eq!(errors.len(), 3);
    }
}
