// restriction.rs — Admin-configured deny-lists for filter values.
//
// Site administrators can forbid certain DSIDs and MIME types from ever
// being added as filters (e.g., the policy datastream itself). The config
// arrives as whitespace/comma-delimited strings, matching the admin
// settings format of the original module. Read-only after construction.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::filter::FilterKind;

fn delimiter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,]+").expect("delimiter regex is valid"))
}

/// Deny-lists consulted when staging exact-value filters. Pattern kinds are
/// never checked against the deny-list.
#[derive(Debug, Clone, Default)]
pub struct RestrictionPolicy {
    denied_dsids: BTreeSet<String>,
    denied_mime_types: BTreeSet<String>,
}

impl RestrictionPolicy {
    /// Build from the two delimited configuration strings.
    pub fn from_config(dsids: &str, mime_types: &str) -> Self {
        Self {
            denied_dsids: split_delimited(dsids),
            denied_mime_types: split_delimited(mime_types),
        }
    }

    pub fn denied_dsids(&self) -> &BTreeSet<String> {
        &self.denied_dsids
    }

    pub fn denied_mime_types(&self) -> &BTreeSet<String> {
        &self.denied_mime_types
    }

    /// Whether the deny-list forbids staging `value` under `kind`.
    pub fn denies(&self, kind: FilterKind, value: &str) -> bool {
        match kind {
            FilterKind::Dsid => self.denied_dsids.contains(value),
            FilterKind::Mime => self.denied_mime_types.contains(value),
            FilterKind::DsidPattern | FilterKind::MimePattern => false,
        }
    }
}

fn split_delimited(raw: &str) -> BTreeSet<String> {
    delimiter()
        .split(raw)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
