// filter.rs — The closed set of datastream filter kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four kinds of datastream filter. Closed enumeration — the staging
/// layer and the UI row encoding both key on exactly these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Dsid,
    Mime,
    DsidPattern,
    MimePattern,
}

impl FilterKind {
    /// All kinds, in the order rows are presented.
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Dsid,
        FilterKind::Mime,
        FilterKind::DsidPattern,
        FilterKind::MimePattern,
    ];

    /// Stable token used in row keys (`"<kind>---<value>"`).
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Dsid => "dsid",
            FilterKind::Mime => "mime",
            FilterKind::DsidPattern => "dsid_regex",
            FilterKind::MimePattern => "mime_regex",
        }
    }

    /// Parse a row-key token back into a kind.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "dsid" => Some(FilterKind::Dsid),
            "mime" => Some(FilterKind::Mime),
            "dsid_regex" => Some(FilterKind::DsidPattern),
            "mime_regex" => Some(FilterKind::MimePattern),
            _ => None,
        }
    }

    /// Human-readable label for UI tables.
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Dsid => "DSID",
            FilterKind::Mime => "MIME type",
            FilterKind::DsidPattern => "DSID regex",
            FilterKind::MimePattern => "MIME type regex",
        }
    }

    /// Pattern kinds hold regex sources; exact kinds hold literal values.
    /// The admin deny-list applies only to exact kinds.
    pub fn is_pattern(self) -> bool {
        matches!(self, FilterKind::DsidPattern | FilterKind::MimePattern)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for kind in FilterKind::ALL {
            assert_eq!(FilterKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn unknown_token_is_none() {
        assert_eq!(FilterKind::parse("dsid_regexs"), None);
        assert_eq!(FilterKind::parse(""), None);
    }

    #[test]
    fn only_pattern_kinds_are_patterns() {
        assert!(!FilterKind::Dsid.is_pattern());
        assert!(!FilterKind::Mime.is_pattern());
        assert!(FilterKind::DsidPattern.is_pattern());
        assert!(FilterKind::MimePattern.is_pattern());
    }
}
