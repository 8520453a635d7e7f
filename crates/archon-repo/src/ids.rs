// ids.rs — Typed identifiers shared across the workspace.
//
// Plain strings underneath, but the newtypes keep object ids, content-model
// tags, users, and roles from being mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a digital object in the repository (e.g., "obj:1").
    ObjectId
);

string_id!(
    /// A content-model / type tag carried by an object.
    TypeId
);

string_id!(
    /// A user account name known to the identity directory.
    UserId
);

string_id!(
    /// A role identifier known to the identity directory.
    RoleId
);
