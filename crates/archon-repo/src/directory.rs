// directory.rs — Identity directory collaborator.
//
// Rules refer to user and role identifiers that live outside the repository.
// The directory enumerates them for selection lists and names the designated
// admin account the lockout validator protects.

use crate::ids::{RoleId, UserId};

/// The synthetic identity representing unauthenticated access.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Directory of users and roles the policy rules may reference.
pub trait IdentityDirectory: Send + Sync {
    /// All known users as `(id, display name)`, including the synthetic
    /// anonymous identity. Ordering is the directory's display ordering.
    fn users(&self) -> Vec<(UserId, String)>;

    /// All known roles as `(id, label)`.
    fn roles(&self) -> Vec<(RoleId, String)>;

    /// The designated admin identity that must never be locked out.
    fn admin_user(&self) -> UserId;
}
