//! Well-known role name constants carried in access-token claims.
//!
//! Roles are derived from the `users.is_superuser` flag at login time.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_ANNOTATOR: &str = "annotator";

/// Resolve the role name for a user row.
pub fn role_for(is_superuser: bool) -> &'static str {
    if is_superuser {
        ROLE_ADMIN
    } else {
        ROLE_ANNOTATOR
    }
}
