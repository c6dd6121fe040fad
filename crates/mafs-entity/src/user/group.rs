//! User group codes.
//!
//! Groups are free-form codes stored on the user row and keyed into the
//! form permission table. Only the administrator group has built-in meaning.

/// The administrator group. Members pass every authorization guard.
pub const ADMIN_GROUP: &str = "ADMIN";

/// Check whether a group code denotes the administrator group.
pub fn is_admin_group(code: &str) -> bool {
    code.eq_ignore_ascii_case(ADMIN_GROUP)
}
