//! Redis key builders for activity store entries.
//!
//! Centralising key construction prevents typos and makes it easy to
//! find every key the store uses.

use uuid::Uuid;

/// Key of the hash holding all last-seen rows for one user.
/// Hash fields are IP strings, values are JSON-encoded rows.
pub fn user_activity(prefix: &str, user_id: Uuid) -> String {
    format!("{prefix}:activity:{user_id}")
}

/// Pattern matching every user activity hash, for the cleanup sweep.
pub fn activity_pattern(prefix: &str) -> String {
    format!("{prefix}:activity:*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_activity_key() {
        assert_eq!(
            user_activity("cohort", Uuid::nil()),
            "cohort:activity:00000000-0000-0000-0000-000000000000"
        );
    }
}
