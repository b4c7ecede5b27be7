//! MagicVoca core types and functions.

pub mod types;

pub use types::{Comment, MembershipFlags, Word};

/// Canonical form of a category key as typed by a user or carried in a URL.
///
/// Category keys are case-insensitive and surrounding whitespace is ignored.
pub fn category_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Returns true for the character-study categories (`hanja-8` .. `hanja-special`).
pub fn is_hanja_category(key: &str) -> bool {
    category_key(key).starts_with("hanja-")
}
