//! Types for communication between MagicVoca and its database.

pub mod request;
pub mod response;

/// Table names.
pub mod tables {
    pub const WORDS: &str = "words";
    pub const CATEGORIES: &str = "categories";
    pub const WORD_CATEGORIES: &str = "word_categories";
    pub const COMMENTS: &str = "comments";
    pub const HANJA_CHARACTERS: &str = "hanja_characters";
}

/// The columns selected whenever words are loaded for display.
pub const WORD_COLUMNS: &[&str] = &[
    "id",
    "english",
    "korean",
    "pronunciation",
    "part_of_speech",
    "tip",
    "is_toeic",
    "is_toefl",
    "is_gtelp",
    "is_suneung",
    "is_gongmuwon",
];

/// Author label stored for comments that were left without a name.
pub const ANONYMOUS_AUTHOR: &str = "익명";
