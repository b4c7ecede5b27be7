//! Rows as they are sent to the database.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use voca_core::MembershipFlags;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewWord<'a> {
    pub english: Cow<'a, str>,
    pub korean: Cow<'a, str>,
    pub pronunciation: Option<Cow<'a, str>>,
    pub part_of_speech: Option<Cow<'a, str>>,
    pub tip: Option<Cow<'a, str>>,
    /// Free-form label kept next to the join table for older queries.
    pub category: Option<Cow<'a, str>>,
    #[serde(flatten)]
    pub flags: MembershipFlags,
}

impl<'a> NewWord<'a> {
    /// A word that belongs to a join-backed category only.
    pub fn joined(
        english: impl Into<Cow<'a, str>>,
        korean: impl Into<Cow<'a, str>>,
        pronunciation: Option<Cow<'a, str>>,
        category: &'a str,
    ) -> Self {
        Self {
            english: english.into(),
            korean: korean.into(),
            pronunciation,
            part_of_speech: None,
            tip: None,
            category: Some(Cow::Borrowed(category)),
            flags: MembershipFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct NewWordCategory {
    pub word_id: i32,
    pub category_id: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateWord<'a> {
    pub english: Cow<'a, str>,
    pub korean: Cow<'a, str>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewComment<'a> {
    pub word_id: i32,
    pub content: Cow<'a, str>,
    pub author: Cow<'a, str>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewHanjaCharacter<'a> {
    pub hanja: Cow<'a, str>,
    /// The meaning column exactly as it appeared in the source file.
    pub meaning: Cow<'a, str>,
    pub main_sound: Cow<'a, str>,
    pub level: Cow<'a, str>,
    pub korean: Cow<'a, str>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn joined_word_serializes_flat_flags() {
        let word = NewWord::joined("hello", "안녕하세요", None, "KOREAN");
        let json = serde_json::to_value(&word).unwrap();
        assert_eq!(json["english"], "hello");
        assert_eq!(json["category"], "KOREAN");
        assert_eq!(json["is_toeic"], false);
        assert_eq!(json["is_gongmuwon"], false);
        assert!(json["pronunciation"].is_null());
    }
}
