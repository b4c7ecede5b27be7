//! Rows as they are returned by the database.

use serde::{Deserialize, Serialize};
pub use voca_core::{Comment, MembershipFlags, Word};

/// Error body returned by the database service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// A row of the `words` table restricted to [`crate::WORD_COLUMNS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRow {
    pub id: i32,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub korean: Option<String>,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(flatten)]
    pub flags: MembershipFlags,
}

impl WordRow {
    /// Normalises the row into a [`Word`].
    ///
    /// `joined_tag` is the label of the join-backed category the row was queried through, if any.
    pub fn into_word(self, joined_tag: Option<&str>) -> Word {
        let mut categories = self.flags.tags();
        if let Some(tag) = joined_tag {
            categories.push(tag.to_string());
        }
        Word {
            id: self.id,
            english: self.english.unwrap_or_default(),
            korean: self.korean.unwrap_or_default(),
            pronunciation: self.pronunciation,
            part_of_speech: self.part_of_speech,
            tip: self.tip,
            categories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Any row narrowed down to its id, used for `returning` selections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Id {
    pub id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCategory {
    pub word_id: i32,
    pub category_id: i32,
}
