//! Contains the MagicVoca types shared by the client, the scripts and the quiz logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Database id, stable for the lifetime of the word.
    pub id: i32,
    /// The term being studied. Holds the Thai or English text depending on the category.
    pub english: String,
    /// The Korean side of the entry.
    pub korean: String,
    pub pronunciation: Option<String>,
    pub part_of_speech: Option<String>,
    /// A short usage hint.
    pub tip: Option<String>,
    /// Labels of the categories this word belongs to.
    pub categories: Vec<String>,
}

impl Word {
    pub fn in_category(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c == label)
    }
}

/// The boolean membership columns of the fixed test-prep categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipFlags {
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_toeic: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_toefl: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_gtelp: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_suneung: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_gongmuwon: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

impl MembershipFlags {
    /// The flag columns and the tag each one contributes, in display order.
    pub const COLUMNS: [(&'static str, &'static str); 5] = [
        ("is_toeic", "TOEIC"),
        ("is_toefl", "TOEFL"),
        ("is_gtelp", "GTELP"),
        ("is_suneung", "수능"),
        ("is_gongmuwon", "공무원"),
    ];

    /// Category tags for every flag that is set.
    pub fn tags(&self) -> Vec<String> {
        let set = [
            self.is_toeic,
            self.is_toefl,
            self.is_gtelp,
            self.is_suneung,
            self.is_gongmuwon,
        ];
        Self::COLUMNS
            .iter()
            .zip(set)
            .filter(|(_, set)| *set)
            .map(|((_, tag), _)| tag.to_string())
            .collect()
    }
}

/// A user-authored note attached to a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub word_id: i32,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
