//! The Thai phrase list, an HTML table saved with a `.csv` extension.
//!
//! Each `<tr>` holds the numbered Korean phrase, the Thai phrase and a romanised pronunciation.

use crate::regex;
use regex::Regex;
use std::{borrow::Cow, sync::OnceLock};
use voca_api::request as req;

static CELL: OnceLock<Regex> = OnceLock::new();
static NUMBERING: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThaiWord {
    pub korean: String,
    pub thai: String,
    pub pronunciation: String,
}

impl ThaiWord {
    /// The Thai phrase is stored in the `english` column.
    pub fn to_new_word(&self) -> req::NewWord<'_> {
        req::NewWord::joined(
            Cow::Borrowed(self.thai.as_str()),
            Cow::Borrowed(self.korean.as_str()),
            Some(Cow::Borrowed(self.pronunciation.as_str())),
            "THAI",
        )
    }
}

/// Parses every table row with at least three non-empty cells.
pub fn parse_rows(html: &str) -> Vec<ThaiWord> {
    let cell = regex(&CELL, r"<td[^>]*>(.*?)</td>");
    let numbering = regex(&NUMBERING, r"^\d+\.?\s*");

    html.split("<tr>")
        .skip(1)
        .filter_map(|row| {
            let cells = cell
                .captures_iter(row)
                .filter_map(|captures| captures.get(1))
                .map(|m| m.as_str().trim())
                .collect::<Vec<_>>();
            let [korean, thai, pronunciation, ..] = cells.as_slice() else {
                return None;
            };
            let pronunciation = pronunciation
                .replace("&nbsp;", " ")
                .replace('＾', "^");
            let pronunciation = pronunciation.trim();
            if korean.is_empty() || thai.is_empty() || pronunciation.is_empty() {
                tracing::trace!("Skipping incomplete row {row:?}");
                return None;
            }
            Some(ThaiWord {
                korean: numbering.replace(korean, "").into_owned(),
                thai: thai.to_string(),
                pronunciation: pronunciation.replace(['(', ')'], ""),
            })
        })
        .collect()
}
