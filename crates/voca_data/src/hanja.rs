//! The Hanja character export.
//!
//! The raw export is a CSV file whose meaning column holds nested arrays such as
//! `"[[['햇빛'], ['희']]]"`. [`strip_brackets`] and [`format_rows`] reduce it to a plain
//! `main_sound,level,hanja,meaning` file that [`parse_records`] reads back for uploading.

use serde_json::Value;
use std::{borrow::Cow, cmp::Ordering, collections::BTreeMap};
use thiserror::Error;
use voca_api::request as req;

pub const HEADER: &str = "main_sound,level,hanja,meaning";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("The file is empty")]
    Empty,
    #[error("The header is missing the {0} column")]
    MissingColumn(&'static str),
    #[error("Line {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("Line {line} has an unterminated quote")]
    UnterminatedQuote { line: usize },
}

/// Removes every `[`, `]` and `"` from the export.
pub fn strip_brackets(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect()
}

/// Keeps the first four comma separated columns of every line after the header, under a fresh
/// [`HEADER`]. Single quotes around the meaning are dropped.
pub fn format_rows(raw: &str) -> String {
    let mut output = vec![HEADER.to_string()];
    for line in raw.lines().skip(1).map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let mut columns = line.split(',');
        let main_sound = columns.next().unwrap_or_default();
        let level = columns.next().unwrap_or_default();
        let hanja = columns.next().unwrap_or_default();
        let meaning = columns.next().unwrap_or_default();
        let meaning = meaning.strip_prefix('\'').unwrap_or(meaning);
        let meaning = meaning.strip_suffix('\'').unwrap_or(meaning).trim();
        output.push(format!("{main_sound},{level},{hanja},{meaning}"));
    }
    output.join("\n")
}

/// Splits one CSV line into fields, honouring double quotes and `""` escapes.
fn split_record(line: &str, number: usize) -> Result<Vec<String>, ParseError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if field.is_empty() => quoted = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            (c, _) => field.push(c),
        }
    }
    if quoted {
        return Err(ParseError::UnterminatedQuote { line: number });
    }
    fields.push(field);
    Ok(fields)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HanjaRecord {
    pub main_sound: String,
    pub level: String,
    pub hanja: String,
    pub meaning: String,
}

impl HanjaRecord {
    /// The row uploaded for this record, with its level simplified.
    pub fn to_row(&self) -> req::NewHanjaCharacter<'_> {
        let korean = match parse_meaning(&self.meaning) {
            Some((korean, _reading)) => Cow::Owned(korean),
            None => Cow::Borrowed(self.meaning.as_str()),
        };
        req::NewHanjaCharacter {
            hanja: Cow::Borrowed(&self.hanja),
            meaning: Cow::Borrowed(&self.meaning),
            main_sound: Cow::Borrowed(&self.main_sound),
            level: Cow::Owned(simplify_level(&self.level)),
            korean,
        }
    }
}

/// Parses a formatted file, locating the columns by the header.
pub fn parse_records(contents: &str) -> Result<Vec<HanjaRecord>, ParseError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());
    let (number, header) = lines.next().ok_or(ParseError::Empty)?;
    let header = split_record(header.trim(), number)?;
    let position = |name: &'static str| {
        header
            .iter()
            .position(|column| column.trim() == name)
            .ok_or(ParseError::MissingColumn(name))
    };
    let main_sound = position("main_sound")?;
    let level = position("level")?;
    let hanja = position("hanja")?;
    let meaning = position("meaning")?;

    let mut records = Vec::new();
    for (number, line) in lines {
        let fields = split_record(line.trim_end_matches('\r'), number)?;
        if fields.len() != header.len() {
            return Err(ParseError::FieldCount {
                line: number,
                found: fields.len(),
                expected: header.len(),
            });
        }
        records.push(HanjaRecord {
            main_sound: fields[main_sound].clone(),
            level: fields[level].clone(),
            hanja: fields[hanja].clone(),
            meaning: fields[meaning].clone(),
        });
    }
    Ok(records)
}

/// Folds the `Ⅱ` half grades into their full grade, `7급Ⅱ` becoming `7급`.
pub fn simplify_level(level: &str) -> String {
    match level.strip_suffix('Ⅱ') {
        Some(grade @ ("7급" | "6급" | "5급" | "4급" | "3급" | "특급")) => grade.to_string(),
        _ => level.to_string(),
    }
}

/// Joins a string or an array of strings.
fn join(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

/// Extracts `(korean, reading)` from the first entry of a JSON encoded meaning.
///
/// Accepts `[[["햇빛"], ["희"]]]`, `[["햇빛", "희"]]` and the same shapes with several
/// meanings, of which only the first is used.
pub fn parse_meaning(meaning: &str) -> Option<(String, String)> {
    let parsed: Value = serde_json::from_str(meaning).ok()?;
    let first = parsed.as_array()?.first()?.as_array()?;
    match first.as_slice() {
        [korean @ Value::Array(_), reading @ Value::Array(_)] => Some((join(korean)?, join(reading)?)),
        [Value::String(korean), Value::String(reading)] => Some((korean.clone(), reading.clone())),
        [Value::Array(pair), ..] if pair.len() >= 2 => Some((join(&pair[0])?, join(&pair[1])?)),
        [korean, reading, ..] => Some((join(korean)?, join(reading)?)),
        _ => None,
    }
}

fn level_order(a: &str, b: &str) -> Ordering {
    let grade = |level: &str| level.trim_end_matches('급').parse::<u32>().ok();
    match (a, b) {
        ("특급", "특급") => Ordering::Equal,
        ("특급", _) => Ordering::Greater,
        (_, "특급") => Ordering::Less,
        _ => match (grade(a), grade(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
    }
}

/// Records per level, ordered from 1급 up with 특급 last.
pub fn level_statistics<'a>(levels: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts = BTreeMap::<&str, usize>::new();
    for level in levels {
        *counts.entry(level).or_default() += 1;
    }
    let mut statistics = counts
        .into_iter()
        .map(|(level, count)| (level.to_string(), count))
        .collect::<Vec<_>>();
    statistics.sort_by(|(a, _), (b, _)| level_order(a, b));
    statistics
}
