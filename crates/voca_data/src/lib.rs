//! Prepares MagicVoca's word lists and uploads them.
//!
//! The source files go through a fixed pipeline, each step being one of the binaries:
//! `fix_korean_csv` cleans the Korean phrase list, `strip_hanja_brackets` and `format_hanja_csv`
//! turn the Hanja export into a plain four column file, and the `upload_*` binaries push the
//! results into the database.

pub mod hanja;
pub mod korean_csv;
pub mod report;
pub mod thai;
pub mod upload;

use regex::Regex;
use std::sync::OnceLock;

/// Compiles `pattern` once per `cell`.
pub(crate) fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static patterns are valid"))
}
