//! The Korean phrase list, a `korean,english` file with one phrase per line.

use crate::regex;
use regex::Regex;
use std::{borrow::Cow, sync::OnceLock};
use voca_api::request as req;

/// Known typos in the source file and their corrections.
const EXACT_FIXES: &[(&str, &str)] = &[
    ("안녕 하새요!", "안녕하세요!"),
    ("여부세요?", "여보세요?"),
    ("칼러스 은요?", "카를로스는요?"),
    ("배구파요!", "배고파요!"),
    ("줗아하다", "좋아하다"),
    ("저두요!", "저도요!"),
    ("ㅂ니다", "습니다"),
    ("ㅂ니까?", "습니까?"),
];

static REPEATED_QUESTION_MARKS: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();

/// Corrects typos, collapses repeated question marks and normalises whitespace.
pub fn fix_korean_text(text: &str) -> String {
    let mut fixed = text.to_string();
    for (wrong, correct) in EXACT_FIXES {
        fixed = fixed.replacen(wrong, correct, 1);
    }
    let fixed = regex(&REPEATED_QUESTION_MARKS, r"\?\?+").replace_all(&fixed, "?");
    let fixed = regex(&WHITESPACE, r"\s+").replace_all(&fixed, " ");
    fixed.trim().to_string()
}

/// Splits a `korean,english` line at its first comma. Lines starting with a comma have no phrase.
fn split_line(line: &str) -> Option<(&str, &str)> {
    match line.split_once(',') {
        Some((korean, english)) if !korean.is_empty() => Some((korean.trim(), english.trim())),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct FixedCsv {
    /// The rewritten file, without a trailing newline.
    pub contents: String,
    /// Every changed phrase as `(before, after)`.
    pub fixes: Vec<(String, String)>,
    /// Data lines written, excluding the header.
    pub rows: usize,
}

/// Applies [`fix_korean_text`] to the Korean column of every line after the header.
///
/// Blank lines are dropped and lines without a phrase are kept as they are.
pub fn fix_csv(contents: &str) -> FixedCsv {
    let mut lines = contents.split('\n');
    let header = lines.next().unwrap_or_default();
    let mut output = vec![header.to_string()];
    let mut fixes = Vec::new();

    for line in lines.map(str::trim).filter(|line| !line.is_empty()) {
        match split_line(line) {
            Some((korean, english)) => {
                let fixed = fix_korean_text(korean);
                if fixed != korean {
                    tracing::debug!("Fixed {korean:?} to {fixed:?}");
                    fixes.push((korean.to_string(), fixed.clone()));
                }
                output.push(format!("{fixed},{english}"));
            }
            None => output.push(line.to_string()),
        }
    }

    FixedCsv {
        rows: output.len() - 1,
        contents: output.join("\n"),
        fixes,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KoreanWord {
    pub korean: String,
    pub english: String,
}

impl KoreanWord {
    /// The Korean phrase is the prompt and the English text the answer.
    pub fn to_new_word(&self) -> req::NewWord<'_> {
        req::NewWord::joined(
            Cow::Borrowed(self.english.as_str()),
            Cow::Borrowed(self.korean.as_str()),
            None,
            "KOREAN",
        )
    }
}

/// Parses the rows after the header, skipping rows with an empty side.
pub fn parse_words(contents: &str) -> Vec<KoreanWord> {
    contents
        .split('\n')
        .skip(1)
        .map(str::trim)
        .filter_map(split_line)
        .filter(|(korean, english)| !korean.is_empty() && !english.is_empty())
        .map(|(korean, english)| KoreanWord {
            korean: korean.to_string(),
            english: english.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixes_known_typos() {
        assert_eq!(fix_korean_text("안녕 하새요!"), "안녕하세요!");
        assert_eq!(fix_korean_text("배구파요!"), "배고파요!");
        assert_eq!(fix_korean_text("감사합ㅂ니다"), "감사합습니다");
        assert_eq!(fix_korean_text("뭐 합ㅂ니까?"), "뭐 합습니까?");
        assert_eq!(fix_korean_text("저두요!"), "저도요!");
    }

    #[test]
    fn collapses_question_marks_and_whitespace() {
        assert_eq!(fix_korean_text("  정말??? "), "정말?");
        assert_eq!(fix_korean_text("어디  가\t요?"), "어디 가 요?");
        assert_eq!(fix_korean_text("괜찮아요"), "괜찮아요");
    }

    #[test]
    fn rewrites_the_file() {
        let contents = "korean,english\n여부세요?,Hello?\n\n괜찮아요,It's okay\n,orphan\r\n줗아하다 ,to like, to be fond of\n";
        let fixed = fix_csv(contents);
        assert_eq!(
            fixed.contents,
            "korean,english\n여보세요?,Hello?\n괜찮아요,It's okay\n,orphan\n좋아하다,to like, to be fond of"
        );
        assert_eq!(fixed.rows, 4);
        assert_eq!(
            fixed.fixes,
            &[
                ("여부세요?".to_string(), "여보세요?".to_string()),
                ("줗아하다".to_string(), "좋아하다".to_string()),
            ]
        );
    }

    #[test]
    fn parses_words() {
        let words = parse_words("korean,english\r\n안녕하세요,Hello\r\n,nothing\r\n네,\r\n좋아요,Good, nice\r\n");
        assert_eq!(
            words,
            &[
                KoreanWord {
                    korean: "안녕하세요".to_string(),
                    english: "Hello".to_string(),
                },
                KoreanWord {
                    korean: "좋아요".to_string(),
                    english: "Good, nice".to_string(),
                },
            ]
        );
        let row = words[0].to_new_word();
        assert_eq!(row.english, "Hello");
        assert_eq!(row.korean, "안녕하세요");
        assert_eq!(row.category.as_deref(), Some("KOREAN"));
    }
}
