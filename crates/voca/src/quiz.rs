//! Multiple-choice quiz options.

use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;
use voca_core::{category_key, is_hanja_category, Word};

/// The number of options shown for a quiz prompt.
pub const OPTION_COUNT: usize = 4;

/// The field of a word that is shown as an answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerField {
    /// The Korean meaning of an English word.
    Korean,
    /// The English meaning of a Korean phrase.
    English,
    /// The romanised reading of a Thai phrase.
    Pronunciation,
    /// `"<meaning> / <reading>"` of a Hanja character.
    MeaningAndReading,
}

impl AnswerField {
    pub fn for_category(category: Option<&str>) -> Self {
        let Some(category) = category else {
            return Self::Korean;
        };
        if is_hanja_category(category) {
            return Self::MeaningAndReading;
        }
        match category_key(category).as_str() {
            "thai-conversation" => Self::Pronunciation,
            "kr-en-basic" => Self::English,
            _ => Self::Korean,
        }
    }

    /// The answer text of `word`, empty if the word has no value for this field.
    pub fn of(self, word: &Word) -> String {
        match self {
            Self::Korean => word.korean.clone(),
            Self::English => word.english.clone(),
            Self::Pronunciation => word.pronunciation.clone().unwrap_or_default(),
            Self::MeaningAndReading => format!(
                "{} / {}",
                word.korean,
                word.pronunciation.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Answer options for the word at `index` using the thread-local RNG.
pub fn quiz_options(words: &[Word], index: usize, category: Option<&str>) -> Vec<String> {
    sample_options(words, index, category, &mut rand::rng())
}

/// Draws the correct answer and up to three distinct distractors from `words`, then shuffles them.
///
/// Distractors are only drawn when there are more than [`OPTION_COUNT`] words. Drawing stops early
/// once every distinct value in the list has been used, so a list with too few distinct values
/// yields fewer options instead of looping.
pub fn sample_options<R>(
    words: &[Word],
    index: usize,
    category: Option<&str>,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let field = AnswerField::for_category(category);
    let correct = words.get(index).map(|w| field.of(w)).unwrap_or_default();

    let mut options = vec![correct.clone()];
    if words.len() > OPTION_COUNT {
        let mut used = HashSet::from([correct]);
        let mut drawable = words
            .iter()
            .map(|w| field.of(w))
            .filter(|value| !value.is_empty() && !used.contains(value))
            .collect::<HashSet<_>>()
            .len();
        while options.len() < OPTION_COUNT && drawable > 0 {
            let candidate = field.of(&words[rng.random_range(0..words.len())]);
            if !candidate.is_empty() && used.insert(candidate.clone()) {
                options.push(candidate);
                drawable -= 1;
            }
        }
    }

    options.shuffle(rng);
    tracing::trace!("quiz options for word {index}: {options:?}");
    options
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn word(id: i32, english: &str, korean: &str, pronunciation: Option<&str>) -> Word {
        Word {
            id,
            english: english.to_string(),
            korean: korean.to_string(),
            pronunciation: pronunciation.map(String::from),
            part_of_speech: None,
            tip: None,
            categories: Vec::new(),
        }
    }

    fn english_words() -> Vec<Word> {
        [
            ("apple", "사과"),
            ("banana", "바나나"),
            ("cherry", "체리"),
            ("grape", "포도"),
            ("lemon", "레몬"),
            ("melon", "멜론"),
            ("peach", "복숭아"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (e, k))| word(i as i32, e, k, None))
        .collect()
    }

    #[test]
    fn four_distinct_options_with_correct_answer() {
        let words = english_words();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let index = seed as usize % words.len();
            let options = sample_options(&words, index, Some("toeic"), &mut rng);
            assert_eq!(options.len(), OPTION_COUNT);
            assert!(options.contains(&words[index].korean));
            let distinct = options.iter().collect::<HashSet<_>>();
            assert_eq!(distinct.len(), OPTION_COUNT);
        }
    }

    #[test]
    fn correct_answer_position_varies() {
        let words = english_words();
        let positions = (0..100)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let options = sample_options(&words, 0, None, &mut rng);
                options.iter().position(|o| o == "사과").unwrap()
            })
            .collect::<HashSet<_>>();
        assert!(positions.len() > 1);
    }

    #[test]
    fn small_lists_only_have_the_correct_answer() {
        let words = english_words();
        for len in 1..=OPTION_COUNT {
            let mut rng = StdRng::seed_from_u64(len as u64);
            let options = sample_options(&words[..len], len - 1, None, &mut rng);
            assert!(!options.is_empty() && options.len() <= OPTION_COUNT);
            assert_eq!(options[0], words[len - 1].korean);
        }
    }

    #[test]
    fn duplicate_values_terminate() {
        let words = (0..6)
            .map(|i| word(i, "same", "같다", None))
            .chain([word(6, "other", "다르다", None)])
            .collect::<Vec<_>>();
        let mut rng = StdRng::seed_from_u64(1);
        let mut options = sample_options(&words, 0, None, &mut rng);
        options.sort();
        assert_eq!(options, &["같다", "다르다"]);
    }

    #[test]
    fn empty_values_are_never_distractors() {
        let mut words = (0..6)
            .map(|i| word(i, "x", "", Some("")))
            .collect::<Vec<_>>();
        words.push(word(6, "y", "", Some("kin khao")));
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let options = sample_options(&words, 6, Some("thai-conversation"), &mut rng);
            assert_eq!(options, &["kin khao"]);
        }
    }

    #[test]
    fn hanja_options_combine_meaning_and_reading() {
        let words = [
            ("날", "일"),
            ("달", "월"),
            ("불", "화"),
            ("물", "수"),
            ("나무", "목"),
            ("쇠", "금"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (meaning, reading))| word(i as i32, "", meaning, Some(*reading)))
        .collect::<Vec<_>>();
        let mut rng = StdRng::seed_from_u64(5);
        let options = sample_options(&words, 1, Some("hanja-5"), &mut rng);
        assert_eq!(options.len(), OPTION_COUNT);
        assert!(options.contains(&"달 / 월".to_string()));
        assert!(!options.contains(&"달".to_string()));
        assert!(options.iter().all(|o| o.contains(" / ")));
    }

    #[test]
    fn field_selection() {
        let w = word(1, "hello", "안녕하세요", Some("annyeong"));
        assert_eq!(AnswerField::for_category(Some("kr-en-basic")).of(&w), "hello");
        assert_eq!(
            AnswerField::for_category(Some("Thai-Conversation")).of(&w),
            "annyeong"
        );
        assert_eq!(
            AnswerField::for_category(Some("hanja-special")).of(&w),
            "안녕하세요 / annyeong"
        );
        assert_eq!(AnswerField::for_category(Some("toefl")).of(&w), "안녕하세요");
        assert_eq!(AnswerField::for_category(None).of(&w), "안녕하세요");
        assert_eq!(
            AnswerField::MeaningAndReading.of(&word(2, "", "해", None)),
            "해 / "
        );
    }

    #[test]
    fn out_of_range_index_still_returns_an_option() {
        let words = english_words();
        let mut rng = StdRng::seed_from_u64(3);
        let options = sample_options(&words[..2], 10, None, &mut rng);
        assert_eq!(options, &[""]);
    }

    #[test]
    fn thread_rng_entry_point() {
        let words = english_words();
        let options = quiz_options(&words, 3, Some("gtelp"));
        assert_eq!(options.len(), OPTION_COUNT);
        assert!(options.contains(&"포도".to_string()));
    }
}
