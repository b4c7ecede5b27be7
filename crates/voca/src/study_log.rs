//! Tracks the words a user studied.

use crate::storage::{read_json, write_json, KeyValueStore, StoreResult};
use chrono::NaiveDate;
use voca_core::Word;

pub const STUDY_LOG_KEY: &str = "todayWords";

/// An append-only set of studied word ids kept in a [`KeyValueStore`].
#[derive(Debug)]
pub struct StudyLog<S> {
    store: S,
}

impl<S: KeyValueStore> StudyLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The recorded ids in the order they were first studied.
    pub fn ids(&self) -> StoreResult<Vec<i32>> {
        match read_json::<Vec<i32>, _>(&self.store, STUDY_LOG_KEY) {
            Ok(ids) => Ok(ids.unwrap_or_default()),
            Err(crate::StoreError::Json(err)) => {
                tracing::warn!("Discarding unreadable study log: {err}");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Records `word_id`, returning false if it was already recorded.
    pub fn record(&self, word_id: i32) -> StoreResult<bool> {
        let mut ids = self.ids()?;
        if ids.contains(&word_id) {
            return Ok(false);
        }
        ids.push(word_id);
        write_json(&self.store, STUDY_LOG_KEY, &ids)?;
        tracing::debug!("Recorded word {word_id} as studied");
        Ok(true)
    }

    pub fn contains(&self, word_id: i32) -> StoreResult<bool> {
        Ok(self.ids()?.contains(&word_id))
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(STUDY_LOG_KEY)
    }

    /// The studied words among `words`, in list order.
    pub fn studied<'w>(&self, words: &'w [Word]) -> StoreResult<Vec<&'w Word>> {
        let ids = self.ids()?;
        Ok(words.iter().filter(|w| ids.contains(&w.id)).collect())
    }
}

/// Renders words as tab separated `english korean` lines with CRLF line endings.
pub fn export_txt(words: &[&Word]) -> String {
    words
        .iter()
        .map(|w| format!("{}\t{}", w.english, w.korean))
        .collect::<Vec<_>>()
        .join("\r\n")
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("today_words_{}.txt", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{FileStore, MemoryStore};

    fn word(id: i32, english: &str, korean: &str) -> Word {
        Word {
            id,
            english: english.to_string(),
            korean: korean.to_string(),
            pronunciation: None,
            part_of_speech: None,
            tip: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn records_each_id_once() {
        let log = StudyLog::new(MemoryStore::new());
        assert!(log.record(5).unwrap());
        assert!(log.record(2).unwrap());
        assert!(!log.record(5).unwrap());
        assert_eq!(log.ids().unwrap(), &[5, 2]);
        assert!(log.contains(2).unwrap());
        assert!(!log.contains(3).unwrap());
    }

    #[test]
    fn persists_as_json_array() {
        let store = MemoryStore::new();
        let log = StudyLog::new(&store);
        log.record(10).unwrap();
        log.record(11).unwrap();
        assert_eq!(store.get(STUDY_LOG_KEY).unwrap().as_deref(), Some("[10,11]"));
        log.clear().unwrap();
        assert!(log.ids().unwrap().is_empty());
    }

    #[test]
    fn survives_restart_with_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        StudyLog::new(FileStore::new(&path)).record(42).unwrap();
        let log = StudyLog::new(FileStore::new(&path));
        assert_eq!(log.ids().unwrap(), &[42]);
    }

    #[test]
    fn unreadable_log_is_empty() {
        let store = MemoryStore::new();
        store.set(STUDY_LOG_KEY, "oops").unwrap();
        let log = StudyLog::new(&store);
        assert!(log.ids().unwrap().is_empty());
        assert!(log.record(1).unwrap());
        assert_eq!(log.ids().unwrap(), &[1]);
    }

    #[test]
    fn filters_and_exports() {
        let words = vec![
            word(1, "apple", "사과"),
            word(2, "banana", "바나나"),
            word(3, "cherry", "체리"),
        ];
        let log = StudyLog::new(MemoryStore::new());
        log.record(3).unwrap();
        log.record(1).unwrap();
        let studied = log.studied(&words).unwrap();
        assert_eq!(studied.iter().map(|w| w.id).collect::<Vec<_>>(), &[1, 3]);
        assert_eq!(export_txt(&studied), "apple\t사과\r\ncherry\t체리");
        assert_eq!(
            export_file_name(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()),
            "today_words_2025-03-09.txt"
        );
    }
}
