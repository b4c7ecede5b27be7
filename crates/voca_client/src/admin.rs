//! Word maintenance for administrators.

use crate::{
    database::{Database, DbResult, Query},
    repository::fetch_remaining,
};
use std::sync::Arc;
use voca_api::{request as req, tables, WORD_COLUMNS};
use voca_core::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    English,
    Korean,
}

impl SearchField {
    fn column(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Korean => "korean",
        }
    }
}

#[derive(Clone)]
pub struct Admin {
    db: Arc<dyn Database>,
}

impl Admin {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Every word ordered by id.
    pub async fn all_words(&self) -> DbResult<Vec<Word>> {
        self.fetch_all(Query::table(tables::WORDS).select(WORD_COLUMNS))
            .await
    }

    /// Words whose `field` contains `term`, ignoring case. A blank term matches every word.
    pub async fn search(&self, field: SearchField, term: &str) -> DbResult<Vec<Word>> {
        let term = term.trim();
        let mut query = Query::table(tables::WORDS).select(WORD_COLUMNS);
        if !term.is_empty() {
            tracing::info!("Searching words by {} for {term}", field.column());
            query = query.ilike(field.column(), &format!("%{term}%"));
        }
        self.fetch_all(query).await
    }

    /// Overwrites the english and korean text of a word, returning false if it does not exist.
    pub async fn update_word(&self, id: i32, english: &str, korean: &str) -> DbResult<bool> {
        tracing::info!("Updating word {id}");
        let update = req::UpdateWord {
            english: english.trim().into(),
            korean: korean.trim().into(),
        };
        let query = Query::table(tables::WORDS).eq("id", id);
        let updated = self.db.update(&query, serde_json::to_value(&update)?).await?;
        if updated == 0 {
            tracing::warn!("Word {id} does not exist");
        }
        Ok(updated > 0)
    }

    async fn fetch_all(&self, query: Query) -> DbResult<Vec<Word>> {
        let (words, err) = fetch_remaining(&*self.db, &query, None, 0).await;
        match err {
            Some(err) => Err(err),
            None => Ok(words),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::MemoryDatabase;
    use serde_json::json;

    fn admin() -> (MemoryDatabase, Admin) {
        let db = MemoryDatabase::new();
        db.seed(
            "words",
            [
                json!({ "english": "Apple", "korean": "사과" }),
                json!({ "english": "pineapple", "korean": "파인애플" }),
                json!({ "english": "cherry", "korean": "체리", "is_suneung": true }),
            ],
        )
        .unwrap();
        let admin = Admin::new(Arc::new(db.clone()));
        (db, admin)
    }

    fn english(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.english.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_every_word() {
        let (_db, admin) = admin();
        let words = admin.all_words().await.unwrap();
        assert_eq!(english(&words), &["Apple", "pineapple", "cherry"]);
        assert_eq!(words[2].categories, &["수능"]);
    }

    #[tokio::test]
    async fn searches_case_insensitively() {
        let (_db, admin) = admin();
        let words = admin.search(SearchField::English, "APPLE").await.unwrap();
        assert_eq!(english(&words), &["Apple", "pineapple"]);
        let words = admin.search(SearchField::Korean, "체").await.unwrap();
        assert_eq!(english(&words), &["cherry"]);
        let words = admin.search(SearchField::English, " ").await.unwrap();
        assert_eq!(words.len(), 3);
    }

    #[tokio::test]
    async fn updates_words() {
        let (db, admin) = admin();
        assert!(admin.update_word(2, " pine apple ", "파인애플").await.unwrap());
        assert_eq!(db.rows("words")[1]["english"], "pine apple");
        assert!(!admin.update_word(99, "x", "y").await.unwrap());
    }
}
