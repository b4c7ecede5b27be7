//! Turns a category key into the queries that load its words.

use crate::database::{fetch_one, Database, DbError, Query};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use voca::{CategoryRegistry, CategorySpec};
use voca_api::{response as res, tables, WORD_COLUMNS};

/// An informational outcome of a load that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The category is listed but its data has not been prepared yet.
    NotReady { grade: String },
    /// The named category row does not exist.
    CategoryNotFound { name: String },
    /// The category exists but has no words.
    Empty,
    /// The key is not a known category.
    UnknownCategory { key: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady { grade } => write!(
                f,
                "한자 {grade} 데이터 준비 중입니다. 곧 업데이트될 예정입니다."
            ),
            Self::CategoryNotFound { name } => {
                write!(f, "{name} 카테고리를 찾을 수 없습니다.")
            }
            Self::Empty => write!(f, "카테고리에 등록된 단어가 없습니다."),
            Self::UnknownCategory { key } => write!(f, "알 수 없는 카테고리입니다: {key}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Notice(Notice),
    #[error(transparent)]
    Database(#[from] DbError),
}

/// The queries a category's words are loaded with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCategory {
    /// Selects the category's words. Ordering and range are added by the loader.
    pub words: Query,
    /// Counts the category's words.
    pub count: Query,
    /// Appended to the categories of every loaded word.
    pub joined_tag: Option<String>,
}

#[async_trait]
pub trait CategoryFilter: Send + Sync + fmt::Debug {
    async fn resolve(&self, db: &dyn Database) -> Result<ResolvedCategory, ResolveError>;
}

fn words_query() -> Query {
    Query::table(tables::WORDS).select(WORD_COLUMNS)
}

/// Every word.
#[derive(Debug, Clone, Copy)]
pub struct AllWords;

#[async_trait]
impl CategoryFilter for AllWords {
    async fn resolve(&self, _db: &dyn Database) -> Result<ResolvedCategory, ResolveError> {
        Ok(ResolvedCategory {
            words: words_query(),
            count: Query::table(tables::WORDS).select(&["id"]),
            joined_tag: None,
        })
    }
}

/// Words whose boolean `column` is set.
#[derive(Debug, Clone)]
pub struct FlagBackedCategory {
    pub column: String,
}

#[async_trait]
impl CategoryFilter for FlagBackedCategory {
    async fn resolve(&self, _db: &dyn Database) -> Result<ResolvedCategory, ResolveError> {
        Ok(ResolvedCategory {
            words: words_query().eq(&self.column, true),
            count: Query::table(tables::WORDS)
                .select(&["id"])
                .eq(&self.column, true),
            // the flag columns already produce the tag
            joined_tag: None,
        })
    }
}

/// Words linked to the category called `name` through `word_categories`.
#[derive(Debug, Clone)]
pub struct JoinBackedCategory {
    pub name: String,
}

#[async_trait]
impl CategoryFilter for JoinBackedCategory {
    async fn resolve(&self, db: &dyn Database) -> Result<ResolvedCategory, ResolveError> {
        tracing::debug!("Looking up category {}", self.name);
        let lookup = Query::table(tables::CATEGORIES)
            .select(&["id", "name"])
            .eq("name", self.name.as_str());
        let Some(category) = fetch_one::<res::Category>(db, &lookup).await? else {
            tracing::warn!("Category {} does not exist", self.name);
            return Err(ResolveError::Notice(Notice::CategoryNotFound {
                name: self.name.clone(),
            }));
        };

        Ok(ResolvedCategory {
            words: words_query().related(
                tables::WORD_CATEGORIES,
                "word_id",
                "category_id",
                category.id,
            ),
            count: Query::table(tables::WORD_CATEGORIES)
                .select(&["word_id"])
                .eq("category_id", category.id),
            joined_tag: Some(self.name.clone()),
        })
    }
}

/// A category whose data is not available yet. Resolving it never touches the database.
#[derive(Debug, Clone)]
pub struct PendingCategory {
    pub grade: String,
}

#[async_trait]
impl CategoryFilter for PendingCategory {
    async fn resolve(&self, _db: &dyn Database) -> Result<ResolvedCategory, ResolveError> {
        Err(ResolveError::Notice(Notice::NotReady {
            grade: self.grade.clone(),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct UnknownCategory {
    pub key: String,
}

#[async_trait]
impl CategoryFilter for UnknownCategory {
    async fn resolve(&self, _db: &dyn Database) -> Result<ResolvedCategory, ResolveError> {
        Err(ResolveError::Notice(Notice::UnknownCategory {
            key: self.key.clone(),
        }))
    }
}

/// The filter for `key`, or every word if there is no key.
pub fn category_filter(registry: &CategoryRegistry, key: Option<&str>) -> Box<dyn CategoryFilter> {
    let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
        return Box::new(AllWords);
    };
    match registry.lookup(key) {
        Some(CategorySpec::Flag { column, .. }) => Box::new(FlagBackedCategory {
            column: column.clone(),
        }),
        Some(CategorySpec::Joined { name }) => Box::new(JoinBackedCategory { name: name.clone() }),
        Some(CategorySpec::Pending { grade }) => Box::new(PendingCategory {
            grade: grade.clone(),
        }),
        None => Box::new(UnknownCategory {
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::{Filter, MemoryDatabase};
    use serde_json::json;

    async fn resolve(db: &MemoryDatabase, key: Option<&str>) -> Result<ResolvedCategory, ResolveError> {
        let registry = CategoryRegistry::standard();
        category_filter(&registry, key).resolve(db).await
    }

    #[tokio::test]
    async fn flag_category_filters_on_column() {
        let db = MemoryDatabase::new();
        let resolved = resolve(&db, Some("TOEFL")).await.unwrap();
        assert_eq!(
            resolved.words.filters,
            &[Filter::Eq {
                column: "is_toefl".to_string(),
                value: json!(true),
            }]
        );
        assert_eq!(resolved.joined_tag, None);
        assert!(db.operations().is_empty());
    }

    #[tokio::test]
    async fn join_category_looks_up_the_category_row() {
        let db = MemoryDatabase::new();
        db.seed(
            "categories",
            [json!({ "name": "THAI" }), json!({ "name": "KOREAN" })],
        )
        .unwrap();
        let resolved = resolve(&db, Some("kr-en-basic")).await.unwrap();
        assert_eq!(resolved.joined_tag.as_deref(), Some("KOREAN"));
        assert_eq!(
            resolved.words.filters,
            &[Filter::Related {
                table: "word_categories".to_string(),
                foreign_key: "word_id".to_string(),
                column: "category_id".to_string(),
                value: json!(2),
            }]
        );
        assert_eq!(resolved.count.table, "word_categories");
        assert_eq!(db.operations().len(), 1);
        assert_eq!(db.operations()[0].table(), "categories");
    }

    #[tokio::test]
    async fn missing_category_row() {
        let db = MemoryDatabase::new();
        let err = resolve(&db, Some("thai")).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Notice(Notice::CategoryNotFound { ref name }) if name == "THAI"
        ));
    }

    #[tokio::test]
    async fn pending_and_unknown_categories() {
        let db = MemoryDatabase::new();
        let err = resolve(&db, Some("hanja-5")).await.unwrap_err();
        assert_eq!(err.to_string(), "한자 5급 데이터 준비 중입니다. 곧 업데이트될 예정입니다.");
        let err = resolve(&db, Some("ielts")).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Notice(Notice::UnknownCategory { .. })
        ));
        assert!(db.operations().is_empty());
    }

    #[tokio::test]
    async fn no_key_is_every_word() {
        let db = MemoryDatabase::new();
        for key in [None, Some(""), Some("  ")] {
            let resolved = resolve(&db, key).await.unwrap();
            assert!(resolved.words.filters.is_empty());
        }
    }

    #[tokio::test]
    async fn lookup_failure_is_a_database_error() {
        let db = MemoryDatabase::new();
        db.inject_failure("categories");
        let err = resolve(&db, Some("korean")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Database(_)));
    }
}
