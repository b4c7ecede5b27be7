//! The database surface the rest of the client is written against.
//!
//! Queries are plain data built with [`Query`]'s chaining methods. [`RestDatabase`] renders them
//! into PostgREST requests and [`MemoryDatabase`] evaluates them against in-process tables.

mod memory;
mod rest;

pub use self::{
    memory::{MemoryDatabase, Operation},
    rest::{query_pairs, RestDatabase},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request failed: HTTP {status} {message}")]
    Status { status: u16, message: String },
    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The response did not include a row count")]
    MissingCount,
    #[error("{0}")]
    Other(String),
}

/// A single condition on a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq {
        column: String,
        value: Value,
    },
    /// Case-insensitive `LIKE` where `%` matches any run of characters and `_` any one character.
    ILike {
        column: String,
        pattern: String,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    /// Matches if any of the inner filters match.
    Or(Vec<Filter>),
    /// Matches rows referenced by at least one row of `table` whose `column` equals `value`,
    /// where `table.foreign_key` points at the row's `id`.
    Related {
        table: String,
        foreign_key: String,
        column: String,
        value: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Selected columns, all columns if empty.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            offset: 0,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters.push(Filter::ILike {
            column: column.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn in_<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    pub fn related(
        mut self,
        table: &str,
        foreign_key: &str,
        column: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::Related {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Restricts the result to the rows `from..=to`.
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.offset = from;
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Rows matching `query` as JSON objects.
    async fn select(&self, query: &Query) -> DbResult<Vec<Value>>;

    /// The number of rows matching `query`'s filters, ignoring its range.
    async fn count(&self, query: &Query) -> DbResult<u64>;

    /// Inserts `rows` into `table`, returning the `returning` columns of the inserted rows.
    /// Nothing is returned if `returning` is empty.
    async fn insert(&self, table: &str, rows: Vec<Value>, returning: &[&str])
        -> DbResult<Vec<Value>>;

    /// Applies `patch` to the rows matching `query`'s filters, returning how many were changed.
    async fn update(&self, query: &Query, patch: Value) -> DbResult<u64>;

    /// Deletes the rows matching `query`'s filters, returning how many were deleted.
    async fn delete(&self, query: &Query) -> DbResult<u64>;
}

/// Selects and deserializes the rows matching `query`.
pub async fn fetch<T>(db: &dyn Database, query: &Query) -> DbResult<Vec<T>>
where
    T: DeserializeOwned,
{
    let rows = db.select(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::from))
        .collect()
}

/// Selects the first row matching `query`, if any.
pub async fn fetch_one<T>(db: &dyn Database, query: &Query) -> DbResult<Option<T>>
where
    T: DeserializeOwned,
{
    let query = query.clone().limit(1);
    Ok(fetch(db, &query).await?.into_iter().next())
}

/// Serializes and inserts `rows`, deserializing the returned columns.
pub async fn insert_rows<T, R>(
    db: &dyn Database,
    table: &str,
    rows: &[T],
    returning: &[&str],
) -> DbResult<Vec<R>>
where
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    let rows = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let inserted = db.insert(table, rows, returning).await?;
    inserted
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(DbError::from))
        .collect()
}
