//! In-process tables that record every operation made against them.

use super::{Database, DbError, DbResult, Filter, Query};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use uuid::Uuid;
use voca_api::tables;

type Row = Map<String, Value>;

/// Record of an operation for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select(Query),
    Count(Query),
    Insert { table: String, rows: usize },
    Update(Query),
    Delete(Query),
}

impl Operation {
    pub fn table(&self) -> &str {
        match self {
            Self::Select(query) | Self::Count(query) | Self::Update(query) | Self::Delete(query) => {
                &query.table
            }
            Self::Insert { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Ids {
    #[default]
    Serial,
    Uuid,
}

#[derive(Debug, Clone, Copy, Default)]
struct Schema {
    ids: Ids,
    timestamps: bool,
}

#[derive(Debug, Clone)]
struct FailureRule {
    table: String,
    from_offset: usize,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Vec<Row>>,
    schemas: BTreeMap<String, Schema>,
    next_ids: BTreeMap<String, i64>,
    last_micros: i64,
    operations: Vec<Operation>,
    failures: Vec<FailureRule>,
}

impl State {
    /// The current time, strictly after every time handed out before.
    fn tick(&mut self) -> String {
        let micros = Utc::now().timestamp_micros().max(self.last_micros + 1);
        self.last_micros = micros;
        let time = DateTime::<Utc>::default() + chrono::Duration::microseconds(micros);
        time.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn insert(&mut self, table: &str, value: Value) -> DbResult<Row> {
        let Value::Object(mut row) = value else {
            return Err(DbError::Other(format!(
                "Cannot insert a non-object row into {table}"
            )));
        };
        let schema = self.schemas.get(table).copied().unwrap_or_default();
        match schema.ids {
            Ids::Serial => {
                let next = self.next_ids.entry(table.to_string()).or_insert(1);
                match row.get("id").and_then(Value::as_i64) {
                    Some(id) => *next = (*next).max(id + 1),
                    None => {
                        row.insert("id".to_string(), Value::from(*next));
                        *next += 1;
                    }
                }
            }
            Ids::Uuid => {
                row.entry("id")
                    .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            }
        }
        if schema.timestamps {
            let now = self.tick();
            for column in ["created_at", "updated_at"] {
                row.entry(column)
                    .or_insert_with(|| Value::String(now.clone()));
            }
        }
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    /// Indices of the rows of `query.table` matching every filter of `query`.
    fn matching(&self, query: &Query) -> Vec<usize> {
        let Some(rows) = self.tables.get(&query.table) else {
            return Vec::new();
        };
        rows.iter()
            .enumerate()
            .filter(|(_, row)| query.filters.iter().all(|f| self.matches(row, f)))
            .map(|(i, _)| i)
            .collect()
    }

    fn matches(&self, row: &Row, filter: &Filter) -> bool {
        match filter {
            Filter::Eq { column, value } => match row.get(column) {
                Some(found) => values_equal(found, value),
                None => value.is_null(),
            },
            Filter::ILike { column, pattern } => row
                .get(column)
                .and_then(Value::as_str)
                .is_some_and(|text| {
                    let text = text.to_lowercase().chars().collect::<Vec<_>>();
                    let pattern = pattern.to_lowercase().chars().collect::<Vec<_>>();
                    like(&text, &pattern)
                }),
            Filter::In { column, values } => row
                .get(column)
                .is_some_and(|found| values.iter().any(|v| values_equal(found, v))),
            Filter::Or(filters) => filters.iter().any(|f| self.matches(row, f)),
            Filter::Related {
                table,
                foreign_key,
                column,
                value,
            } => {
                let Some(id) = row.get("id") else {
                    return false;
                };
                self.tables.get(table).is_some_and(|related| {
                    related.iter().any(|r| {
                        r.get(foreign_key).is_some_and(|fk| values_equal(fk, id))
                            && r.get(column).is_some_and(|v| values_equal(v, value))
                    })
                })
            }
        }
    }

    fn check_failure(&self, table: &str, offset: usize) -> DbResult<()> {
        let failing = self
            .failures
            .iter()
            .any(|rule| rule.table == table && offset >= rule.from_offset);
        if failing {
            tracing::debug!("Injected failure on {table} at offset {offset}");
            return Err(DbError::Other(format!(
                "Injected failure on {table} at offset {offset}"
            )));
        }
        Ok(())
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

/// SQL `LIKE` matching.
fn like(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like(&text[1..], rest),
    }
}

/// Ascending order with nulls last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn project(row: &Row, columns: &[String]) -> Value {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return Value::Object(row.clone());
    }
    let projected = columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect::<Row>();
    Value::Object(projected)
}

/// A [`Database`] kept in memory.
///
/// Clones share the same tables. Comments get uuid ids and timestamps on insert, every other
/// table gets serial ids.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
    latency: Option<Duration>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        let mut state = State::default();
        state.schemas.insert(
            tables::COMMENTS.to_string(),
            Schema {
                ids: Ids::Uuid,
                timestamps: true,
            },
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            latency: None,
        }
    }

    /// Delays every operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Inserts rows without recording an operation.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) -> DbResult<()> {
        let mut state = self.lock();
        for row in rows {
            state.insert(table, row)?;
        }
        Ok(())
    }

    /// Every row of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Makes every operation on `table` fail.
    pub fn inject_failure(&self, table: &str) {
        self.inject_failure_from_offset(table, 0);
    }

    /// Makes selects on `table` starting at `offset` or later fail.
    ///
    /// Other operations on the table are unaffected unless `offset` is zero.
    pub fn inject_failure_from_offset(&self, table: &str, offset: usize) {
        self.lock().failures.push(FailureRule {
            table: table.to_string(),
            from_offset: offset,
        });
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn select(&self, query: &Query) -> DbResult<Vec<Value>> {
        self.delay().await;
        let mut state = self.lock();
        state.operations.push(Operation::Select(query.clone()));
        state.check_failure(&query.table, query.offset)?;

        let Some(rows) = state.tables.get(&query.table) else {
            return Ok(Vec::new());
        };
        let mut hits = state
            .matching(query)
            .into_iter()
            .map(|i| &rows[i])
            .collect::<Vec<_>>();
        if let Some(order) = &query.order {
            hits.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        let selected = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| project(row, &query.columns))
            .collect::<Vec<_>>();
        tracing::trace!("Selected {} rows from {}", selected.len(), query.table);
        Ok(selected)
    }

    async fn count(&self, query: &Query) -> DbResult<u64> {
        self.delay().await;
        let mut state = self.lock();
        state.operations.push(Operation::Count(query.clone()));
        state.check_failure(&query.table, 0)?;
        Ok(state.matching(query).len() as u64)
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<Value>,
        returning: &[&str],
    ) -> DbResult<Vec<Value>> {
        self.delay().await;
        let mut state = self.lock();
        state.operations.push(Operation::Insert {
            table: table.to_string(),
            rows: rows.len(),
        });
        state.check_failure(table, 0)?;

        let columns = returning.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let mut inserted = Vec::new();
        for row in rows {
            let row = state.insert(table, row)?;
            if !returning.is_empty() {
                inserted.push(project(&row, &columns));
            }
        }
        Ok(inserted)
    }

    async fn update(&self, query: &Query, patch: Value) -> DbResult<u64> {
        self.delay().await;
        let mut state = self.lock();
        state.operations.push(Operation::Update(query.clone()));
        state.check_failure(&query.table, 0)?;

        let Value::Object(patch) = patch else {
            return Err(DbError::Other("Update patch must be an object".to_string()));
        };
        let hits = state.matching(query);
        let timestamps = state
            .schemas
            .get(&query.table)
            .is_some_and(|schema| schema.timestamps);
        let now = if timestamps && !hits.is_empty() {
            Some(state.tick())
        } else {
            None
        };
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for &i in &hits {
                let row = &mut rows[i];
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                if let Some(now) = &now {
                    row.insert("updated_at".to_string(), Value::String(now.clone()));
                }
            }
        }
        Ok(hits.len() as u64)
    }

    async fn delete(&self, query: &Query) -> DbResult<u64> {
        self.delay().await;
        let mut state = self.lock();
        state.operations.push(Operation::Delete(query.clone()));
        state.check_failure(&query.table, 0)?;

        let hits = state.matching(query);
        if let Some(rows) = state.tables.get_mut(&query.table) {
            let mut index = 0;
            rows.retain(|_| {
                let keep = !hits.contains(&index);
                index += 1;
                keep
            });
        }
        Ok(hits.len() as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn words() -> MemoryDatabase {
        let db = MemoryDatabase::new();
        db.seed(
            "words",
            [
                json!({ "english": "apple", "korean": "사과", "is_toeic": true }),
                json!({ "english": "Banana", "korean": "바나나", "is_toeic": false }),
                json!({ "english": "cherry", "korean": null, "is_toeic": true }),
            ],
        )
        .unwrap();
        db
    }

    fn ids(rows: &[Value]) -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn filters_orders_and_pages() {
        let db = words();
        let toeic = db
            .select(&Query::table("words").eq("is_toeic", true).order("id", false))
            .await
            .unwrap();
        assert_eq!(ids(&toeic), &[3, 1]);

        let page = db
            .select(&Query::table("words").order("id", true).range(1, 5))
            .await
            .unwrap();
        assert_eq!(ids(&page), &[2, 3]);

        let projected = db
            .select(&Query::table("words").select(&["english"]).eq("id", 1))
            .await
            .unwrap();
        assert_eq!(projected, &[json!({ "english": "apple" })]);
    }

    #[tokio::test]
    async fn ilike_or_and_in() {
        let db = words();
        let found = db
            .select(&Query::table("words").ilike("english", "%AN%"))
            .await
            .unwrap();
        assert_eq!(ids(&found), &[2]);

        let found = db
            .select(&Query::table("words").ilike("english", "_pple"))
            .await
            .unwrap();
        assert_eq!(ids(&found), &[1]);

        let either = db
            .select(&Query::table("words").or(vec![
                Filter::Eq {
                    column: "english".to_string(),
                    value: json!("cherry"),
                },
                Filter::ILike {
                    column: "korean".to_string(),
                    pattern: "사%".to_string(),
                },
            ]))
            .await
            .unwrap();
        assert_eq!(ids(&either), &[1, 3]);

        let listed = db
            .select(&Query::table("words").in_("id", [3, 2]))
            .await
            .unwrap();
        assert_eq!(ids(&listed), &[2, 3]);
    }

    #[tokio::test]
    async fn related_rows() {
        let db = words();
        db.seed(
            "word_categories",
            [
                json!({ "word_id": 2, "category_id": 7 }),
                json!({ "word_id": 3, "category_id": 8 }),
            ],
        )
        .unwrap();
        let query = Query::table("words").related("word_categories", "word_id", "category_id", 7);
        assert_eq!(ids(&db.select(&query).await.unwrap()), &[2]);
        assert_eq!(db.count(&query).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn nulls_sort_last() {
        let db = words();
        let rows = db
            .select(&Query::table("words").order("korean", true))
            .await
            .unwrap();
        assert_eq!(ids(&rows), &[2, 1, 3]);
    }

    #[tokio::test]
    async fn insert_update_delete() {
        let db = words();
        let inserted = db
            .insert(
                "words",
                vec![json!({ "english": "lemon" }), json!({ "english": "melon" })],
                &["id"],
            )
            .await
            .unwrap();
        assert_eq!(inserted, &[json!({ "id": 4 }), json!({ "id": 5 })]);

        let updated = db
            .update(&Query::table("words").eq("id", 4), json!({ "korean": "레몬" }))
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(db.rows("words")[3]["korean"], "레몬");

        let deleted = db
            .delete(&Query::table("words").eq("is_toeic", true))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(ids(&db.rows("words")), &[2, 4, 5]);

        let none = db
            .insert("words", vec![json!({ "english": "kiwi" })], &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn comments_get_uuids_and_increasing_timestamps() {
        let db = MemoryDatabase::new();
        let rows = db
            .insert(
                "comments",
                vec![
                    json!({ "word_id": 1, "content": "a", "author": "x" }),
                    json!({ "word_id": 1, "content": "b", "author": "y" }),
                ],
                &["*"],
            )
            .await
            .unwrap();
        assert!(Uuid::parse_str(rows[0]["id"].as_str().unwrap()).is_ok());
        let first = rows[0]["created_at"].as_str().unwrap();
        let second = rows[1]["created_at"].as_str().unwrap();
        assert!(first < second);
        assert_eq!(rows[0]["created_at"], rows[0]["updated_at"]);
    }

    #[tokio::test]
    async fn records_operations_and_injects_failures() {
        let db = words();
        db.inject_failure_from_offset("words", 2);

        let query = Query::table("words").range(0, 1);
        assert!(db.select(&query).await.is_ok());
        assert!(db.count(&query).await.is_ok());
        assert!(db.select(&Query::table("words").range(2, 3)).await.is_err());

        db.inject_failure("categories");
        assert!(db.insert("categories", vec![json!({})], &[]).await.is_err());

        let operations = db.operations();
        assert_eq!(operations.len(), 4);
        assert_eq!(operations[0], Operation::Select(query.clone()));
        assert_eq!(operations[1], Operation::Count(query));
        assert_eq!(operations[3].table(), "categories");

        db.clear_failures();
        db.clear_operations();
        assert!(db.select(&Query::table("words").range(2, 3)).await.is_ok());
        assert_eq!(db.operations().len(), 1);
    }

    #[tokio::test]
    async fn latency_delays_operations() {
        let db = words().with_latency(Duration::from_millis(20));
        let start = std::time::Instant::now();
        db.count(&Query::table("words")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn like_patterns() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert!(like(&chars("hello"), &chars("%ell%")));
        assert!(like(&chars("hello"), &chars("h_llo")));
        assert!(like(&chars(""), &chars("%")));
        assert!(!like(&chars("hello"), &chars("%z%")));
        assert!(!like(&chars("hello"), &chars("hell")));
    }
}
