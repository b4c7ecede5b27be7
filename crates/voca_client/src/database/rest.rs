//! A [`Database`] backed by a PostgREST endpoint such as Supabase's `/rest/v1`.

use super::{Database, DbError, DbResult, Filter, Query};
use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response};
use serde_json::Value;
use voca_api::response as res;

#[derive(Debug, Clone)]
pub struct RestDatabase {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestDatabase {
    /// `base_url` is the project url, without the `/rest/v1` suffix.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn assert_success(res: Response) -> DbResult<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let bytes = res.bytes().await.unwrap_or_default();
        let message = match serde_json::from_slice::<res::Error>(&bytes) {
            Ok(error) => error.message,
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };
        tracing::warn!("Database returned HTTP {status}: {message}");
        Err(DbError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Renders a value the way PostgREST expects it inside a filter.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Quotes `value` if it contains characters reserved inside `in.(...)` and `or=(...)` lists.
fn list_item(value: &Value) -> String {
    let raw = literal(value);
    if raw.contains([',', '(', ')', '"', ':']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// The operator part of a filter such as `eq.5`, for filters that apply to a single column.
fn condition(filter: &Filter) -> Option<(String, String)> {
    match filter {
        Filter::Eq { column, value } if value.is_null() => {
            Some((column.clone(), "is.null".to_string()))
        }
        Filter::Eq { column, value } => Some((column.clone(), format!("eq.{}", literal(value)))),
        Filter::ILike { column, pattern } => Some((column.clone(), format!("ilike.{pattern}"))),
        Filter::In { column, values } => {
            let values = values.iter().map(list_item).collect::<Vec<_>>().join(",");
            Some((column.clone(), format!("in.({values})")))
        }
        Filter::Related {
            table,
            column,
            value,
            ..
        } => Some((format!("{table}.{column}"), format!("eq.{}", literal(value)))),
        Filter::Or(_) => None,
    }
}

fn filter_pair(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Or(filters) => {
            let inner = filters
                .iter()
                .filter_map(condition)
                .map(|(column, condition)| {
                    // inside a logical group values are list items
                    match condition.split_once('.') {
                        Some((op, value)) if op == "eq" || op == "ilike" => {
                            format!("{column}.{op}.{}", list_item(&Value::from(value)))
                        }
                        _ => format!("{column}.{condition}"),
                    }
                })
                .collect::<Vec<_>>()
                .join(",");
            ("or".to_string(), format!("({inner})"))
        }
        other => condition(other).unwrap_or_default(),
    }
}

/// The query string parameters `query` is sent with.
///
/// Related filters embed the related table with an inner join so that only rows with a matching
/// related row are returned.
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut select = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query.columns.join(",")
    };
    for filter in &query.filters {
        if let Filter::Related { table, column, .. } = filter {
            select.push_str(&format!(",{table}!inner({column})"));
        }
    }

    let mut pairs = vec![("select".to_string(), select)];
    pairs.extend(query.filters.iter().map(filter_pair));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if query.offset > 0 {
        pairs.push(("offset".to_string(), query.offset.to_string()));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

/// Filter parameters only, for writes.
fn filter_pairs(query: &Query) -> Vec<(String, String)> {
    query.filters.iter().map(filter_pair).collect()
}

/// Parses the total out of a `Content-Range` header such as `0-49/1234` or `*/1234`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl Database for RestDatabase {
    async fn select(&self, query: &Query) -> DbResult<Vec<Value>> {
        tracing::debug!("Selecting from {}", query.table);

        let res = self
            .authorize(self.client.get(self.url(&query.table)))
            .query(&query_pairs(query))
            .send()
            .await?;
        let res = Self::assert_success(res).await?;
        let rows: Vec<Value> = res.json().await?;

        tracing::debug!("Selected {} rows from {}", rows.len(), query.table);
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> DbResult<u64> {
        tracing::debug!("Counting rows in {}", query.table);

        let mut pairs = query_pairs(query);
        pairs.retain(|(key, _)| key != "offset" && key != "limit" && key != "order");
        let res = self
            .authorize(self.client.head(self.url(&query.table)))
            .header("Prefer", "count=exact")
            .query(&pairs)
            .send()
            .await?;
        let res = Self::assert_success(res).await?;
        let count = res
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or(DbError::MissingCount)?;

        tracing::debug!("Counted {count} rows in {}", query.table);
        Ok(count)
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<Value>,
        returning: &[&str],
    ) -> DbResult<Vec<Value>> {
        tracing::debug!("Inserting {} rows into {table}", rows.len());

        let mut builder = self
            .authorize(self.client.post(self.url(table)))
            .json(&rows);
        if returning.is_empty() {
            builder = builder.header("Prefer", "return=minimal");
        } else {
            builder = builder
                .header("Prefer", "return=representation")
                .query(&[("select", returning.join(","))]);
        }
        let res = Self::assert_success(builder.send().await?).await?;
        if returning.is_empty() {
            return Ok(Vec::new());
        }
        let inserted: Vec<Value> = res.json().await?;

        tracing::debug!("Inserted {} rows into {table}", inserted.len());
        Ok(inserted)
    }

    async fn update(&self, query: &Query, patch: Value) -> DbResult<u64> {
        tracing::debug!("Updating rows in {}", query.table);

        let res = self
            .authorize(self.client.patch(self.url(&query.table)))
            .header("Prefer", "return=representation")
            .query(&filter_pairs(query))
            .json(&patch)
            .send()
            .await?;
        let res = Self::assert_success(res).await?;
        let updated: Vec<Value> = res.json().await?;

        tracing::debug!("Updated {} rows in {}", updated.len(), query.table);
        Ok(updated.len() as u64)
    }

    async fn delete(&self, query: &Query) -> DbResult<u64> {
        tracing::debug!("Deleting rows from {}", query.table);

        let res = self
            .authorize(self.client.delete(self.url(&query.table)))
            .header("Prefer", "return=representation")
            .query(&filter_pairs(query))
            .send()
            .await?;
        let res = Self::assert_success(res).await?;
        let deleted: Vec<Value> = res.json().await?;

        tracing::debug!("Deleted {} rows from {}", deleted.len(), query.table);
        Ok(deleted.len() as u64)
    }
}
