use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::config::types::StorageConfig;
use crate::error::{MarketError, Result};
use crate::ports::store::{Filter, Query, Row, TableStore};

/// `TableStore` over a PostgREST endpoint such as the one Supabase exposes.
pub struct PostgrestStore {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| MarketError::Config("storage.url is not set".into()))?;
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| MarketError::Config("storage.api_key is not set".into()))?;
        Self::new(url, key, Duration::from_secs(config.request_timeout_secs))
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/rest/v1/{table}", self.base_url))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    /// Send, check the status, and decode the JSON array PostgREST answers with.
    async fn rows(&self, table: &str, builder: RequestBuilder) -> Result<Vec<Row>> {
        let response = builder.send().await.map_err(MarketError::Http)?;
        let response = check_status(table, response).await?;

        let body = response.text().await.map_err(MarketError::Http)?;
        debug!(table, body_len = body.len(), "PostgREST response received");
        trace!(table, body = %body, "PostgREST raw response");

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Row> = serde_json::from_str(&body).map_err(|e| {
            MarketError::storage(format!("respuesta inesperada de {table}: {e}"))
        })?;
        Ok(rows)
    }

    fn by_id(&self, table: &str, id: &str) -> Result<Url> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }
}

async fn check_status(table: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));
    debug!(table, %status, detail = %detail, "PostgREST request failed");
    Err(MarketError::storage(detail))
}

/// Encode a query as PostgREST URL parameters.
pub fn encode_query(url: &mut Url, query: &Query) {
    let mut pairs = url.query_pairs_mut();
    pairs.append_pair("select", "*");
    for filter in &query.filters {
        let encoded = match filter {
            Filter::Eq(_, v) => format!("eq.{}", scalar(v)),
            Filter::In(_, values) => {
                let list: Vec<String> = values.iter().map(quoted).collect();
                format!("in.({})", list.join(","))
            }
            Filter::Gte(_, v) => format!("gte.{}", scalar(v)),
            Filter::Lte(_, v) => format!("lte.{}", scalar(v)),
            Filter::ILike(_, needle) => format!("ilike.*{}*", escape_like(needle)),
        };
        pairs.append_pair(filter.field(), &encoded);
    }
    if let Some(ref order) = query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        pairs.append_pair("order", &format!("{}.{direction}", order.field));
    }
    if let Some(limit) = query.limit {
        pairs.append_pair("limit", &limit.to_string());
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".into(),
        other => other.to_string(),
    }
}

// `_` and `\` are LIKE metacharacters in PostgreSQL; `*` and `%` never reach
// here because `Query::ilike` drops them.
fn escape_like(needle: &str) -> String {
    needle.replace('\\', "\\\\").replace('_', "\\_")
}

// Strings inside `in.(...)` are double-quoted so commas and dots survive.
fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => scalar(other),
    }
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        let mut url = self.table_url(table)?;
        encode_query(&mut url, query);
        debug!(url = %url, "PostgREST select");
        self.rows(table, self.request(Method::GET, url)).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let url = self.table_url(table)?;
        debug!(table, "PostgREST insert");
        let builder = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&row);
        self.rows(table, builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::storage(format!("{table}: la inserción no devolvió filas")))
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row> {
        let url = self.by_id(table, id)?;
        debug!(table, id, "PostgREST update");
        let builder = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&changes);
        self.rows(table, builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::storage(format!("no existe la fila '{id}' en {table}")))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let url = self.by_id(table, id)?;
        debug!(table, id, "PostgREST delete");
        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(MarketError::Http)?;
        check_status(table, response).await?;
        Ok(())
    }
}
