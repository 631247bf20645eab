use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{MarketError, Result};
use crate::ports::store::{Filter, Query, Row, TableStore, now_timestamp};

/// Process-local tables, used in development and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(table: &str) -> MarketError {
    tracing::error!("Memory store lock poisoned while accessing '{table}'");
    MarketError::storage(format!("almacenamiento en memoria no disponible ({table})"))
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        let tables = self.tables.read().map_err(|_| poisoned(table))?;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| row_matches(row, f)))
            .collect();

        if let Some(ref order) = query.order {
            // Stable sort keeps insertion order on ties; reversing afterwards
            // puts the newest of a tie first as well.
            matched.sort_by(|a, b| compare(a.get(&order.field), b.get(&order.field)));
            if order.descending {
                matched.reverse();
            }
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        let now = now_timestamp();
        if !row.get("id").is_some_and(Value::is_string) {
            row.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        row.entry("created_at")
            .or_insert_with(|| Value::String(now.clone()));
        row.entry("updated_at").or_insert_with(|| Value::String(now));

        let mut tables = self.tables.write().map_err(|_| poisoned(table))?;
        tables.entry(table.to_string()).or_default().push(row.clone());
        tracing::debug!(table, "Inserted row");
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row> {
        let mut tables = self.tables.write().map_err(|_| poisoned(table))?;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| {
                MarketError::storage(format!("no existe la fila '{id}' en {table}"))
            })?;

        for (key, value) in changes {
            if key != "id" {
                row.insert(key, value);
            }
        }
        tracing::debug!(table, id, "Updated row");
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned(table))?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        tracing::debug!(table, id, "Deleted row");
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn row_matches(row: &Row, filter: &Filter) -> bool {
    let value = row.get(filter.field());
    match filter {
        Filter::Eq(_, expected) => value.is_some_and(|v| loosely_equal(v, expected)),
        Filter::In(_, options) => {
            value.is_some_and(|v| options.iter().any(|o| loosely_equal(v, o)))
        }
        Filter::Gte(_, bound) => {
            value.is_some_and(|v| compare(Some(v), Some(bound)) != Ordering::Less)
        }
        Filter::Lte(_, bound) => {
            value.is_some_and(|v| compare(Some(v), Some(bound)) != Ordering::Greater)
        }
        Filter::ILike(_, needle) => value
            .and_then(Value::as_str)
            .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
    }
}

// Numbers compare by value so `4` and `4.0` are the same capacity.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

/// Total order over the scalar values a column can hold. Missing and null
/// sort first.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
