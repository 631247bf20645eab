use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Timestamp in the shape the managed backend returns for `created_at` and
/// `updated_at`.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// One stored record: a JSON object keyed by wire column names.
pub type Row = serde_json::Map<String, Value>;

/// Single-table persistence. Implementations fill in `id`, `created_at` and
/// `updated_at` on insert when the row does not carry them.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>>;
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;
    /// Merge `changes` into the row with `id`. A missing row is an error.
    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row>;
    /// Removing a row that is already gone is not an error.
    async fn delete(&self, table: &str, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive substring match.
    ILike(String, String),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Self::Eq(f, _)
            | Self::In(f, _)
            | Self::Gte(f, _)
            | Self::Lte(f, _)
            | Self::ILike(f, _) => f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

/// Conjunction of filters plus optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn is_in<V: Into<Value>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    #[must_use]
    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(field.to_string(), value.into()));
        self
    }

    /// Substring match. Wildcard characters are dropped from `needle` so
    /// every adapter treats it as literal text.
    #[must_use]
    pub fn ilike(mut self, field: &str, needle: &str) -> Self {
        let needle: String = needle.chars().filter(|c| !matches!(c, '*' | '%')).collect();
        self.filters.push(Filter::ILike(field.to_string(), needle));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
            descending,
        });
        self
    }

    #[must_use]
    pub fn newest_first(self) -> Self {
        self.order_by("created_at", true)
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ilike_drops_wildcards() {
        let query = Query::new().ilike("ubicacion", "*Va%lle*");
        assert_eq!(
            query.filters,
            vec![Filter::ILike("ubicacion".into(), "Valle".into())]
        );
    }

    #[test]
    fn timestamps_are_utc_rfc3339() {
        let stamp = now_timestamp();
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn builder_accumulates_a_conjunction() {
        let query = Query::new()
            .eq("disponible", true)
            .ilike("ubicacion", "cali")
            .gte("capacidad", 4)
            .newest_first()
            .limit(10);

        assert_eq!(query.filters.len(), 3);
        assert_eq!(query.filters[0], Filter::Eq("disponible".into(), json!(true)));
        assert_eq!(query.filters[1].field(), "ubicacion");
        assert_eq!(
            query.order,
            Some(Order {
                field: "created_at".into(),
                descending: true
            })
        );
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn in_filter_collects_values() {
        let query = Query::new().is_in("estado", ["pendiente", "pagada"]);
        assert_eq!(
            query.filters[0],
            Filter::In("estado".into(), vec![json!("pendiente"), json!("pagada")])
        );
    }
}
