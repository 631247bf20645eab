pub mod bookings;
pub mod listings;
pub mod reviews;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{MarketError, Result};
use crate::ports::store::{Query, Row, TableStore, now_timestamp};

pub use listings::{ListingRecord, find_listing, listing_not_found};

/// A type stored one-per-row in a single table.
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Message reported when a lookup by id comes back empty.
    const NOT_FOUND: &'static str;
}

/// Generic single-table CRUD over a [`TableStore`].
pub struct Repository<T> {
    store: Arc<dyn TableStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Every row, newest first.
    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.select(&Query::new().newest_first()).await
    }

    /// `Ok(None)` when no row has `id`.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let rows = self.select(&Query::new().eq("id", id).limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing row is `NotFound`.
    pub async fn get(&self, id: &str) -> Result<T> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| MarketError::not_found(T::NOT_FOUND))
    }

    /// Equality conjunction over the given columns, newest first.
    pub async fn find_where(&self, conditions: &[(&str, Value)]) -> Result<Vec<T>> {
        let query = conditions
            .iter()
            .fold(Query::new(), |q, (field, value)| q.eq(field, value.clone()))
            .newest_first();
        self.select(&query).await
    }

    pub async fn select(&self, query: &Query) -> Result<Vec<T>> {
        let rows = self.store.select(T::TABLE, query).await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn create<D: Serialize + Sync>(&self, draft: &D) -> Result<T> {
        let row = to_row(draft)?;
        let stored = self.store.insert(T::TABLE, row).await?;
        decode(stored)
    }

    /// Merge `patch` into the row and stamp `updated_at`. The row must exist.
    pub async fn update<P: Serialize + Sync>(&self, id: &str, patch: &P) -> Result<T> {
        let mut changes = to_row(patch)?;
        changes.insert("updated_at".into(), Value::String(now_timestamp()));
        let stored = self.store.update(T::TABLE, id, changes).await?;
        decode(stored)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(T::TABLE, id).await
    }
}

pub(crate) fn to_row<S: Serialize>(value: &S) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(MarketError::storage(format!(
            "se esperaba un objeto JSON, se obtuvo {other}"
        ))),
    }
}

/// Rows that do not fit the record type point at a schema mismatch in the
/// store, not at the caller.
pub(crate) fn decode<T: DeserializeOwned>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| MarketError::storage(format!("fila con formato inesperado: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::store::MemoryStore;
    use crate::domain::review::Review;
    use crate::test_helpers::{failing_store, new_review_row};
    use serde_json::json;

    fn repo() -> Repository<Review> {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn missing_id_is_none_every_time() {
        let repo = repo();
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_of_missing_id_is_not_found() {
        let err = repo().get("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Reseña no encontrada");
    }

    #[tokio::test]
    async fn create_then_find_round_trip() {
        let repo = repo();
        let created = repo.create(&new_review_row("exp-1", 5)).await.unwrap();
        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_all_is_newest_first() {
        let repo = repo();
        let first = repo.create(&new_review_row("exp-1", 3)).await.unwrap();
        let second = repo.create(&new_review_row("exp-1", 4)).await.unwrap();
        let all = repo.find_all().await.unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn find_where_is_a_conjunction() {
        let repo = repo();
        repo.create(&new_review_row("exp-1", 5)).await.unwrap();
        repo.create(&new_review_row("exp-1", 2)).await.unwrap();
        repo.create(&new_review_row("exp-2", 5)).await.unwrap();
        let hits = repo
            .find_where(&[("servicio_id", json!("exp-1")), ("calificacion", json!(5))])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn update_stamps_updated_at() {
        let repo = repo();
        let created = repo.create(&new_review_row("exp-1", 3)).await.unwrap();
        let updated = repo
            .update(&created.id, &json!({"comentario": "Mejor de lo esperado"}))
            .await
            .unwrap();
        assert_eq!(updated.comment.as_deref(), Some("Mejor de lo esperado"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let repo = repo();
        let created = repo.create(&new_review_row("exp-1", 3)).await.unwrap();
        repo.delete(&created.id).await.unwrap();
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_row_is_a_storage_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(Review::TABLE, to_row(&json!({"calificacion": "cinco"})).unwrap())
            .await
            .unwrap();
        let repo: Repository<Review> = Repository::new(store);
        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(err, MarketError::Storage { .. }));
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let repo: Repository<Review> = Repository::new(failing_store());
        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(err, MarketError::Storage { .. }));
    }

    #[test]
    fn non_object_cannot_become_a_row() {
        assert!(to_row(&json!([1, 2])).is_err());
    }
}
