use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapters::memory::store::MemoryStore;
use crate::domain::booking::{BookingDraft, BookingStatus, NewBooking};
use crate::domain::listing::{ExperienceKind, NewExperience, NewFood, NewLodging, ServiceType};
use crate::domain::review::NewReview;
use crate::error::{MarketError, Result};
use crate::ports::store::{Query, Row, TableStore};

type SelectFn = Box<dyn Fn(&str, &Query) -> Result<Vec<Row>> + Send + Sync>;
type InsertFn = Box<dyn Fn(&str, &Row) -> Result<Row> + Send + Sync>;
type UpdateFn = Box<dyn Fn(&str, &str, &Row) -> Result<Row> + Send + Sync>;
type DeleteFn = Box<dyn Fn(&str, &str) -> Result<()> + Send + Sync>;

/// In-memory store whose operations can be replaced one at a time.
/// Anything not overridden falls through to a real `MemoryStore`.
#[derive(Default)]
pub struct MockStore {
    inner: MemoryStore,
    select_fn: Option<SelectFn>,
    insert_fn: Option<InsertFn>,
    update_fn: Option<UpdateFn>,
    delete_fn: Option<DeleteFn>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_select(
        mut self,
        f: impl Fn(&str, &Query) -> Result<Vec<Row>> + Send + Sync + 'static,
    ) -> Self {
        self.select_fn = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_insert(
        mut self,
        f: impl Fn(&str, &Row) -> Result<Row> + Send + Sync + 'static,
    ) -> Self {
        self.insert_fn = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_update(
        mut self,
        f: impl Fn(&str, &str, &Row) -> Result<Row> + Send + Sync + 'static,
    ) -> Self {
        self.update_fn = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_delete(
        mut self,
        f: impl Fn(&str, &str) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.delete_fn = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl TableStore for MockStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        match self.select_fn {
            Some(ref f) => f(table, query),
            None => self.inner.select(table, query).await,
        }
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        match self.insert_fn {
            Some(ref f) => f(table, &row),
            None => self.inner.insert(table, row).await,
        }
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row> {
        match self.update_fn {
            Some(ref f) => f(table, id, &changes),
            None => self.inner.update(table, id, changes).await,
        }
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        match self.delete_fn {
            Some(ref f) => f(table, id),
            None => self.inner.delete(table, id).await,
        }
    }
}

/// A store where every operation fails as if the backend were down.
pub fn failing_store() -> Arc<dyn TableStore> {
    let down = || MarketError::storage("connection refused");
    Arc::new(
        MockStore::new()
            .with_select(move |_, _| Err(down()))
            .with_insert(move |_, _| Err(down()))
            .with_update(move |_, _, _| Err(down()))
            .with_delete(move |_, _| Err(down())),
    )
}

pub fn new_lodging(title: &str) -> NewLodging {
    NewLodging {
        user_id: "prov-1".into(),
        title: title.into(),
        description: "Casa con vista".into(),
        price_per_night: 100_000.0,
        location: "Guatapé".into(),
        capacity: 4,
        images: None,
        available: None,
    }
}

pub fn new_food(name: &str) -> NewFood {
    NewFood {
        user_id: "prov-1".into(),
        name: name.into(),
        description: "Hecho en casa".into(),
        price: 8_000.0,
        pickup_schedule: Some("8:00-12:00".into()),
        images: None,
        available: None,
    }
}

pub fn new_experience(title: &str) -> NewExperience {
    NewExperience {
        user_id: "prov-1".into(),
        title: title.into(),
        description: "Recorrido guiado".into(),
        price: 50_000.0,
        kind: Some(ExperienceKind::Hiking),
        duration_hours: 4.0,
        max_capacity: 10,
        location: "Salento".into(),
        images: None,
        available: None,
    }
}

pub fn booking_draft(service_type: ServiceType, service_id: &str, user_id: &str) -> BookingDraft {
    let end_date = match service_type {
        ServiceType::Lodging => Some("2025-01-04".to_string()),
        ServiceType::Food | ServiceType::Experience => None,
    };
    BookingDraft {
        service_type,
        service_id: service_id.into(),
        user_id: user_id.into(),
        start_date: "2025-01-01".into(),
        end_date,
        party_size: 2,
        total_price: 300_000.0,
        status: BookingStatus::Pending,
        notes: None,
    }
}

pub fn booking_request(service_type: ServiceType, service_id: &str) -> NewBooking {
    NewBooking {
        service_type: Some(service_type),
        service_id: service_id.into(),
        user_id: "turista-1".into(),
        start_date: "2025-01-01".into(),
        end_date: Some("2025-01-04".into()),
        party_size: 2,
        total_price: None,
        notes: None,
    }
}

pub fn new_review(service_id: &str, rating: i64) -> NewReview {
    NewReview {
        service_id: service_id.into(),
        service_type: Some(ServiceType::Experience),
        user_id: "turista-1".into(),
        rating,
        comment: Some("Muy recomendado".into()),
    }
}

pub fn new_review_row(service_id: &str, rating: u8) -> Value {
    json!({
        "servicio_id": service_id,
        "tipo_servicio": "experiencia",
        "user_id": "turista-1",
        "calificacion": rating,
    })
}
