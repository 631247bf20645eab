use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;

use super::AppState;
use super::envelope::{ApiResult, created, done, ok, parse_body, require_id, updated};
use super::extract::{Path, Query};
use super::listings::IdParam;
use crate::controllers::BookingFilter;
use crate::domain::booking::{NewBooking, StatusChange};
use crate::domain::search_params::parse_flag;

#[derive(Debug, Default, Deserialize)]
pub struct BookingParams {
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub activas: Option<String>,
    #[serde(rename = "proveedorId")]
    pub provider_id: Option<String>,
    #[serde(rename = "servicioId")]
    pub service_id: Option<String>,
}

impl BookingParams {
    pub fn to_filter(&self) -> BookingFilter {
        BookingFilter {
            user_id: self.user_id.clone(),
            provider_id: self.provider_id.clone(),
            service_id: self.service_id.clone(),
            active_only: parse_flag(self.activas.as_deref()),
        }
    }
}

pub async fn list(State(state): State<AppState>, Query(params): Query<BookingParams>) -> ApiResult {
    if let Some(ref id) = params.id {
        return ok(state.bookings.get(id).await?);
    }
    ok(state.bookings.list(&params.to_filter()).await?)
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    ok(state.bookings.get(&id).await?)
}

pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let request: NewBooking = parse_body(&body)?;
    created(
        state.bookings.create(request).await?,
        "Reserva creada exitosamente",
    )
}

pub async fn update_by_query(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
    body: Bytes,
) -> ApiResult {
    let id = require_id(params.id)?;
    apply_status(&state, &id, &body).await
}

pub async fn update_by_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    apply_status(&state, &id, &body).await
}

async fn apply_status(state: &AppState, id: &str, body: &Bytes) -> ApiResult {
    let change: StatusChange = parse_body(body)?;
    updated(
        state.bookings.update(id, change).await?,
        "Reserva actualizada exitosamente",
    )
}

pub async fn delete_by_query(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> ApiResult {
    let id = require_id(params.id)?;
    state.bookings.delete(&id).await?;
    done("Reserva eliminada exitosamente")
}

pub async fn delete_by_path(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.bookings.delete(&id).await?;
    done("Reserva eliminada exitosamente")
}
