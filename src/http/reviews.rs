use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::envelope::{ApiResult, created, done, ok, parse_body, require_id};
use super::extract::{Path, Query};
use super::listings::IdParam;
use crate::controllers::ReviewFilter;
use crate::domain::review::NewReview;
use crate::domain::search_params::parse_flag;
use crate::error::MarketError;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewParams {
    pub id: Option<String>,
    #[serde(rename = "servicioId")]
    pub service_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub estadisticas: Option<String>,
    pub promedio: Option<String>,
}

#[derive(Debug, Serialize)]
struct Average {
    promedio: f64,
}

pub async fn list(State(state): State<AppState>, Query(params): Query<ReviewParams>) -> ApiResult {
    if let Some(ref id) = params.id {
        return ok(state.reviews.get(id).await?);
    }

    let wants_stats = parse_flag(params.estadisticas.as_deref());
    let wants_average = parse_flag(params.promedio.as_deref());
    if wants_stats || wants_average {
        let service_id = params.service_id.as_deref().ok_or_else(|| {
            MarketError::validation("Se requiere servicioId para calcular la calificación")
        })?;
        if wants_stats {
            return ok(state.reviews.statistics(service_id).await?);
        }
        let promedio = state.reviews.average(service_id).await?;
        return ok(Average { promedio });
    }

    let filter = ReviewFilter {
        service_id: params.service_id,
        user_id: params.user_id,
    };
    ok(state.reviews.list(&filter).await?)
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    ok(state.reviews.get(&id).await?)
}

pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let input: NewReview = parse_body(&body)?;
    created(
        state.reviews.create(input).await?,
        "Reseña creada exitosamente",
    )
}

pub async fn delete_by_query(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> ApiResult {
    let id = require_id(params.id)?;
    state.reviews.delete(&id).await?;
    done("Reseña eliminada exitosamente")
}

pub async fn delete_by_path(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.reviews.delete(&id).await?;
    done("Reseña eliminada exitosamente")
}
