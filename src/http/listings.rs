use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;

use super::envelope::{ApiResult, created, done, ok, parse_body, require_id, updated};
use super::extract::{Path, Query};
use crate::controllers::ListingController;
use crate::domain::listing::ExperienceKind;
use crate::domain::search_params::{ListingSearch, parse_capacity, parse_flag, parse_price};
use crate::error::Result;
use crate::repository::ListingRecord;

/// Query string of a listing GET. Values stay raw so malformed numbers can
/// be reported in the response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub disponible: Option<String>,
    pub disponibilidad: Option<String>,
    pub ubicacion: Option<String>,
    pub capacidad: Option<String>,
    pub tipo: Option<String>,
    #[serde(rename = "precioMin")]
    pub precio_min: Option<String>,
    #[serde(rename = "precioMax")]
    pub precio_max: Option<String>,
}

impl ListingParams {
    pub fn to_search(&self) -> Result<ListingSearch> {
        Ok(ListingSearch {
            owner_id: self.user_id.clone(),
            available_only: parse_flag(self.disponible.as_deref())
                || parse_flag(self.disponibilidad.as_deref()),
            location: self.ubicacion.clone(),
            min_capacity: self.capacidad.as_deref().map(parse_capacity).transpose()?,
            kind: self
                .tipo
                .as_deref()
                .map(str::parse::<ExperienceKind>)
                .transpose()?,
            min_price: self
                .precio_min
                .as_deref()
                .map(|raw| parse_price("precioMin", raw))
                .transpose()?,
            max_price: self
                .precio_max
                .as_deref()
                .map(|raw| parse_price("precioMax", raw))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IdParam {
    pub id: Option<String>,
}

pub async fn list<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Query(params): Query<ListingParams>,
) -> ApiResult {
    if let Some(ref id) = params.id {
        return ok(controller.get(id).await?);
    }
    let search = params.to_search()?;
    ok(controller.list(&search).await?)
}

pub async fn get_one<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Path(id): Path<String>,
) -> ApiResult {
    ok(controller.get(&id).await?)
}

pub async fn create<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    body: Bytes,
) -> ApiResult {
    let input: L::New = parse_body(&body)?;
    created(controller.create(input).await?, "Creado exitosamente")
}

pub async fn update_by_query<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Query(params): Query<IdParam>,
    body: Bytes,
) -> ApiResult {
    let id = require_id(params.id)?;
    apply_update(&controller, &id, &body).await
}

pub async fn update_by_path<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    apply_update(&controller, &id, &body).await
}

async fn apply_update<L: ListingRecord>(
    controller: &ListingController<L>,
    id: &str,
    body: &Bytes,
) -> ApiResult {
    let patch: L::Patch = parse_body(body)?;
    updated(controller.update(id, patch).await?, "Actualizado exitosamente")
}

pub async fn delete_by_query<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Query(params): Query<IdParam>,
) -> ApiResult {
    let id = require_id(params.id)?;
    controller.delete(&id).await?;
    done("Eliminado exitosamente")
}

pub async fn delete_by_path<L: ListingRecord>(
    State(controller): State<ListingController<L>>,
    Path(id): Path<String>,
) -> ApiResult {
    controller.delete(&id).await?;
    done("Eliminado exitosamente")
}
