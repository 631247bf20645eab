use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Record, Repository, decode};
use crate::domain::Validate;
use crate::domain::listing::{
    Experience, ExperiencePatch, Food, FoodPatch, Listing, Lodging, LodgingPatch, NewExperience,
    NewFood, NewLodging, ServiceType,
};
use crate::domain::search_params::ListingSearch;
use crate::error::{MarketError, Result};
use crate::ports::store::{Query, TableStore};

/// A listing family: its record type plus the payloads that create and
/// update it and the columns its searches run against.
pub trait ListingRecord: Record + Serialize + Clone {
    type New: Validate + Serialize + DeserializeOwned + Send + Sync;
    type Patch: Validate + Serialize + DeserializeOwned + Send + Sync;

    const SERVICE_TYPE: ServiceType;
    const AVAILABILITY_FIELD: &'static str;
    const PRICE_FIELD: &'static str;
    const CAPACITY_FIELD: Option<&'static str>;
    const LOCATION_FIELD: Option<&'static str>;
    const KIND_FIELD: Option<&'static str>;

    fn into_listing(self) -> Listing;

    /// Translate a search into a store query, refusing filters the family has
    /// no column for.
    fn search_query(search: &ListingSearch) -> Result<Query> {
        search.validate()?;
        let mut query = Query::new();

        if let Some(ref owner) = search.owner_id {
            query = query.eq("user_id", owner.as_str());
        }
        if search.narrows_to_available() {
            query = query.eq(Self::AVAILABILITY_FIELD, true);
        }
        if let Some(ref location) = search.location {
            let field = supported::<Self>(Self::LOCATION_FIELD, "ubicacion")?;
            query = query.ilike(field, location.trim());
        }
        if let Some(capacity) = search.min_capacity {
            let field = supported::<Self>(Self::CAPACITY_FIELD, "capacidad")?;
            query = query.gte(field, capacity);
        }
        if let Some(kind) = search.kind {
            let field = supported::<Self>(Self::KIND_FIELD, "tipo")?;
            query = query.eq(field, kind.as_str());
        }
        if let Some(min) = search.min_price {
            query = query.gte(Self::PRICE_FIELD, min);
        }
        if let Some(max) = search.max_price {
            query = query.lte(Self::PRICE_FIELD, max);
        }

        Ok(query.newest_first())
    }
}

fn supported<L: ListingRecord>(field: Option<&'static str>, filter: &str) -> Result<&'static str> {
    field.ok_or_else(|| {
        MarketError::validation(format!(
            "el filtro '{filter}' no aplica a {}",
            L::SERVICE_TYPE.table()
        ))
    })
}

impl Record for Lodging {
    const TABLE: &'static str = "alojamientos";
    const NOT_FOUND: &'static str = "Alojamiento no encontrado";
}

impl ListingRecord for Lodging {
    type New = NewLodging;
    type Patch = LodgingPatch;

    const SERVICE_TYPE: ServiceType = ServiceType::Lodging;
    const AVAILABILITY_FIELD: &'static str = "disponible";
    const PRICE_FIELD: &'static str = "precio_noche";
    const CAPACITY_FIELD: Option<&'static str> = Some("capacidad");
    const LOCATION_FIELD: Option<&'static str> = Some("ubicacion");
    const KIND_FIELD: Option<&'static str> = None;

    fn into_listing(self) -> Listing {
        Listing::Lodging(self)
    }
}

impl Record for Food {
    const TABLE: &'static str = "alimentos";
    const NOT_FOUND: &'static str = "Alimento no encontrado";
}

impl ListingRecord for Food {
    type New = NewFood;
    type Patch = FoodPatch;

    const SERVICE_TYPE: ServiceType = ServiceType::Food;
    const AVAILABILITY_FIELD: &'static str = "disponibilidad";
    const PRICE_FIELD: &'static str = "precio";
    const CAPACITY_FIELD: Option<&'static str> = None;
    const LOCATION_FIELD: Option<&'static str> = None;
    const KIND_FIELD: Option<&'static str> = None;

    fn into_listing(self) -> Listing {
        Listing::Food(self)
    }
}

impl Record for Experience {
    const TABLE: &'static str = "experiencias";
    const NOT_FOUND: &'static str = "Experiencia no encontrada";
}

impl ListingRecord for Experience {
    type New = NewExperience;
    type Patch = ExperiencePatch;

    const SERVICE_TYPE: ServiceType = ServiceType::Experience;
    const AVAILABILITY_FIELD: &'static str = "disponible";
    const PRICE_FIELD: &'static str = "precio";
    const CAPACITY_FIELD: Option<&'static str> = Some("capacidad_maxima");
    const LOCATION_FIELD: Option<&'static str> = Some("ubicacion");
    const KIND_FIELD: Option<&'static str> = Some("tipo");

    fn into_listing(self) -> Listing {
        Listing::Experience(self)
    }
}

impl<L: ListingRecord> Repository<L> {
    pub async fn find_available(&self) -> Result<Vec<L>> {
        self.find_where(&[(L::AVAILABILITY_FIELD, true.into())])
            .await
    }

    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<L>> {
        self.find_where(&[("user_id", owner_id.into())]).await
    }

    pub async fn search(&self, search: &ListingSearch) -> Result<Vec<L>> {
        self.select(&L::search_query(search)?).await
    }
}

/// Load a listing of the given family, tagging it with that family.
pub async fn find_listing(
    store: &Arc<dyn TableStore>,
    service_type: ServiceType,
    id: &str,
) -> Result<Option<Listing>> {
    let query = Query::new().eq("id", id).limit(1);
    let Some(row) = store
        .select(service_type.table(), &query)
        .await?
        .into_iter()
        .next()
    else {
        return Ok(None);
    };

    let listing = match service_type {
        ServiceType::Lodging => decode::<Lodging>(row)?.into_listing(),
        ServiceType::Food => decode::<Food>(row)?.into_listing(),
        ServiceType::Experience => decode::<Experience>(row)?.into_listing(),
    };
    Ok(Some(listing))
}

/// `NotFound` carrying the family's own message.
pub fn listing_not_found(service_type: ServiceType) -> MarketError {
    let message = match service_type {
        ServiceType::Lodging => Lodging::NOT_FOUND,
        ServiceType::Food => Food::NOT_FOUND,
        ServiceType::Experience => Experience::NOT_FOUND,
    };
    MarketError::not_found(message)
}

/// Ids of every listing `owner_id` publishes in one family.
pub async fn owned_listing_ids(
    store: &Arc<dyn TableStore>,
    service_type: ServiceType,
    owner_id: &str,
) -> Result<Vec<String>> {
    let rows = store
        .select(service_type.table(), &Query::new().eq("user_id", owner_id))
        .await?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect())
}
