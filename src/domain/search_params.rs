use super::listing::ExperienceKind;
use crate::error::{MarketError, Result};

/// Narrowing criteria for a listing GET. Every field is optional; those that
/// are set combine as a conjunction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSearch {
    pub owner_id: Option<String>,
    pub available_only: bool,
    pub location: Option<String>,
    pub min_capacity: Option<u32>,
    pub kind: Option<ExperienceKind>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ListingSearch {
    /// Location, capacity, kind and price searches only ever look at listings
    /// that can currently be booked.
    pub fn narrows_to_available(&self) -> bool {
        self.available_only
            || self.location.is_some()
            || self.min_capacity.is_some()
            || self.kind.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() && !self.narrows_to_available()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ref location) = self.location
            && location.trim().is_empty()
        {
            return Err(MarketError::validation("ubicacion no puede estar vacía"));
        }

        if let Some(min) = self.min_price
            && let Some(max) = self.max_price
            && min > max
        {
            return Err(MarketError::validation(
                "precioMin no puede ser mayor que precioMax",
            ));
        }

        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if price < 0.0 || !price.is_finite() {
                return Err(MarketError::validation(
                    "los filtros de precio deben ser números no negativos",
                ));
            }
        }

        Ok(())
    }
}

/// Parse a `true`/`false` query flag; anything else counts as unset.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

pub fn parse_capacity(raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        MarketError::validation(format!(
            "capacidad debe ser un número entero positivo, se recibió '{raw}'"
        ))
    })
}

pub fn parse_price(name: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        MarketError::validation(format!("{name} debe ser numérico, se recibió '{raw}'"))
    })
}
