use chrono::{DateTime, NaiveDate, Utc};

use super::booking::{Booking, NewBooking};
use super::listing::Listing;
use crate::error::{MarketError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Accepts a bare `YYYY-MM-DD` date (midnight UTC) or a full RFC 3339 instant.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MarketError::validation(format!("fecha inválida: '{raw}'")))
}

/// Whole nights between two instants, rounding a partial day up.
pub fn nights_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<u32> {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return Err(MarketError::validation(
            "la fecha de fin debe ser posterior a la fecha de inicio",
        ));
    }
    let nights = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(nights).map_err(|_| MarketError::validation("la estadía es demasiado larga"))
}

pub fn lodging_total(start: &str, end: &str, price_per_night: f64) -> Result<f64> {
    let nights = nights_between(parse_instant(start)?, parse_instant(end)?)?;
    checked_total(f64::from(nights) * price_per_night)
}

pub fn food_total(quantity: i64, unit_price: f64) -> Result<f64> {
    if quantity <= 0 {
        return Err(MarketError::validation("la cantidad debe ser mayor a 0"));
    }
    checked_total(count(quantity) * unit_price)
}

pub fn experience_total(participants: i64, price_per_person: f64) -> Result<f64> {
    if participants <= 0 {
        return Err(MarketError::validation(
            "el número de participantes debe ser mayor a 0",
        ));
    }
    checked_total(count(participants) * price_per_person)
}

/// Authoritative total for a request against a stored listing.
pub fn quote(listing: &Listing, request: &NewBooking) -> Result<f64> {
    match listing {
        Listing::Lodging(lodging) => {
            let end = request.end_date.as_deref().ok_or_else(|| {
                MarketError::validation("la fecha de fin es obligatoria para alojamientos")
            })?;
            lodging_total(&request.start_date, end, lodging.price_per_night)
        }
        Listing::Food(food) => food_total(request.party_size, food.price),
        Listing::Experience(experience) => {
            experience_total(request.party_size, experience.price)
        }
    }
}

/// Half-open stay interval `[start, end)` of a booking. Without an end date
/// the booking covers a single day.
pub fn stay_interval(start: &str, end: Option<&str>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = parse_instant(start)?;
    let to = match end {
        Some(end) => parse_instant(end)?,
        None => from + chrono::Duration::days(1),
    };
    Ok((from, to))
}

/// Whether the requested stay shares at least one instant with an existing
/// booking. Rows whose dates no longer parse are skipped.
pub fn overlaps(request: (DateTime<Utc>, DateTime<Utc>), existing: &Booking) -> bool {
    let Ok((from, to)) = stay_interval(&existing.start_date, existing.end_date.as_deref()) else {
        return false;
    };
    request.0 < to && from < request.1
}

fn checked_total(total: f64) -> Result<f64> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(MarketError::validation(
            "el precio total excede el máximo representable",
        ))
    }
}

#[allow(clippy::cast_precision_loss)]
fn count(n: i64) -> f64 {
    n as f64
}
