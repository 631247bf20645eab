use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Validate;
use super::listing::ServiceType;
use crate::error::{MarketError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(rename = "servicio_id")]
    pub service_id: String,
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    pub user_id: String,
    #[serde(rename = "calificacion")]
    pub rating: u8,
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewReview {
    #[serde(rename = "servicio_id")]
    pub service_id: String,
    #[serde(rename = "tipo_servicio", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    pub user_id: String,
    #[serde(rename = "calificacion")]
    pub rating: i64,
    #[serde(rename = "comentario", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Validate for NewReview {
    fn validate(mut self) -> Result<Self> {
        if self.service_id.trim().is_empty()
            || self.user_id.trim().is_empty()
            || self.service_type.is_none()
        {
            return Err(MarketError::validation(
                "faltan campos obligatorios: servicio_id, user_id y tipo_servicio",
            ));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(MarketError::validation(
                "la calificación debe estar entre 1 y 5",
            ));
        }
        self.comment = self.comment.filter(|c| !c.trim().is_empty());
        Ok(self)
    }
}

/// Aggregate view over every review of one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    pub total: usize,
    #[serde(rename = "promedio")]
    pub average: f64,
    #[serde(rename = "distribucion")]
    pub distribution: BTreeMap<u8, usize>,
}

/// Plain mean of the ratings, `0` when there are none.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(sum) / len_f64(reviews.len())
}

pub fn compute_statistics(reviews: &[Review]) -> RatingStats {
    let mut distribution: BTreeMap<u8, usize> = (1..=5).map(|star| (star, 0)).collect();
    for review in reviews {
        if let Some(count) = distribution.get_mut(&review.rating) {
            *count += 1;
        }
    }

    RatingStats {
        total: reviews.len(),
        average: (average_rating(reviews) * 10.0).round() / 10.0,
        distribution,
    }
}

#[allow(clippy::cast_precision_loss)]
fn len_f64(n: usize) -> f64 {
    n as f64
}
