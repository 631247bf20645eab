use super::{Record, Repository};
use crate::domain::listing::ServiceType;
use crate::domain::review::{RatingStats, Review, average_rating, compute_statistics};
use crate::error::Result;

impl Record for Review {
    const TABLE: &'static str = "resenas";
    const NOT_FOUND: &'static str = "Reseña no encontrada";
}

impl Repository<Review> {
    pub async fn find_by_service(&self, service_id: &str) -> Result<Vec<Review>> {
        self.find_where(&[("servicio_id", service_id.into())]).await
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Review>> {
        self.find_where(&[("user_id", user_id.into())]).await
    }

    pub async fn find_by_service_type(&self, service_type: ServiceType) -> Result<Vec<Review>> {
        self.find_where(&[("tipo_servicio", service_type.as_str().into())])
            .await
    }

    /// Recomputed from the stored rows on every call.
    pub async fn average_for(&self, service_id: &str) -> Result<f64> {
        Ok(average_rating(&self.find_by_service(service_id).await?))
    }

    pub async fn statistics_for(&self, service_id: &str) -> Result<RatingStats> {
        Ok(compute_statistics(&self.find_by_service(service_id).await?))
    }
}
