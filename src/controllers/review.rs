use std::sync::Arc;

use tracing::info;

use crate::domain::Validate;
use crate::domain::review::{NewReview, RatingStats, Review};
use crate::error::{MarketError, Result};
use crate::ports::store::TableStore;
use crate::repository::{Repository, find_listing, listing_not_found};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub service_id: Option<String>,
    pub user_id: Option<String>,
}

pub struct ReviewController {
    store: Arc<dyn TableStore>,
    reviews: Repository<Review>,
}

impl ReviewController {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            reviews: Repository::new(Arc::clone(&store)),
            store,
        }
    }

    pub async fn create(&self, input: NewReview) -> Result<Review> {
        let input = input.validate()?;
        let service_type = input
            .service_type
            .ok_or_else(|| MarketError::validation("tipo_servicio requerido"))?;
        if find_listing(&self.store, service_type, &input.service_id)
            .await?
            .is_none()
        {
            return Err(listing_not_found(service_type));
        }

        let review = self.reviews.create(&input).await?;
        info!(
            id = %review.id,
            service_id = %review.service_id,
            rating = review.rating,
            "Review created"
        );
        Ok(review)
    }

    pub async fn get(&self, id: &str) -> Result<Review> {
        self.reviews.get(id).await
    }

    pub async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let mut reviews = match (&filter.service_id, &filter.user_id) {
            (Some(service), _) => self.reviews.find_by_service(service).await?,
            (None, Some(user)) => self.reviews.find_by_user(user).await?,
            (None, None) => self.reviews.find_all().await?,
        };
        if let Some(ref user) = filter.user_id {
            reviews.retain(|r| &r.user_id == user);
        }
        Ok(reviews)
    }

    pub async fn average(&self, service_id: &str) -> Result<f64> {
        self.reviews.average_for(service_id).await
    }

    pub async fn statistics(&self, service_id: &str) -> Result<RatingStats> {
        self.reviews.statistics_for(service_id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.reviews.get(id).await?;
        self.reviews.delete(id).await?;
        info!(id, "Review deleted");
        Ok(())
    }
}
