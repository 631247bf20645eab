use super::listings::owned_listing_ids;
use super::{Record, Repository};
use crate::domain::booking::{Booking, BookingStatus, StatusPatch};
use crate::domain::listing::ServiceType;
use crate::error::Result;
use crate::ports::store::Query;

impl Record for Booking {
    const TABLE: &'static str = "reservas";
    const NOT_FOUND: &'static str = "Reserva no encontrada";
}

fn active_statuses() -> impl Iterator<Item = &'static str> {
    BookingStatus::ACTIVE.into_iter().map(BookingStatus::as_str)
}

impl Repository<Booking> {
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.find_where(&[("user_id", user_id.into())]).await
    }

    /// Pending, confirmed or paid bookings of a tourist, soonest first.
    pub async fn find_active_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let query = Query::new()
            .eq("user_id", user_id)
            .is_in("estado", active_statuses())
            .order_by("fecha_inicio", false);
        self.select(&query).await
    }

    pub async fn find_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        self.find_where(&[("estado", status.as_str().into())]).await
    }

    pub async fn find_by_service_type(&self, service_type: ServiceType) -> Result<Vec<Booking>> {
        self.find_where(&[("tipo_servicio", service_type.as_str().into())])
            .await
    }

    pub async fn find_by_service(&self, service_id: &str) -> Result<Vec<Booking>> {
        self.find_where(&[("servicio_id", service_id.into())]).await
    }

    /// Active bookings holding a claim on one listing.
    pub async fn find_active_by_service(
        &self,
        service_type: ServiceType,
        service_id: &str,
    ) -> Result<Vec<Booking>> {
        let query = Query::new()
            .eq("tipo_servicio", service_type.as_str())
            .eq("servicio_id", service_id)
            .is_in("estado", active_statuses());
        self.select(&query).await
    }

    /// Bookings made against any listing `provider_id` publishes, across the
    /// three families, newest first.
    pub async fn find_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>> {
        self.provider_bookings(provider_id, false).await
    }

    pub async fn find_active_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>> {
        self.provider_bookings(provider_id, true).await
    }

    async fn provider_bookings(
        &self,
        provider_id: &str,
        active_only: bool,
    ) -> Result<Vec<Booking>> {
        let mut bookings = Vec::new();
        for service_type in ServiceType::ALL {
            let ids = owned_listing_ids(self.store(), service_type, provider_id).await?;
            if ids.is_empty() {
                continue;
            }
            let mut query = Query::new()
                .eq("tipo_servicio", service_type.as_str())
                .is_in("servicio_id", ids);
            if active_only {
                query = query.is_in("estado", active_statuses());
            }
            bookings.extend(self.select(&query).await?);
        }
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    pub async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking> {
        self.update(id, &StatusPatch { status }).await
    }
}
