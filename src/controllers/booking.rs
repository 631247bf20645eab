use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::booking::{Booking, BookingStatus, NewBooking, StatusChange};
use crate::domain::listing::ServiceType;
use crate::domain::pricing;
use crate::error::{MarketError, Result};
use crate::ports::store::{Query, TableStore};
use crate::repository::{Repository, find_listing, listing_not_found};

/// Cents of tolerance before a client-supplied total counts as different.
const PRICE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub provider_id: Option<String>,
    pub service_id: Option<String>,
    pub active_only: bool,
}

impl BookingFilter {
    fn keeps(&self, booking: &Booking) -> bool {
        self.user_id.as_ref().is_none_or(|u| &booking.user_id == u)
            && self
                .service_id
                .as_ref()
                .is_none_or(|s| &booking.service_id == s)
            && (!self.active_only || booking.status.is_active())
    }
}

pub struct BookingController {
    store: Arc<dyn TableStore>,
    bookings: Repository<Booking>,
    // Check-then-write sequences (overlap, transitions) run one at a time.
    gate: Mutex<()>,
}

impl BookingController {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            bookings: Repository::new(Arc::clone(&store)),
            store,
            gate: Mutex::new(()),
        }
    }

    pub async fn create(&self, request: NewBooking) -> Result<Booking> {
        request.validate()?;
        let service_type = request.require_service_type()?;

        let listing = find_listing(&self.store, service_type, &request.service_id)
            .await?
            .ok_or_else(|| listing_not_found(service_type))?;
        if !listing.is_available() {
            return Err(MarketError::validation(
                "el servicio no está disponible para reservas",
            ));
        }
        if let Some(capacity) = listing.capacity()
            && request.party_size > i64::from(capacity)
        {
            return Err(MarketError::validation(format!(
                "la cantidad de personas supera la capacidad del servicio ({capacity})"
            )));
        }

        let total = pricing::quote(&listing, &request)?;
        if let Some(claimed) = request.total_price
            && (claimed - total).abs() > PRICE_TOLERANCE
        {
            warn!(
                service_id = %request.service_id,
                claimed,
                total,
                "Client total differs from listing price, using computed total"
            );
        }

        let _guard = self.gate.lock().await;
        if service_type == ServiceType::Lodging {
            self.ensure_free(&request).await?;
        }
        let draft = request.into_draft(total)?;
        let booking = self.bookings.create(&draft).await?;
        info!(id = %booking.id, service = %booking.service_type, total, "Booking created");
        Ok(booking)
    }

    async fn ensure_free(&self, request: &NewBooking) -> Result<()> {
        let stay = pricing::stay_interval(&request.start_date, request.end_date.as_deref())?;
        let existing = self
            .bookings
            .find_active_by_service(ServiceType::Lodging, &request.service_id)
            .await?;
        if existing.iter().any(|b| pricing::overlaps(stay, b)) {
            return Err(MarketError::Conflict {
                reason: "el alojamiento ya está reservado en esas fechas".into(),
            });
        }
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Booking> {
        self.bookings.get(id).await
    }

    pub async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let mut bookings = match (&filter.provider_id, &filter.user_id) {
            (Some(provider), _) if filter.active_only => {
                self.bookings.find_active_by_provider(provider).await?
            }
            (Some(provider), _) => self.bookings.find_by_provider(provider).await?,
            (None, Some(user)) if filter.active_only => {
                self.bookings.find_active_by_user(user).await?
            }
            (None, Some(user)) => self.bookings.find_by_user(user).await?,
            (None, None) => match filter.service_id {
                Some(ref service) => self.bookings.find_by_service(service).await?,
                None if filter.active_only => {
                    let query = Query::new()
                        .is_in("estado", BookingStatus::ACTIVE.map(BookingStatus::as_str))
                        .newest_first();
                    self.bookings.select(&query).await?
                }
                None => self.bookings.find_all().await?,
            },
        };
        bookings.retain(|b| filter.keeps(b));
        Ok(bookings)
    }

    /// Apply a PATCH body. Only the status may change.
    pub async fn update(&self, id: &str, change: StatusChange) -> Result<Booking> {
        let status = change
            .status
            .ok_or_else(|| MarketError::validation("estado requerido"))?;
        self.transition(id, status).await
    }

    pub async fn confirm(&self, id: &str) -> Result<Booking> {
        self.transition(id, BookingStatus::Confirmed).await
    }

    pub async fn cancel(&self, id: &str) -> Result<Booking> {
        self.transition(id, BookingStatus::Cancelled).await
    }

    async fn transition(&self, id: &str, next: BookingStatus) -> Result<Booking> {
        let _guard = self.gate.lock().await;
        let current = self.bookings.get(id).await?;
        current.status.transition_to(next)?;
        let updated = self.bookings.update_status(id, next).await?;
        info!(id, from = %current.status, to = %next, "Booking status changed");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.bookings.get(id).await?;
        self.bookings.delete(id).await?;
        info!(id, "Booking deleted");
        Ok(())
    }
}
