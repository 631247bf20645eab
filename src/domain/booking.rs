use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::ServiceType;
use crate::error::{MarketError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "pagada")]
    Paid,
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl BookingStatus {
    /// Statuses that still hold a claim on the listing.
    pub const ACTIVE: [Self; 3] = [Self::Pending, Self::Confirmed, Self::Paid];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Confirmed => "confirmada",
            Self::Paid => "pagada",
            Self::Completed => "completada",
            Self::Cancelled => "cancelada",
        }
    }

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use BookingStatus::{Cancelled, Completed, Confirmed, Paid, Pending};
        matches!(
            (self, next),
            (Pending, Confirmed | Paid | Cancelled) | (Confirmed | Paid, Completed | Cancelled)
        )
    }

    /// Check a requested move against the transition table.
    pub fn transition_to(self, next: Self) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(MarketError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    #[serde(rename = "servicio_id")]
    pub service_id: String,
    pub user_id: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<String>,
    #[serde(rename = "cantidad_personas")]
    pub party_size: u32,
    #[serde(rename = "precio_total")]
    pub total_price: f64,
    #[serde(rename = "estado")]
    pub status: BookingStatus,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request as the client sends it. `precio_total` is accepted for
/// compatibility but the stored total is always recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBooking {
    #[serde(rename = "tipo_servicio")]
    pub service_type: Option<ServiceType>,
    #[serde(rename = "servicio_id")]
    pub service_id: String,
    pub user_id: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin")]
    pub end_date: Option<String>,
    #[serde(rename = "cantidad_personas")]
    pub party_size: i64,
    #[serde(rename = "precio_total")]
    pub total_price: Option<f64>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

impl NewBooking {
    /// Required-field checks shared by every listing family.
    pub fn validate(&self) -> Result<()> {
        if self.service_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Err(MarketError::validation(
                "faltan campos obligatorios: servicio_id y user_id",
            ));
        }
        if self.start_date.trim().is_empty() {
            return Err(MarketError::validation("la fecha de inicio es obligatoria"));
        }
        if self.party_size <= 0 {
            return Err(MarketError::validation(
                "la cantidad de personas debe ser mayor a 0",
            ));
        }
        if let Some(total) = self.total_price
            && (total <= 0.0 || total.is_nan())
        {
            return Err(MarketError::validation("el precio total debe ser mayor a 0"));
        }
        Ok(())
    }

    pub fn require_service_type(&self) -> Result<ServiceType> {
        self.service_type
            .ok_or_else(|| MarketError::validation("tipo_servicio requerido"))
    }

    /// Validated draft tagged as pending, carrying the authoritative total.
    pub fn into_draft(self, total_price: f64) -> Result<BookingDraft> {
        self.validate()?;
        let service_type = self.require_service_type()?;
        if total_price <= 0.0 || !total_price.is_finite() {
            return Err(MarketError::validation("el precio total debe ser mayor a 0"));
        }
        let party_size = u32::try_from(self.party_size).map_err(|_| {
            MarketError::validation("la cantidad de personas excede el máximo permitido")
        })?;
        // Only stays span more than one day.
        let end_date = match service_type {
            ServiceType::Lodging => self.end_date,
            ServiceType::Food | ServiceType::Experience => None,
        };

        Ok(BookingDraft {
            service_type,
            service_id: self.service_id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date,
            party_size,
            total_price,
            status: BookingStatus::Pending,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDraft {
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    #[serde(rename = "servicio_id")]
    pub service_id: String,
    pub user_id: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "cantidad_personas")]
    pub party_size: u32,
    #[serde(rename = "precio_total")]
    pub total_price: f64,
    #[serde(rename = "estado")]
    pub status: BookingStatus,
    #[serde(rename = "notas", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of a PATCH against a booking.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusChange {
    #[serde(rename = "estado")]
    pub status: Option<BookingStatus>,
}

/// The only column a status update writes.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPatch {
    #[serde(rename = "estado")]
    pub status: BookingStatus,
}
