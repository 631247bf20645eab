use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::error::{MarketError, Result};

/// Which of the three listing families a booking or review points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "alojamiento")]
    Lodging,
    #[serde(rename = "alimento")]
    Food,
    #[serde(rename = "experiencia")]
    Experience,
}

impl ServiceType {
    pub const ALL: [Self; 3] = [Self::Lodging, Self::Food, Self::Experience];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lodging => "alojamiento",
            Self::Food => "alimento",
            Self::Experience => "experiencia",
        }
    }

    /// Backing table of the listing family.
    pub fn table(self) -> &'static str {
        match self {
            Self::Lodging => "alojamientos",
            Self::Food => "alimentos",
            Self::Experience => "experiencias",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    #[serde(rename = "senderismo")]
    Hiking,
    #[serde(rename = "ciclismo")]
    Cycling,
    Cultural,
    #[serde(rename = "gastronomica")]
    Gastronomic,
    #[serde(rename = "aventura")]
    Adventure,
}

impl ExperienceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hiking => "senderismo",
            Self::Cycling => "ciclismo",
            Self::Cultural => "cultural",
            Self::Gastronomic => "gastronomica",
            Self::Adventure => "aventura",
        }
    }
}

impl FromStr for ExperienceKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "senderismo" => Ok(Self::Hiking),
            "ciclismo" => Ok(Self::Cycling),
            "cultural" => Ok(Self::Cultural),
            "gastronomica" => Ok(Self::Gastronomic),
            "aventura" => Ok(Self::Adventure),
            other => Err(MarketError::validation(format!(
                "tipo de experiencia desconocido: '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lodging {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio_noche")]
    pub price_per_night: f64,
    #[serde(rename = "ubicacion", default)]
    pub location: String,
    #[serde(rename = "capacidad")]
    pub capacity: u32,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "disponibilidad")]
    pub available: bool,
    #[serde(rename = "horario_recogida", default)]
    pub pickup_schedule: Option<String>,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "tipo")]
    pub kind: ExperienceKind,
    #[serde(rename = "duracion_horas")]
    pub duration_hours: f64,
    #[serde(rename = "capacidad_maxima")]
    pub max_capacity: u32,
    #[serde(rename = "ubicacion", default)]
    pub location: String,
    #[serde(rename = "imagenes", default)]
    pub images: Vec<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored listing of any family, tagged once when it is loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Lodging(Lodging),
    Food(Food),
    Experience(Experience),
}

impl Listing {
    pub fn id(&self) -> &str {
        match self {
            Self::Lodging(l) => &l.id,
            Self::Food(f) => &f.id,
            Self::Experience(e) => &e.id,
        }
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Lodging(_) => ServiceType::Lodging,
            Self::Food(_) => ServiceType::Food,
            Self::Experience(_) => ServiceType::Experience,
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            Self::Lodging(l) => &l.user_id,
            Self::Food(f) => &f.user_id,
            Self::Experience(e) => &e.user_id,
        }
    }

    /// Per-night, per-unit or per-person price depending on the family.
    pub fn unit_price(&self) -> f64 {
        match self {
            Self::Lodging(l) => l.price_per_night,
            Self::Food(f) => f.price,
            Self::Experience(e) => e.price,
        }
    }

    /// Maximum party size, when the family has one.
    pub fn capacity(&self) -> Option<u32> {
        match self {
            Self::Lodging(l) => Some(l.capacity),
            Self::Food(_) => None,
            Self::Experience(e) => Some(e.max_capacity),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Self::Lodging(l) => l.available,
            Self::Food(f) => f.available,
            Self::Experience(e) => e.available,
        }
    }
}

// ---------------------------------------------------------------------------
// Creation payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewLodging {
    pub user_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "precio_noche")]
    pub price_per_night: f64,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "capacidad")]
    pub capacity: i64,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponible", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for NewLodging {
    fn validate(mut self) -> Result<Self> {
        require_text(&self.title, "título requerido")?;
        require_text(&self.user_id, "user_id requerido")?;
        require_positive(self.price_per_night, "el precio por noche debe ser mayor a 0")?;
        if self.capacity <= 0 {
            return Err(MarketError::validation("la capacidad debe ser mayor a 0"));
        }
        self.images = Some(checked_images(self.images.take())?);
        self.available = Some(self.available.unwrap_or(true));
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFood {
    pub user_id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "horario_recogida", skip_serializing_if = "Option::is_none")]
    pub pickup_schedule: Option<String>,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponibilidad", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for NewFood {
    fn validate(mut self) -> Result<Self> {
        require_text(&self.name, "nombre requerido")?;
        require_text(&self.user_id, "user_id requerido")?;
        require_positive(self.price, "el precio debe ser mayor a 0")?;
        self.images = Some(checked_images(self.images.take())?);
        self.available = Some(self.available.unwrap_or(true));
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewExperience {
    pub user_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExperienceKind>,
    #[serde(rename = "duracion_horas")]
    pub duration_hours: f64,
    #[serde(rename = "capacidad_maxima")]
    pub max_capacity: i64,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponible", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for NewExperience {
    fn validate(mut self) -> Result<Self> {
        require_text(&self.title, "título requerido")?;
        require_text(&self.user_id, "user_id requerido")?;
        require_positive(self.price, "el precio debe ser mayor a 0")?;
        require_positive(self.duration_hours, "la duración debe ser mayor a 0")?;
        if self.max_capacity <= 0 {
            return Err(MarketError::validation(
                "la capacidad máxima debe ser mayor a 0",
            ));
        }
        if self.kind.is_none() {
            return Err(MarketError::validation("tipo de experiencia requerido"));
        }
        self.images = Some(checked_images(self.images.take())?);
        self.available = Some(self.available.unwrap_or(true));
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Partial updates
//
// Owner and identity columns are absent on purpose: serde drops them from the
// incoming body, so a PUT can never move a listing to another provider.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LodgingPatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "precio_noche", skip_serializing_if = "Option::is_none")]
    pub price_per_night: Option<f64>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "capacidad", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponible", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for LodgingPatch {
    fn validate(self) -> Result<Self> {
        if let Some(ref title) = self.title {
            require_text(title, "título requerido")?;
        }
        if let Some(price) = self.price_per_night {
            require_positive(price, "el precio por noche debe ser mayor a 0")?;
        }
        if let Some(capacity) = self.capacity
            && capacity <= 0
        {
            return Err(MarketError::validation("la capacidad debe ser mayor a 0"));
        }
        if let Some(ref images) = self.images {
            validate_images(images)?;
        }
        let empty = self.title.is_none()
            && self.description.is_none()
            && self.price_per_night.is_none()
            && self.location.is_none()
            && self.capacity.is_none()
            && self.images.is_none()
            && self.available.is_none();
        require_changes(empty)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodPatch {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "horario_recogida", skip_serializing_if = "Option::is_none")]
    pub pickup_schedule: Option<String>,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponibilidad", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for FoodPatch {
    fn validate(self) -> Result<Self> {
        if let Some(ref name) = self.name {
            require_text(name, "nombre requerido")?;
        }
        if let Some(price) = self.price {
            require_positive(price, "el precio debe ser mayor a 0")?;
        }
        if let Some(ref images) = self.images {
            validate_images(images)?;
        }
        let empty = self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.pickup_schedule.is_none()
            && self.images.is_none()
            && self.available.is_none();
        require_changes(empty)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperiencePatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExperienceKind>,
    #[serde(rename = "duracion_horas", skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(rename = "capacidad_maxima", skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<i64>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "disponible", skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Validate for ExperiencePatch {
    fn validate(self) -> Result<Self> {
        if let Some(ref title) = self.title {
            require_text(title, "título requerido")?;
        }
        if let Some(price) = self.price {
            require_positive(price, "el precio debe ser mayor a 0")?;
        }
        if let Some(hours) = self.duration_hours {
            require_positive(hours, "la duración debe ser mayor a 0")?;
        }
        if let Some(max) = self.max_capacity
            && max <= 0
        {
            return Err(MarketError::validation(
                "la capacidad máxima debe ser mayor a 0",
            ));
        }
        if let Some(ref images) = self.images {
            validate_images(images)?;
        }
        let empty = self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.kind.is_none()
            && self.duration_hours.is_none()
            && self.max_capacity.is_none()
            && self.location.is_none()
            && self.images.is_none()
            && self.available.is_none();
        require_changes(empty)?;
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

/// Every image reference must be an absolute http(s) URL.
pub fn validate_images(images: &[String]) -> Result<()> {
    for image in images {
        let parsed = url::Url::parse(image).ok();
        let web = parsed
            .as_ref()
            .is_some_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some());
        if !web {
            return Err(MarketError::validation(format!(
                "URL de imagen inválida: '{image}'"
            )));
        }
    }
    Ok(())
}

fn checked_images(images: Option<Vec<String>>) -> Result<Vec<String>> {
    let images = images.unwrap_or_default();
    validate_images(&images)?;
    Ok(images)
}

fn require_text(value: &str, reason: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MarketError::validation(reason));
    }
    Ok(())
}

// NaN fails this check too.
fn require_positive(value: f64, reason: &str) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MarketError::validation(reason))
    }
}

fn require_changes(empty: bool) -> Result<()> {
    if empty {
        return Err(MarketError::validation("no hay campos para actualizar"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn casa_x() -> NewLodging {
        NewLodging {
            user_id: "prov-1".into(),
            title: "Casa X".into(),
            price_per_night: 100_000.0,
            capacity: 4,
            ..Default::default()
        }
    }

    #[test]
    fn lodging_defaults_to_available_with_no_images() {
        let lodging = casa_x().validate().unwrap();
        assert_eq!(lodging.available, Some(true));
        assert_eq!(lodging.images, Some(vec![]));
    }

    #[test]
    fn lodging_keeps_explicit_unavailability() {
        let mut input = casa_x();
        input.available = Some(false);
        assert_eq!(input.validate().unwrap().available, Some(false));
    }

    #[test]
    fn lodging_empty_title_is_rejected() {
        let mut input = casa_x();
        input.title = String::new();
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "título requerido");
    }

    #[test]
    fn lodging_whitespace_title_is_rejected() {
        let mut input = casa_x();
        input.title = "   ".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn lodging_non_positive_price_or_capacity_is_rejected() {
        let mut zero_price = casa_x();
        zero_price.price_per_night = 0.0;
        assert!(zero_price.validate().is_err());

        let mut negative_capacity = casa_x();
        negative_capacity.capacity = -1;
        assert!(negative_capacity.validate().is_err());
    }

    #[test]
    fn listing_without_owner_is_rejected() {
        let mut lodging = casa_x();
        lodging.user_id = " ".into();
        assert_eq!(lodging.validate().unwrap_err().to_string(), "user_id requerido");

        let food = NewFood {
            name: "Tamales".into(),
            price: 8_000.0,
            ..Default::default()
        };
        assert_eq!(food.validate().unwrap_err().to_string(), "user_id requerido");

        let experience = NewExperience {
            title: "Caminata".into(),
            price: 50_000.0,
            kind: Some(ExperienceKind::Hiking),
            duration_hours: 2.0,
            max_capacity: 5,
            ..Default::default()
        };
        assert_eq!(
            experience.validate().unwrap_err().to_string(),
            "user_id requerido"
        );
    }

    #[test]
    fn nan_price_is_rejected() {
        let mut input = casa_x();
        input.price_per_night = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn food_requires_name_and_price() {
        let ok = NewFood {
            user_id: "prov-1".into(),
            name: "Tamales".into(),
            price: 8_000.0,
            ..Default::default()
        };
        assert_eq!(ok.validate().unwrap().available, Some(true));

        let no_name = NewFood {
            price: 8_000.0,
            ..Default::default()
        };
        assert_eq!(no_name.validate().unwrap_err().to_string(), "nombre requerido");

        let free = NewFood {
            user_id: "prov-1".into(),
            name: "Agua".into(),
            ..Default::default()
        };
        assert!(free.validate().is_err());
    }

    #[test]
    fn experience_requires_duration_capacity_and_kind() {
        let base = NewExperience {
            user_id: "prov-1".into(),
            title: "Caminata al volcán".into(),
            price: 50_000.0,
            kind: Some(ExperienceKind::Hiking),
            duration_hours: 4.0,
            max_capacity: 10,
            ..Default::default()
        };
        assert!(base.clone().validate().is_ok());

        let mut no_duration = base.clone();
        no_duration.duration_hours = 0.0;
        assert!(no_duration.validate().is_err());

        let mut no_capacity = base.clone();
        no_capacity.max_capacity = 0;
        assert!(no_capacity.validate().is_err());

        let mut no_kind = base;
        no_kind.kind = None;
        assert!(no_kind.validate().is_err());
    }

    #[test]
    fn image_urls_must_be_http() {
        assert!(validate_images(&["https://cdn.example.com/a.jpg".into()]).is_ok());
        assert!(validate_images(&["ftp://example.com/a.jpg".into()]).is_err());
        assert!(validate_images(&["a.jpg".into()]).is_err());

        let mut input = casa_x();
        input.images = Some(vec!["not a url".into()]);
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(LodgingPatch::default().validate().is_err());
        assert!(FoodPatch::default().validate().is_err());
        assert!(ExperiencePatch::default().validate().is_err());
    }

    #[test]
    fn patch_validates_present_fields_only() {
        let ok = LodgingPatch {
            description: Some("Vista al mar".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = LodgingPatch {
            price_per_night: Some(-5.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn patch_drops_owner_and_identity_fields() {
        let patch: LodgingPatch = serde_json::from_value(serde_json::json!({
            "id": "other",
            "user_id": "intruder",
            "titulo": "Nuevo"
        }))
        .unwrap();
        let row = serde_json::to_value(&patch).unwrap();
        assert_eq!(row, serde_json::json!({ "titulo": "Nuevo" }));
    }

    #[test]
    fn service_type_wire_names() {
        assert_eq!(
            serde_json::to_value(ServiceType::Lodging).unwrap(),
            serde_json::json!("alojamiento")
        );
        let parsed: ServiceType = serde_json::from_str("\"experiencia\"").unwrap();
        assert_eq!(parsed, ServiceType::Experience);
        assert_eq!(ServiceType::Food.table(), "alimentos");
    }

    #[test]
    fn experience_kind_from_query_string() {
        assert_eq!(
            "Senderismo".parse::<ExperienceKind>().unwrap(),
            ExperienceKind::Hiking
        );
        assert!("buceo".parse::<ExperienceKind>().is_err());
    }
}
