use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::MarketError;

/// Uniform body of every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

pub type ApiResult = std::result::Result<Response, MarketError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok((StatusCode::OK, Json(ApiResponse::data(data))).into_response())
}

pub fn created<T: Serialize>(data: T, message: &str) -> ApiResult {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(data).with_message(message)),
    )
        .into_response())
}

pub fn updated<T: Serialize>(data: T, message: &str) -> ApiResult {
    Ok((StatusCode::OK, Json(ApiResponse::data(data).with_message(message))).into_response())
}

pub fn done(message: &str) -> ApiResult {
    Ok((StatusCode::OK, Json(ApiResponse::message(message))).into_response())
}

/// Decode a request body. Empty bodies and well-formed bodies of the wrong
/// shape are client errors; broken JSON syntax surfaces as a 500.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, MarketError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(MarketError::validation("el cuerpo de la solicitud es obligatorio"));
    }
    Ok(serde_json::from_slice(body)?)
}

/// Either the query string or the path must name the target row.
pub fn require_id(id: Option<String>) -> Result<String, MarketError> {
    id.filter(|id| !id.trim().is_empty())
        .ok_or_else(|| MarketError::validation("Se requiere el parámetro id"))
}

pub fn status_for(err: &MarketError) -> StatusCode {
    match err {
        MarketError::Validation { .. } => StatusCode::BAD_REQUEST,
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::InvalidTransition { .. } | MarketError::Conflict { .. } => {
            StatusCode::CONFLICT
        }
        MarketError::Json(e) if e.is_data() => StatusCode::BAD_REQUEST,
        MarketError::Storage { .. }
        | MarketError::Json(_)
        | MarketError::Http(_)
        | MarketError::Config(_)
        | MarketError::Io(_)
        | MarketError::Yaml(_)
        | MarketError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Text shown to the client. Transport and setup failures stay in the logs.
fn public_message(err: &MarketError) -> String {
    match err {
        MarketError::Json(e) if e.is_data() => {
            format!("cuerpo de la solicitud inválido: {e}")
        }
        MarketError::Json(_) => "JSON mal formado en el cuerpo de la solicitud".into(),
        MarketError::Http(_)
        | MarketError::Config(_)
        | MarketError::Io(_)
        | MarketError::Yaml(_)
        | MarketError::Url(_) => "Error interno del servidor".into(),
        other => other.to_string(),
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, %status, "Request rejected");
        }
        (status, Json(ApiResponse::failure(public_message(&self)))).into_response()
    }
}
