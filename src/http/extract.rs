use axum::extract::FromRequestParts;
use axum::extract::rejection::{PathRejection, QueryRejection};

use crate::error::MarketError;

/// `axum::extract::Query` whose rejection is answered with the envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(MarketError))]
pub struct Query<T>(pub T);

/// `axum::extract::Path` whose rejection is answered with the envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(MarketError))]
pub struct Path<T>(pub T);

impl From<QueryRejection> for MarketError {
    fn from(rejection: QueryRejection) -> Self {
        MarketError::validation(format!(
            "parámetros de consulta inválidos: {}",
            rejection.body_text()
        ))
    }
}

impl From<PathRejection> for MarketError {
    fn from(rejection: PathRejection) -> Self {
        MarketError::validation(format!("ruta inválida: {}", rejection.body_text()))
    }
}
