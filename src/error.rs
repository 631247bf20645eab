use thiserror::Error;

use crate::domain::booking::BookingStatus;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("transición de estado inválida: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{reason}")]
    Conflict { reason: String },

    #[error("error de almacenamiento: {reason}")]
    Storage { reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl MarketError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }

    /// Caller-side mistakes that must never be retried or logged as failures.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::InvalidTransition { .. }
            | Self::Conflict { .. } => true,
            Self::Json(e) => e.is_data(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
