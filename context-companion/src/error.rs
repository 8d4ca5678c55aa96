//! Gateway error taxonomy and its HTTP mapping.

use crate::backends::BackendKind;
use crate::services::Feature;
use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or invalid startup configuration. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("feature disabled: {0}")]
    FeatureDisabled(Feature),

    #[error("{backend} call timed out after {}ms", .timeout.as_millis())]
    BackendTimeout {
        backend: BackendKind,
        timeout: Duration,
    },

    #[error("{backend} call failed: {cause}")]
    Backend { backend: BackendKind, cause: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Configuration(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            GatewayError::Authentication(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
            GatewayError::FeatureDisabled(feature) => {
                AppError::NotFound(anyhow::anyhow!("Feature '{}' is disabled", feature))
            }
            err @ GatewayError::BackendTimeout { .. } => AppError::GatewayTimeout(err.to_string()),
            err @ GatewayError::Backend { .. } => AppError::BadGateway(err.to_string()),
            GatewayError::InvalidRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}
