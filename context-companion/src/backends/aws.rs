//! Shared AWS wiring: region, default credential chain, timeouts, and SDK
//! error classification.

use super::bedrock::BedrockCodeModel;
use super::qbusiness::QBusinessAssistant;
use super::{AssistantBackend, BackendError, BackendFactory, CodeModelBackend};
use crate::config::CompanionConfig;
use crate::error::GatewayError;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::sync::Arc;
use std::time::Duration;

/// Builds Bedrock and Q Business clients from one resolved SDK config.
pub struct AwsBackendFactory {
    sdk_config: SdkConfig,
    model_id: String,
    application_id: Option<String>,
}

impl AwsBackendFactory {
    /// Resolve the shared SDK config. Credentials come from the ambient
    /// deployment identity and are probed here when configured to.
    pub async fn load(config: &CompanionConfig) -> Result<Self, GatewayError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws.region.clone()))
            .retry_config(retry_config())
            .load()
            .await;

        if config.verify_credentials() {
            verify_credentials(&sdk_config).await?;
            tracing::info!(region = %config.aws.region, "Resolved AWS credentials");
        }

        Ok(Self {
            sdk_config,
            model_id: config.aws.bedrock.model_id.clone(),
            application_id: config.aws.q.application_id.clone(),
        })
    }
}

impl BackendFactory for AwsBackendFactory {
    fn code_model(&self, timeout: Duration) -> Result<Arc<dyn CodeModelBackend>, GatewayError> {
        Ok(Arc::new(BedrockCodeModel::new(
            &self.sdk_config,
            timeout,
            self.model_id.clone(),
        )))
    }

    fn assistant(&self, timeout: Duration) -> Result<Arc<dyn AssistantBackend>, GatewayError> {
        let application_id = self.application_id.clone().ok_or_else(|| {
            GatewayError::Configuration("aws.q.application_id is not set".to_string())
        })?;

        Ok(Arc::new(QBusinessAssistant::new(
            &self.sdk_config,
            timeout,
            application_id,
        )))
    }
}

/// Backend calls get exactly one attempt.
pub(crate) fn retry_config() -> RetryConfig {
    RetryConfig::disabled()
}

/// Same budget for the whole call and for each attempt.
pub(crate) fn timeout_config(timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .operation_timeout(timeout)
        .operation_attempt_timeout(timeout)
        .build()
}

async fn verify_credentials(sdk_config: &SdkConfig) -> Result<(), GatewayError> {
    let provider = sdk_config.credentials_provider().ok_or_else(|| {
        GatewayError::Configuration("no AWS credentials provider available".to_string())
    })?;

    provider.provide_credentials().await.map_err(|e| {
        GatewayError::Configuration(format!(
            "failed to resolve AWS credentials: {}",
            DisplayErrorContext(&e)
        ))
    })?;

    Ok(())
}

/// Map an SDK failure onto the backend error kinds. Service errors keep only
/// their code and message; the raw HTTP response never leaves this function.
pub(crate) fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => BackendError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => BackendError::Timeout,
        SdkError::DispatchFailure(_) => {
            BackendError::NetworkError(DisplayErrorContext(&err).to_string())
        }
        SdkError::ConstructionFailure(_) => {
            BackendError::InvalidRequest(DisplayErrorContext(&err).to_string())
        }
        SdkError::ServiceError(_) => BackendError::ApiError(format!(
            "{}: {}",
            err.code().unwrap_or("UnknownError"),
            err.message().unwrap_or("no message")
        )),
        _ => BackendError::ApiError("unreadable response from service".to_string()),
    }
}
