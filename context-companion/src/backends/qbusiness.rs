//! Amazon Q Business backend (ChatSync).

use super::aws::{classify_sdk_error, retry_config, timeout_config};
use super::{AssistantBackend, AssistantQuery, AssistantReply, BackendError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_qbusiness::Client;
use std::time::Duration;

pub struct QBusinessAssistant {
    client: Client,
    application_id: String,
}

impl QBusinessAssistant {
    pub fn new(sdk_config: &SdkConfig, timeout: Duration, application_id: String) -> Self {
        let config = aws_sdk_qbusiness::config::Builder::from(sdk_config)
            .timeout_config(timeout_config(timeout))
            .retry_config(retry_config())
            .build();

        tracing::info!(
            application_id = %application_id,
            timeout_ms = timeout.as_millis() as u64,
            "Initialized Q Business client"
        );

        Self {
            client: Client::from_conf(config),
            application_id,
        }
    }
}

#[async_trait]
impl AssistantBackend for QBusinessAssistant {
    async fn chat(&self, query: &AssistantQuery) -> Result<AssistantReply, BackendError> {
        tracing::debug!(
            application_id = %self.application_id,
            message_len = query.user_message.len(),
            continued = query.conversation_id.is_some(),
            "Sending ChatSync request to Q Business"
        );

        let output = self
            .client
            .chat_sync()
            .application_id(&self.application_id)
            .user_message(&query.user_message)
            .set_conversation_id(query.conversation_id.clone())
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let message = output
            .system_message()
            .map(str::to_string)
            .ok_or_else(|| {
                BackendError::ApiError("ChatSync response contained no message".to_string())
            })?;

        Ok(AssistantReply {
            message,
            conversation_id: output.conversation_id().map(str::to_string),
        })
    }
}
