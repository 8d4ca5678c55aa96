//! Amazon Bedrock runtime backend (Converse API).

use super::aws::{classify_sdk_error, retry_config, timeout_config};
use super::{BackendError, CodeModelBackend, ModelPrompt, ModelReply};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message,
    SystemContentBlock,
};
use aws_sdk_bedrockruntime::Client;
use std::time::Duration;

pub struct BedrockCodeModel {
    client: Client,
    model_id: String,
}

impl BedrockCodeModel {
    pub fn new(sdk_config: &SdkConfig, timeout: Duration, model_id: String) -> Self {
        let config = aws_sdk_bedrockruntime::config::Builder::from(sdk_config)
            .timeout_config(timeout_config(timeout))
            .retry_config(retry_config())
            .build();

        tracing::info!(
            model = %model_id,
            timeout_ms = timeout.as_millis() as u64,
            "Initialized Bedrock runtime client"
        );

        Self {
            client: Client::from_conf(config),
            model_id,
        }
    }
}

#[async_trait]
impl CodeModelBackend for BedrockCodeModel {
    async fn converse(&self, prompt: &ModelPrompt) -> Result<ModelReply, BackendError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.user_message.clone()))
            .build()
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message);

        if let Some(system) = &prompt.system {
            request = request.system(SystemContentBlock::Text(system.clone()));
        }

        if prompt.max_tokens.is_some() || prompt.temperature.is_some() {
            request = request.inference_config(
                InferenceConfiguration::builder()
                    .set_max_tokens(prompt.max_tokens)
                    .set_temperature(prompt.temperature)
                    .build(),
            );
        }

        tracing::debug!(
            model = %self.model_id,
            prompt_len = prompt.user_message.len(),
            "Sending Converse request to Bedrock"
        );

        let output = request.send().await.map_err(classify_sdk_error)?;

        let text = match output.output() {
            Some(ConverseOutput::Message(message)) => message
                .content()
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
            _ => {
                return Err(BackendError::ApiError(
                    "Converse response contained no message".to_string(),
                ))
            }
        };

        let usage = output.usage();

        Ok(ModelReply {
            text,
            input_tokens: usage.map(|u| u.input_tokens()).unwrap_or_default(),
            output_tokens: usage.map(|u| u.output_tokens()).unwrap_or_default(),
            stop_reason: output.stop_reason().as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::aws::test_support::failing_endpoint;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn failed_call_is_sent_once() {
        let (sdk_config, hits) = failing_endpoint().await;
        let model = BedrockCodeModel::new(&sdk_config, Duration::from_secs(10), "m".to_string());

        let prompt = ModelPrompt {
            user_message: "hello".to_string(),
            ..Default::default()
        };
        let err = model.converse(&prompt).await.unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        match err {
            BackendError::ApiError(cause) => {
                assert_eq!(cause, "InternalServerException: boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
