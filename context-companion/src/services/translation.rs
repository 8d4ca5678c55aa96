//! Translation façade over the code-model runtime.

use crate::backends::ModelPrompt;
use crate::error::GatewayError;
use crate::pool::CodeModelClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const SYSTEM_PROMPT: &str =
    "You are a translation engine. Reply with the translated text only, preserving formatting.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TranslationRequest {
    #[validate(length(min = 1, max = 100000))]
    pub text: String,
    #[validate(length(min = 2, max = 64))]
    pub target_language: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 64))]
    pub source_language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub target_language: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

pub struct TranslationService {
    client: Arc<CodeModelClient>,
}

impl TranslationService {
    pub fn new(client: Arc<CodeModelClient>) -> Self {
        Self { client }
    }

    pub async fn translate(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResult, GatewayError> {
        let prompt = ModelPrompt {
            system: Some(SYSTEM_PROMPT.to_string()),
            user_message: instruction(&request),
            ..Default::default()
        };

        let reply = self.client.converse(&prompt).await?;

        tracing::debug!(
            target_language = %request.target_language,
            output_tokens = reply.output_tokens,
            "Translation completed"
        );

        Ok(TranslationResult {
            translated_text: reply.text,
            target_language: request.target_language,
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            stop_reason: reply.stop_reason,
        })
    }
}

fn instruction(request: &TranslationRequest) -> String {
    match &request.source_language {
        Some(source) => format!(
            "Translate the following text from {} to {}:\n\n{}",
            source, request.target_language, request.text
        ),
        None => format!(
            "Translate the following text to {}:\n\n{}",
            request.target_language, request.text
        ),
    }
}
