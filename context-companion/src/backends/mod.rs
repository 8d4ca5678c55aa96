//! External AI backends.
//!
//! A trait per backend role keeps the pool and façades independent of the
//! AWS SDK, so tests can swap in the mock implementations.

pub mod aws;
pub mod bedrock;
pub mod mock;
pub mod qbusiness;

use crate::error::GatewayError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use aws::AwsBackendFactory;

/// Which external service a handle talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Code-generation runtime (Amazon Bedrock).
    CodeModel,
    /// Business-assistant runtime (Amazon Q Business).
    Assistant,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::CodeModel => "bedrock-runtime",
            BackendKind::Assistant => "q-business",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Call timed out")]
    Timeout,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Prompt for a single-turn code-model conversation.
#[derive(Debug, Clone, Default)]
pub struct ModelPrompt {
    pub system: Option<String>,
    pub user_message: String,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f32>,
}

/// Code-model output.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// Message for the business assistant.
#[derive(Debug, Clone, Default)]
pub struct AssistantQuery {
    pub user_message: String,
    /// Continue an earlier conversation.
    pub conversation_id: Option<String>,
}

/// Assistant output.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub message: String,
    pub conversation_id: Option<String>,
}

/// Code-generation runtime.
#[async_trait]
pub trait CodeModelBackend: Send + Sync {
    async fn converse(&self, prompt: &ModelPrompt) -> Result<ModelReply, BackendError>;
}

/// Business-assistant runtime.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn chat(&self, query: &AssistantQuery) -> Result<AssistantReply, BackendError>;
}

/// Constructs backend implementations. Called once per backend at startup.
pub trait BackendFactory: Send + Sync {
    fn code_model(&self, timeout: Duration) -> Result<Arc<dyn CodeModelBackend>, GatewayError>;

    fn assistant(&self, timeout: Duration) -> Result<Arc<dyn AssistantBackend>, GatewayError>;
}
