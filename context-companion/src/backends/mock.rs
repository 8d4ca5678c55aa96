//! Mock backend implementations for testing.

use super::{
    AssistantBackend, AssistantQuery, AssistantReply, BackendError, BackendFactory,
    CodeModelBackend, ModelPrompt, ModelReply,
};
use crate::error::GatewayError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How mock backends answer.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Reply immediately with `mock: <input>`.
    Echo,
    /// Sleep before echoing.
    Delay(Duration),
    /// Fail every call with an API error.
    Fail(String),
}

impl MockBehavior {
    async fn apply(&self) -> Result<(), BackendError> {
        match self {
            MockBehavior::Echo => Ok(()),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            MockBehavior::Fail(msg) => Err(BackendError::ApiError(msg.clone())),
        }
    }
}

/// Factory that counts constructions and calls.
pub struct MockBackendFactory {
    behavior: MockBehavior,
    code_model_builds: AtomicUsize,
    assistant_builds: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl MockBackendFactory {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            code_model_builds: AtomicUsize::new(0),
            assistant_builds: AtomicUsize::new(0),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn code_model_builds(&self) -> usize {
        self.code_model_builds.load(Ordering::SeqCst)
    }

    pub fn assistant_builds(&self) -> usize {
        self.assistant_builds.load(Ordering::SeqCst)
    }

    /// Backend invocations across both mocks.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockBackendFactory {
    fn default() -> Self {
        Self::new(MockBehavior::Echo)
    }
}

impl BackendFactory for MockBackendFactory {
    fn code_model(&self, _timeout: Duration) -> Result<Arc<dyn CodeModelBackend>, GatewayError> {
        self.code_model_builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockCodeModel {
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn assistant(&self, _timeout: Duration) -> Result<Arc<dyn AssistantBackend>, GatewayError> {
        self.assistant_builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockAssistant {
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
        }))
    }
}

/// Mock code model.
pub struct MockCodeModel {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockCodeModel {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl CodeModelBackend for MockCodeModel {
    async fn converse(&self, prompt: &ModelPrompt) -> Result<ModelReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.apply().await?;

        Ok(ModelReply {
            text: format!("mock: {}", prompt.user_message),
            input_tokens: prompt.user_message.len() as i32 / 4,
            output_tokens: 10,
            stop_reason: "end_turn".to_string(),
        })
    }
}

/// Mock business assistant.
pub struct MockAssistant {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockAssistant {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl AssistantBackend for MockAssistant {
    async fn chat(&self, query: &AssistantQuery) -> Result<AssistantReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.apply().await?;

        Ok(AssistantReply {
            message: format!("mock: {}", query.user_message),
            conversation_id: Some(
                query
                    .conversation_id
                    .clone()
                    .unwrap_or_else(|| "mock-conversation".to_string()),
            ),
        })
    }
}
