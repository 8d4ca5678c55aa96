//! Backend client pool.
//!
//! Handles are built once at startup and shared by reference afterwards.
//! The assistant handle only exists when test generation is enabled.

use crate::backends::{
    AssistantBackend, AssistantQuery, AssistantReply, BackendError, BackendFactory, BackendKind,
    CodeModelBackend, ModelPrompt, ModelReply,
};
use crate::config::CompanionConfig;
use crate::error::GatewayError;
use crate::services::Feature;
use metrics::{counter, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Long-lived handle to one backend with a fixed call budget.
pub struct BackendClient<B: ?Sized> {
    kind: BackendKind,
    timeout: Duration,
    backend: Arc<B>,
}

pub type CodeModelClient = BackendClient<dyn CodeModelBackend>;
pub type AssistantClient = BackendClient<dyn AssistantBackend>;

impl<B: ?Sized> BackendClient<B> {
    pub fn new(kind: BackendKind, timeout: Duration, backend: Arc<B>) -> Self {
        Self {
            kind,
            timeout,
            backend,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bound a backend call by the handle's timeout. Nothing is retried.
    async fn call<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, call).await;
        let elapsed = started.elapsed();

        histogram!("backend_call_duration_seconds", "backend" => self.kind.as_str())
            .record(elapsed.as_secs_f64());

        let (outcome, result) = match result {
            Ok(Ok(value)) => ("ok", Ok(value)),
            Err(_) | Ok(Err(BackendError::Timeout)) => {
                tracing::warn!(
                    backend = %self.kind,
                    timeout_ms = self.timeout.as_millis() as u64,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend call timed out"
                );
                (
                    "timeout",
                    Err(GatewayError::BackendTimeout {
                        backend: self.kind,
                        timeout: self.timeout,
                    }),
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %self.kind, error = %e, "Backend call failed");
                (
                    "error",
                    Err(GatewayError::Backend {
                        backend: self.kind,
                        cause: e.to_string(),
                    }),
                )
            }
        };

        counter!("backend_calls_total", "backend" => self.kind.as_str(), "outcome" => outcome)
            .increment(1);

        result
    }
}

impl BackendClient<dyn CodeModelBackend> {
    pub async fn converse(&self, prompt: &ModelPrompt) -> Result<ModelReply, GatewayError> {
        self.call(self.backend.converse(prompt)).await
    }
}

impl BackendClient<dyn AssistantBackend> {
    pub async fn chat(&self, query: &AssistantQuery) -> Result<AssistantReply, GatewayError> {
        self.call(self.backend.chat(query)).await
    }
}

/// Owns every backend handle for the process lifetime.
pub struct ClientPool {
    code_model: Arc<CodeModelClient>,
    assistant: Option<Arc<AssistantClient>>,
}

impl ClientPool {
    /// Build the handles. Any construction failure aborts startup.
    pub fn build(
        config: &CompanionConfig,
        factory: &dyn BackendFactory,
    ) -> Result<Self, GatewayError> {
        let code_model = Arc::new(BackendClient::new(
            BackendKind::CodeModel,
            config.bedrock_timeout(),
            factory.code_model(config.bedrock_timeout())?,
        ));

        let assistant = if config.features.test_generation.enabled {
            Some(Arc::new(BackendClient::new(
                BackendKind::Assistant,
                config.q_timeout(),
                factory.assistant(config.q_timeout())?,
            )))
        } else {
            tracing::info!("Test generation disabled; assistant client not created");
            None
        };

        Ok(Self {
            code_model,
            assistant,
        })
    }

    pub fn code_model_client(&self) -> Arc<CodeModelClient> {
        self.code_model.clone()
    }

    pub fn assistant_client(&self) -> Result<Arc<AssistantClient>, GatewayError> {
        self.assistant
            .clone()
            .ok_or(GatewayError::FeatureDisabled(Feature::TestGeneration))
    }

    pub fn has_assistant_client(&self) -> bool {
        self.assistant.is_some()
    }
}
