//! Test-generation façade over the business-assistant runtime.

use crate::backends::AssistantQuery;
use crate::error::GatewayError;
use crate::pool::AssistantClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TestGenerationRequest {
    #[validate(length(min = 1, max = 100000))]
    pub source_code: String,
    #[validate(length(min = 1, max = 64))]
    pub test_framework: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub language: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestGenerationResult {
    pub generated_tests: String,
    pub test_framework: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

pub struct TestGenerationService {
    client: Arc<AssistantClient>,
}

impl TestGenerationService {
    pub fn new(client: Arc<AssistantClient>) -> Self {
        Self { client }
    }

    pub async fn generate(
        &self,
        request: TestGenerationRequest,
    ) -> Result<TestGenerationResult, GatewayError> {
        let query = AssistantQuery {
            user_message: instruction(&request),
            conversation_id: request.conversation_id.clone(),
        };

        let reply = self.client.chat(&query).await?;

        Ok(TestGenerationResult {
            generated_tests: reply.message,
            test_framework: request.test_framework,
            conversation_id: reply.conversation_id,
        })
    }
}

fn instruction(request: &TestGenerationRequest) -> String {
    let language = request
        .language
        .as_deref()
        .map(|l| format!(" {}", l))
        .unwrap_or_default();

    format!(
        "Generate {} unit tests for the following{} code:\n\n{}",
        request.test_framework, language, request.source_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{MockAssistant, MockBehavior};
    use crate::backends::{AssistantBackend, BackendKind};
    use crate::pool::BackendClient;
    use std::time::Duration;

    fn service(behavior: MockBehavior) -> TestGenerationService {
        let backend: Arc<dyn AssistantBackend> = Arc::new(MockAssistant::new(behavior));
        TestGenerationService::new(Arc::new(BackendClient::new(
            BackendKind::Assistant,
            Duration::from_secs(1),
            backend,
        )))
    }

    fn request() -> TestGenerationRequest {
        TestGenerationRequest {
            source_code: "fn add(a: i32, b: i32) -> i32 { a + b }".to_string(),
            test_framework: "cargo test".to_string(),
            language: Some("Rust".to_string()),
            conversation_id: None,
        }
    }

    #[tokio::test]
    async fn returns_assistant_reply() {
        let result = service(MockBehavior::Echo).generate(request()).await.unwrap();

        assert!(result
            .generated_tests
            .starts_with("mock: Generate cargo test unit tests for the following Rust code:"));
        assert_eq!(result.conversation_id.as_deref(), Some("mock-conversation"));
    }

    #[tokio::test]
    async fn keeps_conversation_going() {
        let mut req = request();
        req.conversation_id = Some("conv-42".to_string());

        let result = service(MockBehavior::Echo).generate(req).await.unwrap();
        assert_eq!(result.conversation_id.as_deref(), Some("conv-42"));
    }

    #[tokio::test]
    async fn backend_error_is_surfaced() {
        let err = service(MockBehavior::Fail("AccessDeniedException".to_string()))
            .generate(request())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Backend { .. }));
    }
}
