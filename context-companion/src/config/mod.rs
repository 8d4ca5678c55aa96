use crate::error::GatewayError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Name reported by the health endpoint.
pub const APPLICATION_NAME: &str = "CodeGuru Context Companion";

const DEFAULT_BEDROCK_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_ADMIN_CONSOLE_PATH: &str = "/h2-console";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[validate(nested)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    #[validate(nested)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AwsConfig {
    #[validate(custom(function = "validate_region"))]
    pub region: String,
    #[validate(nested)]
    pub bedrock: BedrockConfig,
    #[validate(nested)]
    pub q: QBusinessConfig,
    /// Resolve credentials from the default chain at startup. Defaults to
    /// on in production.
    #[serde(default)]
    pub verify_credentials: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BedrockConfig {
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    #[serde(default = "default_model_id")]
    #[validate(length(min = 1))]
    pub model_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QBusinessConfig {
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    /// Required when test generation is enabled.
    #[serde(default)]
    pub application_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub translation: FeatureToggle,
    #[serde(default)]
    pub test_generation: FeatureToggle,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeatureToggle {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SecurityConfig {
    #[serde(default)]
    #[validate(nested)]
    pub users: Vec<UserCredential>,
    #[serde(default = "default_session_idle_timeout_secs")]
    #[validate(range(min = 1))]
    pub session_idle_timeout_secs: u64,
    /// Console prefix left open outside production.
    #[serde(default = "default_admin_console_path")]
    pub admin_console_path: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            admin_console_path: DEFAULT_ADMIN_CONSOLE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserCredential {
    #[validate(length(min = 1))]
    pub username: String,
    /// Argon2 PHC string, e.g. from `context-companion hash-password`.
    pub password_hash: Secret<String>,
}

fn default_model_id() -> String {
    DEFAULT_BEDROCK_MODEL_ID.to_string()
}

fn default_session_idle_timeout_secs() -> u64 {
    DEFAULT_SESSION_IDLE_TIMEOUT_SECS
}

fn default_admin_console_path() -> String {
    DEFAULT_ADMIN_CONSOLE_PATH.to_string()
}

/// Accepts region codes shaped like `us-east-1` or `us-gov-west-1`.
fn validate_region(region: &str) -> Result<(), ValidationError> {
    let parts: Vec<&str> = region.split('-').collect();
    let well_formed = parts.len() >= 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
        && parts
            .last()
            .is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()));

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_region"))
    }
}

impl CompanionConfig {
    /// Load from `configuration.*` and `APP__*` environment variables.
    pub fn load() -> Result<Self, GatewayError> {
        Self::from_builder(core_config::builder())
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, GatewayError> {
        let config: CompanionConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), GatewayError> {
        self.validate()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        if self.features.test_generation.enabled
            && self
                .aws
                .q
                .application_id
                .as_deref()
                .map_or(true, |id| id.trim().is_empty())
        {
            return Err(GatewayError::Configuration(
                "aws.q.application_id is required when test generation is enabled".to_string(),
            ));
        }

        if self.security.users.is_empty() {
            tracing::warn!("No users configured; every protected path will reject");
        }

        Ok(())
    }

    pub fn bedrock_timeout(&self) -> Duration {
        Duration::from_millis(self.aws.bedrock.timeout_ms)
    }

    pub fn q_timeout(&self) -> Duration {
        Duration::from_millis(self.aws.q.timeout_ms)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.security.session_idle_timeout_secs)
    }

    pub fn verify_credentials(&self) -> bool {
        self.aws
            .verify_credentials
            .unwrap_or_else(|| self.common.is_prod())
    }

    /// The admin console prefix, only outside production.
    pub fn admin_console_path(&self) -> Option<&str> {
        if self.common.is_prod() || self.security.admin_console_path.is_empty() {
            None
        } else {
            Some(&self.security.admin_console_path)
        }
    }
}
