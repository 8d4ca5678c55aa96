//! Shared helpers for the integration tests.
#![allow(dead_code)]

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use context_companion::backends::mock::{MockBackendFactory, MockBehavior};
use context_companion::config::CompanionConfig;
use context_companion::startup::Application;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";

/// Argon2id PHC string with low cost parameters.
pub fn password_hash(password: &str) -> String {
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(8, 1, 1, None).unwrap(),
    );
    argon2
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .unwrap()
        .to_string()
}

/// Minimal valid configuration on a random port with one user.
pub fn config_builder() -> ConfigBuilder<DefaultState> {
    let user = HashMap::from([
        ("username".to_string(), USERNAME.to_string()),
        ("password_hash".to_string(), password_hash(PASSWORD)),
    ]);

    Config::builder()
        .set_override("port", 0)
        .unwrap()
        .set_override("environment", "test")
        .unwrap()
        .set_override("aws.region", "us-east-1")
        .unwrap()
        .set_override("aws.bedrock.timeout_ms", 1000)
        .unwrap()
        .set_override("aws.q.timeout_ms", 1000)
        .unwrap()
        .set_override("aws.q.application_id", "test-application")
        .unwrap()
        .set_override("security.users", vec![user])
        .unwrap()
}

pub fn with_features(translation: bool, test_generation: bool) -> ConfigBuilder<DefaultState> {
    config_builder()
        .set_override("features.translation.enabled", translation)
        .unwrap()
        .set_override("features.test_generation.enabled", test_generation)
        .unwrap()
}

pub struct TestApp {
    pub address: String,
    pub factory: Arc<MockBackendFactory>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Log in with Basic credentials and return the session cookie pair.
    pub async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .basic_auth(USERNAME, Some(PASSWORD))
            .send()
            .await
            .expect("Failed to send login");
        assert_eq!(response.status(), 200);

        session_cookie(&response).expect("login did not set a session cookie")
    }
}

/// `SESSION=<id>` from the response's `Set-Cookie`, if any.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("SESSION=") && pair.len() > "SESSION=".len())
        .map(|pair| pair.to_string())
}

pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

pub async fn spawn_app(builder: ConfigBuilder<DefaultState>, behavior: MockBehavior) -> TestApp {
    let config = CompanionConfig::from_builder(builder).expect("Failed to load config");
    let factory = Arc::new(MockBackendFactory::new(behavior));

    let app = Application::build_with_factory(config, factory.as_ref())
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        factory,
        client: reqwest::Client::new(),
    }
}
