//! Feature dispatch façades.
//!
//! Each façade is present only when its flag was on at startup. Callers go
//! through [`FeatureServices`], which turns absence into
//! [`GatewayError::FeatureDisabled`].

pub mod test_generation;
pub mod translation;

use crate::config::CompanionConfig;
use crate::error::GatewayError;
use crate::pool::ClientPool;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub use test_generation::{TestGenerationRequest, TestGenerationResult, TestGenerationService};
pub use translation::{TranslationRequest, TranslationResult, TranslationService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Translation,
    TestGeneration,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Translation => f.write_str("translation"),
            Feature::TestGeneration => f.write_str("test-generation"),
        }
    }
}

/// The façades that exist in this process.
pub struct FeatureServices {
    translation: Option<Arc<TranslationService>>,
    test_generation: Option<Arc<TestGenerationService>>,
}

impl FeatureServices {
    pub fn build(config: &CompanionConfig, pool: &ClientPool) -> Result<Self, GatewayError> {
        let translation = config
            .features
            .translation
            .enabled
            .then(|| Arc::new(TranslationService::new(pool.code_model_client())));

        let test_generation = if config.features.test_generation.enabled {
            Some(Arc::new(TestGenerationService::new(
                pool.assistant_client()?,
            )))
        } else {
            None
        };

        tracing::info!(
            translation = translation.is_some(),
            test_generation = test_generation.is_some(),
            "Feature services initialized"
        );

        Ok(Self {
            translation,
            test_generation,
        })
    }

    pub fn translation(&self) -> Result<&TranslationService, GatewayError> {
        self.translation
            .as_deref()
            .ok_or(GatewayError::FeatureDisabled(Feature::Translation))
    }

    pub fn test_generation(&self) -> Result<&TestGenerationService, GatewayError> {
        self.test_generation
            .as_deref()
            .ok_or(GatewayError::FeatureDisabled(Feature::TestGeneration))
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Translation => self.translation.is_some(),
            Feature::TestGeneration => self.test_generation.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockBackendFactory;
    use config::Config;

    fn build(translation: bool, test_generation: bool) -> FeatureServices {
        let builder = Config::builder()
            .set_override("aws.region", "eu-west-1")
            .unwrap()
            .set_override("aws.bedrock.timeout_ms", 1000)
            .unwrap()
            .set_override("aws.q.timeout_ms", 1000)
            .unwrap()
            .set_override("aws.q.application_id", "app-123")
            .unwrap()
            .set_override("features.translation.enabled", translation)
            .unwrap()
            .set_override("features.test_generation.enabled", test_generation)
            .unwrap();
        let config = CompanionConfig::from_builder(builder).unwrap();
        let pool = ClientPool::build(&config, &MockBackendFactory::default()).unwrap();
        FeatureServices::build(&config, &pool).unwrap()
    }

    #[test]
    fn disabled_facades_do_not_exist() {
        let services = build(false, false);

        assert!(!services.is_enabled(Feature::Translation));
        assert!(!services.is_enabled(Feature::TestGeneration));
        assert!(matches!(
            services.translation(),
            Err(GatewayError::FeatureDisabled(Feature::Translation))
        ));
        assert!(matches!(
            services.test_generation(),
            Err(GatewayError::FeatureDisabled(Feature::TestGeneration))
        ));
    }

    #[test]
    fn flags_are_independent() {
        let services = build(true, false);
        assert!(services.translation().is_ok());
        assert!(services.test_generation().is_err());

        let services = build(false, true);
        assert!(services.translation().is_err());
        assert!(services.test_generation().is_ok());
    }

    #[test]
    fn feature_names_are_kebab_case() {
        assert_eq!(Feature::TestGeneration.to_string(), "test-generation");
        assert_eq!(
            serde_json::to_value(Feature::TestGeneration).unwrap(),
            "test-generation"
        );
    }
}
