use crate::services::{
    Feature, TestGenerationRequest, TestGenerationResult, TranslationRequest, TranslationResult,
};
use crate::error::GatewayError;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct FeatureStatus {
    pub feature: Feature,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct FeatureList {
    pub features: Vec<FeatureStatus>,
}

pub async fn list_features(State(state): State<AppState>) -> Json<FeatureList> {
    let features = [Feature::Translation, Feature::TestGeneration]
        .into_iter()
        .map(|feature| FeatureStatus {
            feature,
            enabled: state.features.is_enabled(feature),
        })
        .collect();

    Json(FeatureList { features })
}

/// Malformed bodies become a JSON 400, after the feature check.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))
}

pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> Result<Json<TranslationResult>, AppError> {
    let service = state.features.translation()?;
    let request = body(payload)?;
    request.validate()?;

    Ok(Json(service.translate(request).await?))
}

pub async fn generate_tests(
    State(state): State<AppState>,
    payload: Result<Json<TestGenerationRequest>, JsonRejection>,
) -> Result<Json<TestGenerationResult>, AppError> {
    let service = state.features.test_generation()?;
    let request = body(payload)?;
    request.validate()?;

    Ok(Json(service.generate(request).await?))
}
