//! HTTP handlers for the Settings API
//!
//! Provides 2 REST endpoints:
//! - GET /api/v1/settings — current runtime settings
//! - PUT /api/v1/settings — partial update, returns the result

use crate::api::ApiError;
use crate::settings::store::{SettingsPatch, SettingsStore};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for settings handlers
#[derive(Clone)]
pub struct SettingsState {
    pub store: Arc<SettingsStore>,
}

/// Create the settings router
pub fn settings_router(state: SettingsState) -> Router {
    Router::new()
        .route("/api/v1/settings", get(get_settings))
        .route("/api/v1/settings", put(update_settings))
        .with_state(state)
}

/// GET /api/v1/settings
async fn get_settings(State(state): State<SettingsState>) -> impl IntoResponse {
    Json(state.store.get().await)
}

/// PUT /api/v1/settings
async fn update_settings(
    State(state): State<SettingsState>,
    Json(patch): Json<SettingsPatch>,
) -> impl IntoResponse {
    match state.store.update(patch).await {
        Ok(settings) => (StatusCode::OK, Json(serde_json::to_value(settings).unwrap())),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::to_value(ApiError::internal(e.to_string())).unwrap()),
        ),
    }
}
