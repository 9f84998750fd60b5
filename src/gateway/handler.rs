//! HTTP handlers for the meme administration API
//!
//! Provides 6 REST endpoints, each mapping 1:1 onto a repository
//! operation:
//! - GET    /api/v1/memes              — full record set
//! - POST   /api/v1/memes              — multipart upload (file + tag)
//! - DELETE /api/v1/memes/:id          — delete one record
//! - POST   /api/v1/memes/batch-delete — delete several records
//! - PATCH  /api/v1/memes/:id          — replace a record's tag
//! - GET    /api/v1/memes/:id/content  — raw payload bytes

use crate::api::ApiError;
use crate::error::Error;
use crate::repository::{MemeSource, MemeStore};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Tag applied to uploads that did not provide one
const DEFAULT_UPLOAD_TAG: &str = "uncategorized";

/// Shared state for meme admin handlers
#[derive(Clone)]
pub struct MemesState {
    pub store: Arc<MemeStore>,
}

/// Create the meme administration router
pub fn memes_router(state: MemesState) -> Router {
    Router::new()
        .route("/api/v1/memes", get(list_memes))
        .route("/api/v1/memes", post(upload_meme))
        .route("/api/v1/memes/batch-delete", post(batch_delete_memes))
        .route("/api/v1/memes/:id", delete(delete_meme))
        .route("/api/v1/memes/:id", patch(update_tag))
        .route("/api/v1/memes/:id/content", get(get_content))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/v1/memes
async fn list_memes(State(state): State<MemesState>) -> impl IntoResponse {
    Json(state.store.list().await)
}

/// POST /api/v1/memes
async fn upload_meme(
    State(state): State<MemesState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut file: Option<(Option<String>, bytes::Bytes)> = None;
    let mut tag = DEFAULT_UPLOAD_TAG.to_string();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().map(|s| s.to_string());
                match name.as_deref() {
                    Some("file") => {
                        let file_name = field.file_name().map(|s| s.to_string());
                        match field.bytes().await {
                            Ok(bytes) => file = Some((file_name, bytes)),
                            Err(e) => {
                                return (
                                    StatusCode::BAD_REQUEST,
                                    Json(api_error(ApiError::bad_request(format!(
                                        "Failed to read file field: {}",
                                        e
                                    )))),
                                );
                            }
                        }
                    }
                    Some("tag") => {
                        if let Ok(text) = field.text().await {
                            let trimmed = text.trim().to_string();
                            if !trimmed.is_empty() {
                                tag = trimmed;
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(api_error(ApiError::bad_request(format!(
                        "Malformed multipart body: {}",
                        e
                    )))),
                );
            }
        }
    }

    let Some((file_name, payload)) = file else {
        return (
            StatusCode::BAD_REQUEST,
            Json(api_error(ApiError::bad_request("Missing file field"))),
        );
    };

    match state
        .store
        .create(&payload, file_name.as_deref(), &tag, MemeSource::Manual)
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(serde_json::to_value(record).unwrap()),
        ),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/v1/memes/:id
async fn delete_meme(
    State(state): State<MemesState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.delete(&id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({ "deleted": record.id })),
        ),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct BatchDeleteRequest {
    ids: Vec<String>,
}

/// POST /api/v1/memes/batch-delete
async fn batch_delete_memes(
    State(state): State<MemesState>,
    Json(request): Json<BatchDeleteRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.batch_delete(&request.ids).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::to_value(outcome).unwrap()),
        ),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct UpdateTagRequest {
    tag: String,
}

/// PATCH /api/v1/memes/:id
async fn update_tag(
    State(state): State<MemesState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTagRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.update_tag(&id, &request.tag).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::to_value(record).unwrap()),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/memes/:id/content
async fn get_content(
    State(state): State<MemesState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(record) = state.store.get(&id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(api_error(ApiError::not_found(format!(
                "Meme '{}' not found",
                id
            )))),
        )
            .into_response();
    };

    match tokio::fs::read(state.store.payload_path(&record)).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&record.file_name))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Failed to read payload for {}: {}", record.id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(api_error(ApiError::internal("Payload unavailable"))),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map repository errors onto HTTP statuses
fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    match error {
        Error::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(api_error(ApiError::not_found(format!(
                "Meme '{}' not found",
                id
            )))),
        ),
        Error::Duplicate(hash) => (
            StatusCode::CONFLICT,
            Json(api_error(ApiError::conflict(format!(
                "Content already stored (hash {})",
                hash
            )))),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(api_error(ApiError::internal(other.to_string()))),
        ),
    }
}

fn api_error(error: ApiError) -> serde_json::Value {
    serde_json::to_value(error).unwrap()
}

/// Content type guessed from the payload file extension
fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
