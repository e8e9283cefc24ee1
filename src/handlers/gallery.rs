use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::store_error;
use crate::models::collection::CollectionPayload;
use crate::state::AppState;
use crate::store::gallery;

// GET /gallery/collections - images and per-image tags attached
pub async fn list_collections_handler(State(state): State<AppState>) -> impl IntoResponse {
    match gallery::list_collections(&state.db).await {
        Ok(collections) => (StatusCode::OK, Json(collections)).into_response(),
        Err(err) => store_error("listing collections", err),
    }
}

// GET /gallery/collections/:id
pub async fn get_collection_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match gallery::get_collection(&state.db, id).await {
        Ok(collection) => (StatusCode::OK, Json(collection)).into_response(),
        Err(err) => store_error("fetching collection", err),
    }
}

// POST /gallery/collections
pub async fn create_collection_handler(
    State(state): State<AppState>,
    Json(payload): Json<CollectionPayload>,
) -> impl IntoResponse {
    match gallery::create_collection(&state.db, payload).await {
        Ok(collection) => (StatusCode::CREATED, Json(collection)).into_response(),
        Err(err) => store_error("creating collection", err),
    }
}

// PUT /gallery/collections/:id
pub async fn update_collection_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<CollectionPayload>,
) -> impl IntoResponse {
    match gallery::update_collection(&state.db, id, payload).await {
        Ok(collection) => (StatusCode::OK, Json(collection)).into_response(),
        Err(err) => store_error("updating collection", err),
    }
}

// DELETE /gallery/collections/:id - removes the images and their tags too
pub async fn delete_collection_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match gallery::delete_collection(&state.db, id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => store_error("deleting collection", err),
    }
}
