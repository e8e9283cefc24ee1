use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::store_error;
use crate::models::post::{FilterOptions, PostKey, PostPayload};
use crate::state::AppState;
use crate::store::blog;

// GET /blog?status=&category=&tag=&author=&limit=&sortBy=&sortOrder=
pub async fn list_posts_handler(
    opts: Option<Query<FilterOptions>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let Query(opts) = opts.unwrap_or(Query(FilterOptions::default()));

    match blog::list_posts(&state.db, &opts).await {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(err) => store_error("listing posts", err),
    }
}

// GET /blog/:id_or_slug
pub async fn get_post_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match blog::get_post(&state.db, &PostKey::parse(&key)).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(err) => store_error("fetching post", err),
    }
}

// POST /blog
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<PostPayload>,
) -> impl IntoResponse {
    match blog::create_post(&state.db, payload).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(err) => store_error("creating post", err),
    }
}

// PUT /blog/:id_or_slug - full-record replace
pub async fn update_post_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<PostPayload>,
) -> impl IntoResponse {
    match blog::replace_post(&state.db, &PostKey::parse(&key), payload).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(err) => store_error("updating post", err),
    }
}

// DELETE /blog/:id_or_slug - succeeds whether or not the post existed
pub async fn delete_post_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match blog::delete_post(&state.db, &PostKey::parse(&key)).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => store_error("deleting post", err),
    }
}

// POST /blog/:id_or_slug/view
pub async fn increment_views_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match blog::bump_views(&state.db, &PostKey::parse(&key)).await {
        Ok(views) => (StatusCode::OK, Json(json!({ "views": views }))).into_response(),
        Err(err) => store_error("incrementing views", err),
    }
}

// POST /blog/:id_or_slug/like
pub async fn increment_likes_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match blog::bump_likes(&state.db, &PostKey::parse(&key)).await {
        Ok(likes) => (StatusCode::OK, Json(json!({ "likes": likes }))).into_response(),
        Err(err) => store_error("incrementing likes", err),
    }
}
