pub mod blog;
pub mod gallery;
pub mod upload;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::store::StoreError;

/// Shared failure arm for the store-backed handlers: validation -> 400,
/// missing record -> 404, anything from the store itself -> logged 500 with a
/// generic body.
pub(crate) fn store_error(context: &str, err: StoreError) -> Response {
    match err {
        StoreError::Invalid(message) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        StoreError::NotFound => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
        }
        StoreError::Database(err) => {
            tracing::error!("{context}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}
