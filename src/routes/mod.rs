use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use tower_http::services::ServeDir;

use crate::{
    db::DbPool,
    handlers::{blog, gallery, upload},
    state::AppState,
};

pub fn create_routes(pool: DbPool, public_root: PathBuf) -> Router {
    let state = AppState {
        db: pool,
        public_root: public_root.clone(),
    };

    Router::new()
        .route(
            "/blog",
            get(blog::list_posts_handler).post(blog::create_post_handler),
        )
        .route(
            "/blog/:id_or_slug",
            get(blog::get_post_handler)
                .put(blog::update_post_handler)
                .delete(blog::delete_post_handler),
        )
        .route("/blog/:id_or_slug/view", post(blog::increment_views_handler))
        .route("/blog/:id_or_slug/like", post(blog::increment_likes_handler))
        .route(
            "/gallery/collections",
            get(gallery::list_collections_handler).post(gallery::create_collection_handler),
        )
        .route(
            "/gallery/collections/:id",
            get(gallery::get_collection_handler)
                .put(gallery::update_collection_handler)
                .delete(gallery::delete_collection_handler),
        )
        .route("/upload", post(upload::upload_image_handler))
        .route(
            "/upload/post-folder",
            post(upload::upload_to_post_folder_handler)
                .get(upload::list_post_folder_handler)
                .delete(upload::delete_post_folder_handler),
        )
        // uploaded files are served straight from the public root
        .nest_service("/public", ServeDir::new(public_root))
        // above the 5 MiB per-file ceiling so the limit check answers, not the body cap
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(state)
}
