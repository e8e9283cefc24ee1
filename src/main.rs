use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_backend::{db, routes};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::init_db().await;
    tracing::info!("✅ Store ready");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_root: PathBuf = std::env::var("PUBLIC_DIR")
        .unwrap_or_else(|_| "public".to_string())
        .into();

    let app = routes::create_routes(pool, public_root)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port = std::env::var("PORT").unwrap_or("3000".to_string());
    let addr: SocketAddr = format!("0.0.0.0:{}", port)
        .parse()
        .expect("invalid listen address");

    tracing::info!("🚀 Studio backend running on http://{}", addr);

    let listener = TcpListener::bind(addr).await.expect("failed to bind port");
    axum::serve(listener, app).await.unwrap();
}
