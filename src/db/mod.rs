pub mod codec;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::env;
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

/// Opens the store file and brings the schema up to date. Called once at
/// startup; the pool is handed down to every handler through the router state.
pub async fn init_db() -> DbPool {
    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://studio.db?mode=rwc".to_string());

    let options = SqliteConnectOptions::from_str(&db_url)
        .expect("DATABASE_URL is not a valid sqlite URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("failed to open the database file");

    run_migrations(&pool)
        .await
        .expect("failed to create the schema");

    pool
}

/// Idempotent schema setup. Order matters for the foreign keys:
/// collections -> collection_images -> image_tags.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS blog_posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            subtitle_position TEXT NOT NULL DEFAULT 'after',
            content TEXT NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            cover_image TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            author TEXT NOT NULL DEFAULT 'Admin',
            published_at TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            views INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            images TEXT NOT NULL DEFAULT '[]',
            seo TEXT NOT NULL DEFAULT '{}',
            is_active INTEGER NOT NULL DEFAULT 1,
            slug TEXT NOT NULL,
            folder_path TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS collection_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
            url TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE TABLE IF NOT EXISTS image_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            image_id INTEGER NOT NULL REFERENCES collection_images(id) ON DELETE CASCADE,
            tag TEXT NOT NULL
        )",
        // slug lookups happen on every public post page
        "CREATE INDEX IF NOT EXISTS idx_blog_posts_slug ON blog_posts(slug)",
        "CREATE INDEX IF NOT EXISTS idx_collection_images_collection_id
            ON collection_images(collection_id)",
        "CREATE INDEX IF NOT EXISTS idx_image_tags_image_id ON image_tags(image_id)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
