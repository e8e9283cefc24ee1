use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named, ordered group of gallery images, tags attached per image.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GalleryImage {
    pub id: i64,
    pub collection_id: i64,
    pub url: String,
    pub position: i64,
    pub tags: Vec<String>,
}

#[derive(Debug, FromRow)]
pub struct CollectionRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub collection_id: i64,
    pub url: String,
    pub position: i64,
}

/// Body for POST/PUT /gallery/collections. When `images` is present the whole
/// image set (and every image's tags) is replaced; omitted, existing images
/// are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionPayload {
    pub name: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    pub url: String,
    /// Display order; defaults to the image's index in the payload.
    pub position: Option<i64>,
    pub tags: Option<Vec<String>>,
}
