use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::db::codec;

/// A blog post as callers see it: JSON columns decoded into native
/// structures, booleans real.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    /// Whether the subtitle renders "before" or "after" the title.
    pub subtitle_position: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub status: String,
    pub views: i64,
    pub likes: i64,
    pub images: Vec<String>,
    pub seo: Map<String, Value>,
    pub is_active: bool,
    pub slug: String,
    pub folder_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row shape: `tags`, `images` and `seo` are still serialized TEXT.
/// The conversion below is the only place they get decoded.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub subtitle_position: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub tags: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub status: String,
    pub views: i64,
    pub likes: i64,
    pub images: String,
    pub seo: String,
    pub is_active: bool,
    pub slug: String,
    pub folder_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for BlogPost {
    fn from(row: PostRow) -> Self {
        BlogPost {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            subtitle_position: row.subtitle_position,
            content: row.content,
            excerpt: row.excerpt,
            cover_image: row.cover_image,
            category: row.category,
            tags: codec::decode_or_empty(&row.tags),
            author: row.author,
            published_at: row.published_at,
            status: row.status,
            views: row.views,
            likes: row.likes,
            images: codec::decode_or_empty(&row.images),
            seo: codec::decode_or_empty(&row.seo),
            is_active: row.is_active,
            slug: row.slug,
            folder_path: row.folder_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body for POST /blog and PUT /blog/:id_or_slug. Everything is optional so
/// missing required fields surface as a 400 with the JSON error envelope
/// instead of a deserialization rejection; defaults are applied in the store.
#[derive(Debug, Default, Deserialize)]
pub struct PostPayload {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub subtitle_position: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
    pub seo: Option<Map<String, Value>>,
    pub is_active: Option<bool>,
    pub slug: Option<String>,
    pub folder_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterOptions {
    pub status: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// A lookup key that parses as a number is a post id, anything else a slug.
#[derive(Debug, Clone, PartialEq)]
pub enum PostKey {
    Id(i64),
    Slug(String),
}

impl PostKey {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => PostKey::Id(id),
            Err(_) => PostKey::Slug(raw.to_string()),
        }
    }
}
