//! Blog post access layer. All statements are parameterized; the only SQL
//! fragments ever interpolated are the sort column and direction, both
//! resolved through the fixed allow-lists below.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{StoreError, StoreResult};
use crate::db::{codec, DbPool};
use crate::models::post::{BlogPost, FilterOptions, PostKey, PostPayload, PostRow};
use crate::utils::slug::slugify;

const POST_COLUMNS: &str = "id, title, subtitle, subtitle_position, content, excerpt, \
     cover_image, category, tags, author, published_at, status, views, likes, images, \
     seo, is_active, slug, folder_path, created_at, updated_at";

/// Maps a requested sort key to a column reference. Unknown keys fall back to
/// `created_at` rather than erroring: a listing should not 500 over a bad
/// query parameter.
fn sort_column(key: Option<&str>) -> &'static str {
    match key {
        Some("published_at") | Some("publishedAt") => "published_at",
        Some("updated_at") | Some("updatedAt") => "updated_at",
        Some("title") => "title",
        Some("views") => "views",
        Some("likes") => "likes",
        _ => "created_at",
    }
}

fn sort_direction(key: Option<&str>) -> &'static str {
    match key {
        Some(dir) if dir.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    }
}

pub async fn list_posts(pool: &DbPool, opts: &FilterOptions) -> StoreResult<Vec<BlogPost>> {
    let status = opts.status.clone().unwrap_or_else(|| "published".to_string());
    // tags is a JSON array in TEXT; an exact tag match is the quoted element
    // appearing anywhere in the serialized form
    let tag_pattern = opts.tag.as_ref().map(|tag| format!("%\"{}\"%", tag));

    let sql = format!(
        "SELECT {POST_COLUMNS} FROM blog_posts \
         WHERE status = ?1 \
           AND (?2 IS NULL OR category = ?2) \
           AND (?3 IS NULL OR author = ?3) \
           AND (?4 IS NULL OR tags LIKE ?4) \
         ORDER BY {} {} \
         LIMIT ?5",
        sort_column(opts.sort_by.as_deref()),
        sort_direction(opts.sort_order.as_deref()),
    );

    // LIMIT -1 is sqlite for "no limit"
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(&status)
        .bind(&opts.category)
        .bind(&opts.author)
        .bind(&tag_pattern)
        .bind(opts.limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(BlogPost::from).collect())
}

pub async fn get_post(pool: &DbPool, key: &PostKey) -> StoreResult<BlogPost> {
    let sql_by_id = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?1");
    let sql_by_slug = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = ?1");

    let row = match key {
        PostKey::Id(id) => {
            sqlx::query_as::<_, PostRow>(&sql_by_id)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        PostKey::Slug(slug) => {
            sqlx::query_as::<_, PostRow>(&sql_by_slug)
                .bind(slug)
                .fetch_optional(pool)
                .await?
        }
    };

    row.map(BlogPost::from).ok_or(StoreError::NotFound)
}

pub async fn create_post(pool: &DbPool, payload: PostPayload) -> StoreResult<BlogPost> {
    let fields = ResolvedPost::from_payload(payload)?;
    let now = Utc::now();

    let sql = format!(
        "INSERT INTO blog_posts (title, subtitle, subtitle_position, content, excerpt, \
             cover_image, category, tags, author, published_at, status, images, seo, \
             is_active, slug, folder_path, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18) \
         RETURNING {POST_COLUMNS}"
    );

    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(&fields.title)
        .bind(&fields.subtitle)
        .bind(&fields.subtitle_position)
        .bind(&fields.content)
        .bind(&fields.excerpt)
        .bind(&fields.cover_image)
        .bind(&fields.category)
        .bind(&fields.tags)
        .bind(&fields.author)
        .bind(fields.published_at)
        .bind(&fields.status)
        .bind(&fields.images)
        .bind(&fields.seo)
        .bind(fields.is_active)
        .bind(&fields.slug)
        .bind(&fields.folder_path)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

    Ok(BlogPost::from(row))
}

/// Full-record replace. Create's defaulting rules apply; the server-managed
/// columns (views, likes, created_at) are left untouched.
pub async fn replace_post(
    pool: &DbPool,
    key: &PostKey,
    payload: PostPayload,
) -> StoreResult<BlogPost> {
    let fields = ResolvedPost::from_payload(payload)?;
    let now = Utc::now();

    let set_clause = "title = ?1, subtitle = ?2, subtitle_position = ?3, content = ?4, \
         excerpt = ?5, cover_image = ?6, category = ?7, tags = ?8, author = ?9, \
         published_at = ?10, status = ?11, images = ?12, seo = ?13, is_active = ?14, \
         slug = ?15, folder_path = ?16, updated_at = ?17";

    let sql = match key {
        PostKey::Id(_) => {
            format!("UPDATE blog_posts SET {set_clause} WHERE id = ?18 RETURNING {POST_COLUMNS}")
        }
        PostKey::Slug(_) => {
            format!("UPDATE blog_posts SET {set_clause} WHERE slug = ?18 RETURNING {POST_COLUMNS}")
        }
    };

    let query = sqlx::query_as::<_, PostRow>(&sql)
        .bind(&fields.title)
        .bind(&fields.subtitle)
        .bind(&fields.subtitle_position)
        .bind(&fields.content)
        .bind(&fields.excerpt)
        .bind(&fields.cover_image)
        .bind(&fields.category)
        .bind(&fields.tags)
        .bind(&fields.author)
        .bind(fields.published_at)
        .bind(&fields.status)
        .bind(&fields.images)
        .bind(&fields.seo)
        .bind(fields.is_active)
        .bind(&fields.slug)
        .bind(&fields.folder_path)
        .bind(now);

    let row = match key {
        PostKey::Id(id) => query.bind(id).fetch_optional(pool).await?,
        PostKey::Slug(slug) => query.bind(slug).fetch_optional(pool).await?,
    };

    row.map(BlogPost::from).ok_or(StoreError::NotFound)
}

/// Unconditional removal; deleting an absent post is still a success.
pub async fn delete_post(pool: &DbPool, key: &PostKey) -> StoreResult<()> {
    match key {
        PostKey::Id(id) => {
            sqlx::query("DELETE FROM blog_posts WHERE id = ?1")
                .bind(id)
                .execute(pool)
                .await?;
        }
        PostKey::Slug(slug) => {
            sqlx::query("DELETE FROM blog_posts WHERE slug = ?1")
                .bind(slug)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

pub async fn bump_views(pool: &DbPool, key: &PostKey) -> StoreResult<i64> {
    bump_counter(pool, key, "views").await
}

pub async fn bump_likes(pool: &DbPool, key: &PostKey) -> StoreResult<i64> {
    bump_counter(pool, key, "likes").await
}

async fn bump_counter(pool: &DbPool, key: &PostKey, counter: &'static str) -> StoreResult<i64> {
    let value = match key {
        PostKey::Id(id) => {
            let sql = format!(
                "UPDATE blog_posts SET {counter} = {counter} + 1 WHERE id = ?1 RETURNING {counter}"
            );
            sqlx::query_scalar::<_, i64>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        PostKey::Slug(slug) => {
            let sql = format!(
                "UPDATE blog_posts SET {counter} = {counter} + 1 WHERE slug = ?1 RETURNING {counter}"
            );
            sqlx::query_scalar::<_, i64>(&sql)
                .bind(slug)
                .fetch_optional(pool)
                .await?
        }
    };

    value.ok_or(StoreError::NotFound)
}

/// Payload with create's defaulting rules applied and the JSON columns
/// already encoded for storage.
struct ResolvedPost {
    title: String,
    subtitle: String,
    subtitle_position: String,
    content: String,
    excerpt: String,
    cover_image: String,
    category: String,
    tags: String,
    author: String,
    published_at: DateTime<Utc>,
    status: String,
    images: String,
    seo: String,
    is_active: bool,
    slug: String,
    folder_path: Option<String>,
}

impl ResolvedPost {
    fn from_payload(payload: PostPayload) -> StoreResult<Self> {
        let title = required(payload.title, "title is required")?;
        let content = required(payload.content, "content is required")?;
        let category = required(payload.category, "category is required")?;

        let slug = match payload.slug.filter(|s| !s.trim().is_empty()) {
            Some(slug) => slug,
            None => slugify(&title),
        };

        Ok(ResolvedPost {
            subtitle: payload.subtitle.unwrap_or_default(),
            subtitle_position: payload
                .subtitle_position
                .unwrap_or_else(|| "after".to_string()),
            excerpt: payload.excerpt.unwrap_or_default(),
            cover_image: payload.cover_image.unwrap_or_default(),
            tags: codec::encode(&payload.tags.unwrap_or_default()),
            author: payload.author.unwrap_or_else(|| "Admin".to_string()),
            published_at: payload.published_at.unwrap_or_else(Utc::now),
            status: payload.status.unwrap_or_else(|| "draft".to_string()),
            images: codec::encode(&payload.images.unwrap_or_default()),
            seo: codec::encode(&payload.seo.unwrap_or_else(Map::<String, Value>::new)),
            is_active: payload.is_active.unwrap_or(true),
            folder_path: payload.folder_path,
            title,
            content,
            category,
            slug,
        })
    }
}

fn required(value: Option<String>, message: &'static str) -> StoreResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(StoreError::Invalid(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, DbPool};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> DbPool {
        // one connection: a :memory: database exists per connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn minimal_payload(title: &str) -> PostPayload {
        PostPayload {
            title: Some(title.to_string()),
            content: Some("Body".to_string()),
            category: Some("weddings".to_string()),
            ..PostPayload::default()
        }
    }

    #[test]
    fn sort_keys_resolve_through_the_allow_list() {
        assert_eq!(sort_column(Some("views")), "views");
        assert_eq!(sort_column(Some("publishedAt")), "published_at");
        // nothing a caller sends reaches the SQL string
        assert_eq!(sort_column(Some("views; DROP TABLE blog_posts")), "created_at");
        assert_eq!(sort_column(None), "created_at");

        assert_eq!(sort_direction(Some("ASC")), "ASC");
        assert_eq!(sort_direction(Some("desc")), "DESC");
        assert_eq!(sort_direction(Some("sideways")), "DESC");
    }

    #[tokio::test]
    async fn create_applies_documented_defaults() {
        let pool = test_pool().await;
        let post = create_post(&pool, minimal_payload("A Day In The Studio"))
            .await
            .unwrap();

        assert_eq!(post.author, "Admin");
        assert_eq!(post.status, "draft");
        assert_eq!(post.subtitle_position, "after");
        assert_eq!(post.slug, "a-day-in-the-studio");
        assert!(post.published_at.is_some());
        assert!(post.is_active);
        assert_eq!(post.views, 0);
        assert_eq!(post.likes, 0);
        assert!(post.tags.is_empty());
        assert!(post.images.is_empty());
        assert!(post.seo.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_missing_required_fields() {
        let pool = test_pool().await;
        let payload = PostPayload {
            title: Some("No body".to_string()),
            category: Some("misc".to_string()),
            ..PostPayload::default()
        };

        match create_post(&pool, payload).await {
            Err(StoreError::Invalid(msg)) => assert_eq!(msg, "content is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn json_columns_round_trip() {
        let pool = test_pool().await;
        let mut payload = minimal_payload("Tagged");
        payload.tags = Some(vec!["portrait".to_string(), "outdoor".to_string()]);
        payload.images = Some(vec!["/public/posts/tagged/00.jpg".to_string()]);
        let seo = json!({ "description": "shoot notes", "og": { "width": 1200 } });
        payload.seo = Some(seo.as_object().unwrap().clone());

        let created = create_post(&pool, payload).await.unwrap();
        let fetched = get_post(&pool, &PostKey::Id(created.id)).await.unwrap();

        assert_eq!(fetched.tags, vec!["portrait", "outdoor"]);
        assert_eq!(fetched.images, vec!["/public/posts/tagged/00.jpg"]);
        assert_eq!(fetched.seo, *seo.as_object().unwrap());
    }

    #[tokio::test]
    async fn id_and_slug_return_the_same_record() {
        let pool = test_pool().await;
        let created = create_post(&pool, minimal_payload("Golden Hour")).await.unwrap();

        let by_id = get_post(&pool, &PostKey::parse(&created.id.to_string()))
            .await
            .unwrap();
        let by_slug = get_post(&pool, &PostKey::parse("golden-hour")).await.unwrap();

        assert_eq!(by_id, by_slug);
    }

    #[tokio::test]
    async fn get_missing_post_is_not_found() {
        let pool = test_pool().await;
        match get_post(&pool, &PostKey::Slug("nope".to_string())).await {
            Err(StoreError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_filters_by_status_and_tag() {
        let pool = test_pool().await;

        let mut published = minimal_payload("Published");
        published.status = Some("published".to_string());
        published.tags = Some(vec!["studio".to_string()]);
        create_post(&pool, published).await.unwrap();

        create_post(&pool, minimal_payload("Draft")).await.unwrap();

        // default status filter is "published"
        let listed = list_posts(&pool, &FilterOptions::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Published");

        let drafts = list_posts(
            &pool,
            &FilterOptions {
                status: Some("draft".to_string()),
                ..FilterOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Draft");

        let tagged = list_posts(
            &pool,
            &FilterOptions {
                tag: Some("studio".to_string()),
                ..FilterOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(tagged.len(), 1);

        let untagged = list_posts(
            &pool,
            &FilterOptions {
                tag: Some("street".to_string()),
                ..FilterOptions::default()
            },
        )
        .await
        .unwrap();
        assert!(untagged.is_empty());
    }

    #[tokio::test]
    async fn list_honors_limit_and_sort() {
        let pool = test_pool().await;
        for title in ["One", "Two", "Three"] {
            let mut payload = minimal_payload(title);
            payload.status = Some("published".to_string());
            create_post(&pool, payload).await.unwrap();
        }

        let listed = list_posts(
            &pool,
            &FilterOptions {
                limit: Some(2),
                sort_by: Some("title".to_string()),
                sort_order: Some("asc".to_string()),
                ..FilterOptions::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "One");
        assert_eq!(listed[1].title, "Three");
    }

    #[tokio::test]
    async fn replace_is_a_full_record_swap_that_keeps_counters() {
        let pool = test_pool().await;
        let mut payload = minimal_payload("Before");
        payload.excerpt = Some("original excerpt".to_string());
        let created = create_post(&pool, payload).await.unwrap();

        bump_views(&pool, &PostKey::Id(created.id)).await.unwrap();
        bump_views(&pool, &PostKey::Id(created.id)).await.unwrap();
        bump_likes(&pool, &PostKey::Id(created.id)).await.unwrap();

        // replace without an excerpt: the field resets to its default
        let replaced = replace_post(&pool, &PostKey::Id(created.id), minimal_payload("After"))
            .await
            .unwrap();

        assert_eq!(replaced.title, "After");
        assert_eq!(replaced.slug, "after");
        assert_eq!(replaced.excerpt, "");
        assert_eq!(replaced.views, 2);
        assert_eq!(replaced.likes, 1);
        assert_eq!(replaced.created_at, created.created_at);
        assert!(replaced.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn replace_missing_post_is_not_found() {
        let pool = test_pool().await;
        match replace_post(&pool, &PostKey::Id(999), minimal_payload("X")).await {
            Err(StoreError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let pool = test_pool().await;
        let created = create_post(&pool, minimal_payload("Gone")).await.unwrap();
        let key = PostKey::Id(created.id);

        delete_post(&pool, &key).await.unwrap();
        // second delete of the same id is still a success
        delete_post(&pool, &key).await.unwrap();

        match get_post(&pool, &key).await {
            Err(StoreError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn counter_bumps_report_the_new_value() {
        let pool = test_pool().await;
        let created = create_post(&pool, minimal_payload("Counted")).await.unwrap();
        let key = PostKey::Slug("counted".to_string());

        assert_eq!(bump_views(&pool, &key).await.unwrap(), 1);
        assert_eq!(bump_views(&pool, &key).await.unwrap(), 2);
        assert_eq!(bump_likes(&pool, &key).await.unwrap(), 1);

        let post = get_post(&pool, &PostKey::Id(created.id)).await.unwrap();
        assert_eq!(post.views, 2);
        assert_eq!(post.likes, 1);
    }
}
