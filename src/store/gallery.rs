//! Collection access layer. A collection exclusively owns its images and each
//! image its tags; every delete and image-set replacement runs inside one
//! transaction so no orphaned rows survive.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use super::{StoreError, StoreResult};
use crate::db::DbPool;
use crate::models::collection::{
    Collection, CollectionPayload, CollectionRow, GalleryImage, ImagePayload, ImageRow,
};

/// Every collection, images and per-image tags eagerly attached.
pub async fn list_collections(pool: &DbPool) -> StoreResult<Vec<Collection>> {
    let rows = sqlx::query_as::<_, CollectionRow>(
        "SELECT id, name, category, created_at FROM collections ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut collections = Vec::with_capacity(rows.len());
    for row in rows {
        collections.push(attach_images(pool, row).await?);
    }
    Ok(collections)
}

pub async fn get_collection(pool: &DbPool, id: i64) -> StoreResult<Collection> {
    let row = sqlx::query_as::<_, CollectionRow>(
        "SELECT id, name, category, created_at FROM collections WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)?;

    attach_images(pool, row).await
}

pub async fn create_collection(pool: &DbPool, payload: CollectionPayload) -> StoreResult<Collection> {
    let name = required_name(payload.name)?;
    let category = payload.category.unwrap_or_default();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO collections (name, category, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(&name)
    .bind(&category)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    let id = result.last_insert_rowid();

    if let Some(images) = payload.images {
        insert_images(&mut tx, id, images).await?;
    }

    tx.commit().await?;

    get_collection(pool, id).await
}

/// Replaces the top-level fields; when the payload carries an image list the
/// whole image set (and every image's tags) is swapped for it.
pub async fn update_collection(
    pool: &DbPool,
    id: i64,
    payload: CollectionPayload,
) -> StoreResult<Collection> {
    let name = required_name(payload.name)?;
    let category = payload.category.unwrap_or_default();

    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE collections SET name = ?1, category = ?2 WHERE id = ?3")
        .bind(&name)
        .bind(&category)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    if let Some(images) = payload.images {
        delete_images(&mut tx, id).await?;
        insert_images(&mut tx, id, images).await?;
    }

    tx.commit().await?;

    get_collection(pool, id).await
}

/// Removes the collection, its images and their tags.
pub async fn delete_collection(pool: &DbPool, id: i64) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    delete_images(&mut tx, id).await?;

    let result = sqlx::query("DELETE FROM collections WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}

async fn attach_images(pool: &DbPool, row: CollectionRow) -> StoreResult<Collection> {
    let image_rows = sqlx::query_as::<_, ImageRow>(
        "SELECT id, collection_id, url, position FROM collection_images \
         WHERE collection_id = ?1 ORDER BY position ASC, id ASC",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let mut images = Vec::with_capacity(image_rows.len());
    for image in image_rows {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT tag FROM image_tags WHERE image_id = ?1 ORDER BY id ASC")
                .bind(image.id)
                .fetch_all(pool)
                .await?;
        images.push(GalleryImage {
            id: image.id,
            collection_id: image.collection_id,
            url: image.url,
            position: image.position,
            tags,
        });
    }

    Ok(Collection {
        id: row.id,
        name: row.name,
        category: row.category,
        created_at: row.created_at,
        images,
    })
}

async fn insert_images(
    tx: &mut Transaction<'_, Sqlite>,
    collection_id: i64,
    images: Vec<ImagePayload>,
) -> Result<(), sqlx::Error> {
    for (index, image) in images.into_iter().enumerate() {
        let position = image.position.unwrap_or(index as i64);
        let result = sqlx::query(
            "INSERT INTO collection_images (collection_id, url, position) VALUES (?1, ?2, ?3)",
        )
        .bind(collection_id)
        .bind(&image.url)
        .bind(position)
        .execute(&mut **tx)
        .await?;
        let image_id = result.last_insert_rowid();

        for tag in image.tags.unwrap_or_default() {
            sqlx::query("INSERT INTO image_tags (image_id, tag) VALUES (?1, ?2)")
                .bind(image_id)
                .bind(&tag)
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

async fn delete_images(
    tx: &mut Transaction<'_, Sqlite>,
    collection_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM image_tags WHERE image_id IN \
         (SELECT id FROM collection_images WHERE collection_id = ?1)",
    )
    .bind(collection_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM collection_images WHERE collection_id = ?1")
        .bind(collection_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn required_name(name: Option<String>) -> StoreResult<String> {
    name.filter(|n| !n.trim().is_empty())
        .ok_or(StoreError::Invalid("name is required"))
}
