use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mime::Mime;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::state::AppState;

const DEFAULT_FOLDER: &str = "uploads";
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024; // 5 MiB
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn storage_error(context: &str, err: std::io::Error) -> Response {
    tracing::error!("{context}: {err:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal error" })),
    )
        .into_response()
}

fn is_allowed_image(mime: &Mime) -> bool {
    mime.type_() == mime::IMAGE
        && matches!(
            mime.subtype().as_str(),
            "jpeg" | "jpg" | "png" | "gif" | "webp"
        )
}

/// Client-supplied folder paths must stay inside the public root: normal
/// components only, no parent references. A leading or trailing slash is
/// tolerated and stripped.
fn safe_subpath(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains("..") || trimmed.contains('\\') {
        return None;
    }
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// A plain file name: no separators, no parent references, not hidden.
fn safe_filename(raw: &str) -> Option<&str> {
    let name = raw.trim();
    if name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
    {
        return None;
    }
    Some(name)
}

fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Display order is encoded in the zero-padded numeric filename prefix.
fn numeric_prefix(name: &str) -> i64 {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

// POST /upload - fields: file, optional folder (default "uploads")
pub async fn upload_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut folder = DEFAULT_FOLDER.to_string();
    let mut file: Option<(String, Option<Mime>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name().unwrap_or("") {
            "folder" => {
                if let Ok(text) = field.text().await {
                    if !text.trim().is_empty() {
                        folder = text;
                    }
                }
            }
            "file" => {
                let original_name = field.file_name().unwrap_or("unknown.jpg").to_string();
                let content_type = field.content_type().and_then(|ct| ct.parse::<Mime>().ok());
                match field.bytes().await {
                    Ok(data) => file = Some((original_name, content_type, data)),
                    Err(_) => return bad_request("could not read the uploaded file"),
                }
            }
            _ => {}
        }
    }

    let Some((original_name, content_type, data)) = file else {
        return bad_request("missing 'file' field");
    };

    if data.len() > MAX_IMAGE_BYTES {
        return bad_request("file exceeds the 5 MiB limit");
    }

    match content_type {
        Some(ref mime) if is_allowed_image(mime) => {}
        _ => return bad_request("only jpeg, jpg, png, gif and webp images are allowed"),
    }

    let Some(folder) = safe_subpath(&folder) else {
        return bad_request("invalid folder path");
    };

    let extension = Path::new(&original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg");
    let filename = format!("{}.{}", Uuid::new_v4(), extension);

    let dir = state.public_root.join(&folder);
    if let Err(err) = fs::create_dir_all(&dir).await {
        return storage_error("creating upload folder", err);
    }
    if let Err(err) = fs::write(dir.join(&filename), &data).await {
        return storage_error("writing upload", err);
    }

    let url = format!("/public/{}/{}", folder, filename);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "filename": filename,
            "url": url,
            "original_name": original_name,
        })),
    )
        .into_response()
}

// POST /upload/post-folder - fields: file, folderPath, filename.
// The caller supplies zero-padded filenames (00.jpg, 01.jpg, ...); the file is
// written verbatim and order falls out of the names.
pub async fn upload_to_post_folder_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut folder_path: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut file: Option<(Option<Mime>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name().unwrap_or("") {
            "folderPath" => folder_path = field.text().await.ok(),
            "filename" => filename = field.text().await.ok(),
            "file" => {
                let content_type = field.content_type().and_then(|ct| ct.parse::<Mime>().ok());
                match field.bytes().await {
                    Ok(data) => file = Some((content_type, data)),
                    Err(_) => return bad_request("could not read the uploaded file"),
                }
            }
            _ => {}
        }
    }

    let Some((content_type, data)) = file else {
        return bad_request("missing 'file' field");
    };
    let Some(folder_path) = folder_path.as_deref().and_then(safe_subpath) else {
        return bad_request("missing or invalid 'folderPath' field");
    };
    let Some(filename) = filename.as_deref().and_then(safe_filename).map(String::from) else {
        return bad_request("missing or invalid 'filename' field");
    };

    match content_type {
        Some(ref mime) if is_allowed_image(mime) => {}
        _ => return bad_request("only jpeg, jpg, png, gif and webp images are allowed"),
    }

    let dir = state.public_root.join(&folder_path);
    if let Err(err) = fs::create_dir_all(&dir).await {
        return storage_error("creating post folder", err);
    }
    if let Err(err) = fs::write(dir.join(&filename), &data).await {
        return storage_error("writing post image", err);
    }

    let url = format!("/public/{}/{}", folder_path, filename);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "filename": filename, "url": url })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    #[serde(rename = "folderPath")]
    pub folder_path: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FolderImage {
    pub filename: String,
    pub url: String,
    pub position: i64,
}

// GET /upload/post-folder?folderPath=...
pub async fn list_post_folder_handler(
    State(state): State<AppState>,
    query: Option<Query<FolderQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return bad_request("missing 'folderPath'");
    };
    let Some(folder_path) = safe_subpath(&query.folder_path) else {
        return bad_request("invalid 'folderPath'");
    };

    match list_folder_images(&state.public_root, &folder_path).await {
        Ok(images) => {
            (StatusCode::OK, Json(serde_json::json!({ "images": images }))).into_response()
        }
        Err(err) => storage_error("listing post folder", err),
    }
}

// DELETE /upload/post-folder?folderPath=...
pub async fn delete_post_folder_handler(
    State(state): State<AppState>,
    query: Option<Query<FolderQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return bad_request("missing 'folderPath'");
    };
    let Some(folder_path) = safe_subpath(&query.folder_path) else {
        return bad_request("invalid 'folderPath'");
    };

    match fs::remove_dir_all(state.public_root.join(&folder_path)).await {
        // a folder that never existed has nothing left to delete either
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return storage_error("deleting post folder", err),
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}

/// Scans a post folder, keeps image files, sorts lexicographically (the
/// zero-padded prefixes make that numeric order) and derives each position
/// from the prefix. A missing folder lists as empty.
async fn list_folder_images(
    public_root: &Path,
    folder_path: &str,
) -> std::io::Result<Vec<FolderImage>> {
    let dir: PathBuf = public_root.join(folder_path);
    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_image_extension(&name) {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| FolderImage {
            url: format!("/public/{}/{}", folder_path, name),
            position: numeric_prefix(&name),
            filename: name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_allow_list() {
        for allowed in ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"] {
            assert!(is_allowed_image(&allowed.parse().unwrap()), "{allowed}");
        }
        for rejected in ["text/plain", "image/svg+xml", "application/pdf", "video/mp4"] {
            assert!(!is_allowed_image(&rejected.parse().unwrap()), "{rejected}");
        }
    }

    #[test]
    fn subpaths_stay_inside_the_public_root() {
        assert_eq!(safe_subpath("uploads").as_deref(), Some("uploads"));
        assert_eq!(
            safe_subpath("posts/summer-2025").as_deref(),
            Some("posts/summer-2025")
        );
        assert_eq!(safe_subpath("/posts/").as_deref(), Some("posts"));
        assert_eq!(safe_subpath("./posts").as_deref(), Some("posts"));

        assert_eq!(safe_subpath(""), None);
        assert_eq!(safe_subpath("../etc"), None);
        assert_eq!(safe_subpath("posts/../../etc"), None);
        assert_eq!(safe_subpath("/"), None);
    }

    #[test]
    fn filenames_are_bare_names() {
        assert_eq!(safe_filename("00.jpg"), Some("00.jpg"));
        assert_eq!(safe_filename(" 01.webp "), Some("01.webp"));
        assert_eq!(safe_filename("a/b.jpg"), None);
        assert_eq!(safe_filename("..\\x.jpg"), None);
        assert_eq!(safe_filename(".hidden"), None);
        assert_eq!(safe_filename(""), None);
    }

    #[test]
    fn positions_come_from_the_numeric_prefix() {
        assert_eq!(numeric_prefix("00.jpg"), 0);
        assert_eq!(numeric_prefix("07.png"), 7);
        assert_eq!(numeric_prefix("12-cover.jpg"), 12);
        assert_eq!(numeric_prefix("cover.jpg"), 0);
    }

    #[tokio::test]
    async fn listing_orders_by_zero_padded_prefix() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("posts/session");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["00.jpg", "02.jpg", "01.jpg", "notes.txt", "10.webp"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let images = list_folder_images(root.path(), "posts/session").await.unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["00.jpg", "01.jpg", "02.jpg", "10.webp"]);
        let positions: Vec<i64> = images.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 10]);
        assert_eq!(images[0].url, "/public/posts/session/00.jpg");
    }

    #[tokio::test]
    async fn listing_a_missing_folder_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let images = list_folder_images(root.path(), "posts/none").await.unwrap();
        assert!(images.is_empty());
    }
}
