//! Image upload API handler.
//!
//! Bytes in, referenceable URI out: the uploaded file lands under the data
//! directory and comes back as a `/uploads/...` URL the document can store
//! for logos, photos, backgrounds, and QR images.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::store::uploads_dir;

use super::super::state::AppState;

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// POST /api/upload-image - Upload an image file (multipart field "image").
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut filename = String::from("upload");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Upload read error: {e}")))?;
            image_data = Some(bytes.to_vec());
        }
    }

    let Some(bytes) = image_data else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Missing multipart field 'image'".to_string(),
        ));
    };

    // The claimed type must be an image; the decode below is the real check.
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Not an image upload: {filename}"),
        ));
    }

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Undecodable image: {e}")))?;

    let ext = std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();
    let stored_name = format!("{}.{ext}", Uuid::new_v4());

    let dir = uploads_dir(&state.config.data_dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {e}")))?;
    tokio::fs::write(dir.join(&stored_name), &bytes)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {e}")))?;

    let url = format!("/uploads/{stored_name}");
    println!("[upload] {filename} -> {url} ({}x{})", decoded.width(), decoded.height());

    // Warm the render cache so the next preview doesn't re-decode.
    state.image_cache.write().await.insert(url.clone(), decoded.clone());

    Ok(Json(UploadResponse {
        url,
        width: decoded.width(),
        height: decoded.height(),
    }))
}
