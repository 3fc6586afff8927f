//! Viewer preview handler.
//!
//! The viewer entry point: a stored document is fetched by id and handed
//! straight to the headless renderer. Nothing here depends on editing
//! state; this is the path that forces the document schema to stay
//! self-contained.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::document::{CardDocument, Face};
use crate::export::{RasterFormat, SnapshotOptions, encode_raster};
use crate::render;

use super::super::state::AppState;

fn default_face() -> String {
    "front".to_string()
}

fn default_format() -> String {
    "png".to_string()
}

fn default_scale() -> f64 {
    1.0
}

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default = "default_face")]
    pub face: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

/// GET /api/card/:id/preview - Render a stored design headlessly.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let doc = load_design(&state, &id).await?;
    let face = Face::parse(&query.face);
    let format = RasterFormat::parse(&query.format);
    let options = SnapshotOptions {
        format,
        scale: query.scale.clamp(0.05, 4.0),
    };

    // Every referenced image finishes loading (or times out) before the
    // snapshot below; taking it mid-load would bake in missing images.
    let resolver = state
        .resolver()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let resolved = render::resolve_images(&doc, &resolver).await;

    // Rendering is CPU work; keep it off the async workers.
    let bytes = tokio::task::spawn_blocking(move || {
        let img = render::render_face(&doc, face, &resolved);
        encode_raster(&img, options)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {e}")))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], bytes))
}

pub(super) async fn load_design(
    state: &AppState,
    id: &str,
) -> Result<CardDocument, (StatusCode, String)> {
    match state.designs.load(id).await {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("No design with id {id}"))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Load failed: {e}"),
        )),
    }
}
