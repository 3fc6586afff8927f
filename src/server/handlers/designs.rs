//! Design save/load API handlers.
//!
//! The request and response bodies are the exact document shape: the
//! transport's only job is to move that JSON; schema leniency lives in the
//! document types themselves.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::document::CardDocument;

use super::super::state::AppState;

/// Response from the save endpoint.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub id: String,
}

/// POST /api/save-design - Persist a document, returning its id.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(doc): Json<CardDocument>,
) -> Result<Json<SaveResponse>, (StatusCode, String)> {
    let id = state.designs.save(&doc).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Save failed: {e}"),
        )
    })?;
    println!("[designs] saved {id}");
    Ok(Json(SaveResponse { success: true, id }))
}

/// GET /api/get-design/:id - Fetch a stored document.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CardDocument>, (StatusCode, String)> {
    match state.designs.load(&id).await {
        Ok(Some(doc)) => Ok(Json(doc)),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("No design with id {id}"))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Load failed: {e}"),
        )),
    }
}
