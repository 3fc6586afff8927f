//! Per-design export handlers: PDF, vCard, QR.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::export::{pdf, qr, vcard};
use crate::render;

use super::super::state::AppState;
use super::preview::load_design;

/// GET /api/card/:id/export/pdf - Two-page card PDF.
pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let doc = load_design(&state, &id).await?;
    let resolver = state
        .resolver()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let resolved = render::resolve_images(&doc, &resolver).await;

    let bytes = tokio::task::spawn_blocking(move || {
        let (front, back) = render::render_card(&doc, &resolved);
        pdf::to_pdf(&front, &back)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {e}")))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"card-{id}.pdf\""),
            ),
        ],
        bytes,
    ))
}

/// GET /api/card/:id/export/vcard - vCard 3.0 contact file.
pub async fn export_vcard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let doc = load_design(&state, &id).await?;
    let vcf = vcard::to_vcard(&doc);
    Ok((
        [
            (header::CONTENT_TYPE, "text/vcard".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"card-{id}.vcf\""),
            ),
        ],
        vcf,
    ))
}

/// GET /api/card/:id/export/qr - QR PNG of the design's payload.
///
/// Only the payload modes encode here; in the image modes the document
/// already names its QR pixels and there is nothing to generate.
pub async fn export_qr(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let doc = load_design(&state, &id).await?;
    match qr::resolve_source(&doc) {
        qr::QrSource::Payload(payload) => {
            let bytes = qr::encode_png(&payload, 512)
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
            Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
        }
        qr::QrSource::Image(_) => Err((
            StatusCode::CONFLICT,
            "Design uses an uploaded QR image; nothing to generate".to_string(),
        )),
        qr::QrSource::None => Err((
            StatusCode::NOT_FOUND,
            "Design has no QR content".to_string(),
        )),
    }
}
