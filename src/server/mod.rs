//! # HTTP Server for Saving, Viewing, and Exporting Cards
//!
//! Provides the remote persistence and viewer API around the card core.
//!
//! ## Usage
//!
//! ```bash
//! tarjeta serve --listen 0.0.0.0:8080 --data-dir ./data
//! ```
//!
//! A design saved through `/api/save-design` can then be reconstructed by
//! any client from `/api/get-design/{id}`, or rendered server-side through
//! `/api/card/{id}/preview`, the viewer path that never sees the editor.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::TarjetaError;
use crate::store::uploads_dir;

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use tarjeta::server::{ServerConfig, serve};
///
/// # async fn example() -> Result<(), tarjeta::error::TarjetaError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     data_dir: "./data".into(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), TarjetaError> {
    let uploads = uploads_dir(&config.data_dir);
    tokio::fs::create_dir_all(&uploads)
        .await
        .map_err(|e| TarjetaError::Server(format!("Failed to create {}: {e}", uploads.display())))?;

    let app_state = Arc::new(AppState::new(config.clone()));

    let app = Router::new()
        // Design API
        .route("/api/save-design", post(handlers::designs::save))
        .route("/api/get-design/:id", get(handlers::designs::get))
        // Upload API (20MB limit)
        .route(
            "/api/upload-image",
            post(handlers::upload::upload).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        // Viewer + export API
        .route("/api/card/:id/preview", get(handlers::preview::preview))
        .route("/api/card/:id/export/pdf", get(handlers::export::export_pdf))
        .route(
            "/api/card/:id/export/vcard",
            get(handlers::export::export_vcard),
        )
        .route("/api/card/:id/export/qr", get(handlers::export::export_qr))
        // Uploaded images served back to documents that reference them
        .nest_service("/uploads", ServeDir::new(&uploads))
        .with_state(app_state);

    println!("Tarjeta HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);
    println!("Data directory: {}", config.data_dir.display());
    println!();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            TarjetaError::Server(format!("Failed to bind to {}: {e}", config.listen_addr))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| TarjetaError::Server(format!("Server error: {e}")))?;

    Ok(())
}
