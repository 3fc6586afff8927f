//! # Error Types
//!
//! This module defines error types used throughout the tarjeta library.

use thiserror::Error;

/// Main error type for tarjeta operations
#[derive(Debug, Error)]
pub enum TarjetaError {
    /// Malformed or unloadable card document
    #[error("Document error: {0}")]
    Document(String),

    /// Image download/decode/processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Headless rendering error
    #[error("Render error: {0}")]
    Render(String),

    /// Export pipeline error (raster/PDF/vCard/QR/zip)
    #[error("Export error: {0}")]
    Export(String),

    /// Local or remote persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
