//! # Export Pipeline
//!
//! Turns documents into shareable artifacts: raster snapshots (PNG/JPEG),
//! a two-page PDF, a vCard 3.0 contact file, a QR-encoded PNG, and a zip
//! bundle for batch export. The encoding algorithms live in external
//! crates; this module owns the contracts around them, most importantly
//! that every referenced image has finished loading (or timed out) before
//! any snapshot is taken.

pub mod archive;
pub mod pdf;
pub mod qr;
pub mod vcard;

use image::RgbaImage;

use crate::document::{CardDocument, Face};
use crate::error::TarjetaError;
use crate::render::{self, ImageSource};

/// Output encoding for a face snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg { quality: u8 },
}

impl RasterFormat {
    /// Parse from a query/CLI string; unknown values fall back to PNG.
    pub fn parse(s: &str) -> RasterFormat {
        match s {
            "jpeg" | "jpg" => RasterFormat::Jpeg { quality: 90 },
            _ => RasterFormat::Png,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Snapshot configuration.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    pub format: RasterFormat,
    /// Output scale relative to the 300 dpi card canvas.
    pub scale: f64,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            format: RasterFormat::Png,
            scale: 1.0,
        }
    }
}

/// Encode a rendered face per the snapshot options.
pub fn encode_raster(img: &RgbaImage, options: SnapshotOptions) -> Result<Vec<u8>, TarjetaError> {
    let scaled;
    let img = if options.scale != 1.0 && options.scale > 0.0 {
        let w = ((img.width() as f64 * options.scale).round() as u32).max(1);
        let h = ((img.height() as f64 * options.scale).round() as u32).max(1);
        scaled = image::imageops::resize(img, w, h, image::imageops::FilterType::Triangle);
        &scaled
    } else {
        img
    };

    let mut bytes = Vec::new();
    match options.format {
        RasterFormat::Png => {
            img.write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| TarjetaError::Export(format!("PNG encode failed: {e}")))?;
        }
        RasterFormat::Jpeg { quality } => {
            // JPEG has no alpha channel.
            let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let mut cursor = std::io::Cursor::new(&mut bytes);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut cursor,
                quality,
            );
            encoder
                .encode_image(&rgb)
                .map_err(|e| TarjetaError::Export(format!("JPEG encode failed: {e}")))?;
        }
    }
    Ok(bytes)
}

/// Snapshot one face of a document: resolve every referenced image first,
/// then render and encode. Never snapshots mid-load.
pub async fn snapshot_face(
    doc: &CardDocument,
    face: Face,
    source: &dyn ImageSource,
    options: SnapshotOptions,
) -> Result<Vec<u8>, TarjetaError> {
    let resolved = render::resolve_images(doc, source).await;
    let img = render::render_face(doc, face, &resolved);
    encode_raster(&img, options)
}

/// Snapshot both faces with one image-resolution pass.
pub async fn snapshot_card(
    doc: &CardDocument,
    source: &dyn ImageSource,
    options: SnapshotOptions,
) -> Result<(Vec<u8>, Vec<u8>), TarjetaError> {
    let resolved = render::resolve_images(doc, source).await;
    let front = encode_raster(&render::render_face(doc, Face::Front, &resolved), options)?;
    let back = encode_raster(&render::render_face(doc, Face::Back, &resolved), options)?;
    Ok((front, back))
}
