//! QR source resolution and encoding.
//!
//! The QR placeable has multiple rendering sources of truth: in the two
//! auto modes the encodable payload is *regenerated* from the document at
//! render time (never stored as pixels), while the `url`/`upload` modes
//! already name an image in the document and nothing is regenerated.

use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};

use crate::document::{CardDocument, keys, qr_mode};
use crate::error::TarjetaError;
use crate::export::vcard;

/// What the QR placeable should show for a given document.
#[derive(Debug, Clone, PartialEq)]
pub enum QrSource {
    /// Encode this payload text at render time.
    Payload(String),
    /// The document already names an image; show it as-is.
    Image(String),
    /// Nothing encodable; omit the QR node.
    None,
}

/// Resolve the QR source for a document, per its stored mode.
///
/// Unknown modes degrade to `None` rather than failing the render.
pub fn resolve_source(doc: &CardDocument) -> QrSource {
    match doc.text(keys::QR_MODE) {
        // Default mode when the field is absent: vCard payload.
        qr_mode::AUTO_VCARD | "" => {
            let has_content = !doc.text(keys::NAME).trim().is_empty()
                || doc.phones.iter().any(|p| !p.value.trim().is_empty());
            if has_content {
                QrSource::Payload(vcard::to_vcard(doc))
            } else {
                QrSource::None
            }
        }
        qr_mode::AUTO_LINK => {
            let url = doc.text(keys::VIEWER_URL).trim();
            if url.is_empty() {
                QrSource::None
            } else {
                QrSource::Payload(url.to_string())
            }
        }
        qr_mode::URL | qr_mode::UPLOAD => match &doc.images.qr_upload {
            Some(uri) if !uri.is_empty() => QrSource::Image(uri.clone()),
            _ => QrSource::None,
        },
        _ => QrSource::None,
    }
}

/// Encode a payload into a square RGBA image of roughly `size_px`.
///
/// Modules are drawn cell-by-cell with a 4-module quiet zone; the cell
/// size is floored so modules stay crisp at any target size.
pub fn encode_rgba(payload: &str, size_px: u32) -> Result<RgbaImage, TarjetaError> {
    let code = QrCode::with_error_correction_level(payload, EcLevel::M)
        .map_err(|e| TarjetaError::Export(format!("QR encoding failed: {e}")))?;

    let quiet = 4usize;
    let modules = code.width() + quiet * 2;
    let cell = ((size_px as usize) / modules).max(1);
    let pixel_size = (modules * cell) as u32;

    let dark = Rgba([17u8, 17, 17, 255]);
    let light = Rgba([255u8, 255, 255, 255]);
    let mut img = RgbaImage::from_pixel(pixel_size, pixel_size, light);

    for qy in 0..code.width() {
        for qx in 0..code.width() {
            if code[(qx, qy)] != qrcode::Color::Dark {
                continue;
            }
            let x0 = (quiet + qx) * cell;
            let y0 = (quiet + qy) * cell;
            for cy in 0..cell {
                for cx in 0..cell {
                    img.put_pixel((x0 + cx) as u32, (y0 + cy) as u32, dark);
                }
            }
        }
    }

    Ok(img)
}

/// Encode a payload straight to PNG bytes (export endpoint / CLI).
pub fn encode_png(payload: &str, size_px: u32) -> Result<Vec<u8>, TarjetaError> {
    let img = encode_rgba(payload, size_px)?;
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| TarjetaError::Export(format!("QR PNG encode failed: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auto_vcard_payload_matches_export() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "Ada Lovelace");
        doc.set_text(keys::QR_MODE, qr_mode::AUTO_VCARD);

        match resolve_source(&doc) {
            QrSource::Payload(payload) => assert_eq!(payload, vcard::to_vcard(&doc)),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[test]
    fn test_auto_link_uses_viewer_url() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::QR_MODE, qr_mode::AUTO_LINK);
        doc.set_text(keys::VIEWER_URL, "https://cards.example/view/abc");
        assert_eq!(
            resolve_source(&doc),
            QrSource::Payload("https://cards.example/view/abc".into())
        );
    }

    #[test]
    fn test_image_modes_use_stored_reference() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::QR_MODE, qr_mode::UPLOAD);
        doc.images.qr_upload = Some("/uploads/qr.png".into());
        assert_eq!(resolve_source(&doc), QrSource::Image("/uploads/qr.png".into()));
    }

    #[test]
    fn test_empty_card_has_no_qr() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "");
        doc.set_text(keys::QR_MODE, qr_mode::AUTO_VCARD);
        assert_eq!(resolve_source(&doc), QrSource::None);
    }

    #[test]
    fn test_unknown_mode_degrades_to_none() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::QR_MODE, "hologram");
        assert_eq!(resolve_source(&doc), QrSource::None);
    }

    #[test]
    fn test_encode_produces_square_image() {
        let img = encode_rgba("https://example.com", 180).unwrap();
        assert_eq!(img.width(), img.height());
        assert!(img.width() > 0);
        // Contains both dark and light pixels.
        assert!(img.pixels().any(|p| p[0] < 128));
        assert!(img.pixels().any(|p| p[0] > 128));
    }
}
