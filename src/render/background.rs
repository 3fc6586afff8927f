//! Face background painting: two-color vertical gradient over an optional
//! background image with independent opacity.
//!
//! Layer order is fixed for every consumer of the document: the image sits
//! beneath the color layer, and the face's opacity field controls how much
//! of the gradient covers it.

use image::{DynamicImage, Rgba, RgbaImage, imageops};

use crate::document::{CardDocument, Face, keys};

/// Lenient `#rrggbb` parser. Malformed colors degrade to `fallback`
/// instead of aborting the card.
pub fn parse_hex_color(value: &str, fallback: [u8; 3]) -> Rgba<u8> {
    let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
    if hex.len() == 6
        && let Ok(bits) = u32::from_str_radix(hex, 16)
    {
        return Rgba([(bits >> 16) as u8, (bits >> 8) as u8, bits as u8, 255]);
    }
    Rgba([fallback[0], fallback[1], fallback[2], 255])
}

/// Perceived luminance, for picking contrasting text on buttons.
pub fn luminance(color: Rgba<u8>) -> f64 {
    (0.299 * color[0] as f64 + 0.587 * color[1] as f64 + 0.114 * color[2] as f64) / 255.0
}

fn face_colors(doc: &CardDocument, face: Face) -> (Rgba<u8>, Rgba<u8>, f64) {
    let (top_key, bottom_key, opacity_key, fallback) = match face {
        Face::Front => (
            keys::FRONT_COLOR_TOP,
            keys::FRONT_COLOR_BOTTOM,
            keys::FRONT_BG_OPACITY,
            [255u8, 255, 255],
        ),
        Face::Back => (
            keys::BACK_COLOR_TOP,
            keys::BACK_COLOR_BOTTOM,
            keys::BACK_BG_OPACITY,
            [26u8, 26, 46],
        ),
    };
    let top = parse_hex_color(doc.text(top_key), fallback);
    let bottom = parse_hex_color(doc.text(bottom_key), fallback);
    let opacity = doc.number(opacity_key, 1.0).clamp(0.0, 1.0);
    (top, bottom, opacity)
}

/// Paint a face's full background onto a fresh canvas.
pub fn paint(
    canvas: &mut RgbaImage,
    doc: &CardDocument,
    face: Face,
    background_image: Option<&DynamicImage>,
) {
    let (top, bottom, opacity) = face_colors(doc, face);
    let (width, height) = canvas.dimensions();

    // Image layer first, scaled to cover the face.
    if let Some(img) = background_image {
        let scaled = img.resize_to_fill(width, height, imageops::FilterType::Triangle);
        imageops::overlay(canvas, &scaled.to_rgba8(), 0, 0);
    }

    // Gradient layer on top, attenuated by the face's opacity when an
    // image shows through beneath it.
    let alpha = if background_image.is_some() { opacity } else { 1.0 };
    if alpha <= 0.0 {
        return;
    }
    for y in 0..height {
        let t = y as f64 / (height.saturating_sub(1)).max(1) as f64;
        let row = [
            lerp(top[0], bottom[0], t),
            lerp(top[1], bottom[1], t),
            lerp(top[2], bottom[2], t),
        ];
        for x in 0..width {
            let base = *canvas.get_pixel(x, y);
            let blended = Rgba([
                mix(base[0], row[0], alpha),
                mix(base[1], row[1], alpha),
                mix(base[2], row[2], alpha),
                255,
            ]);
            canvas.put_pixel(x, y, blended);
        }
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

fn mix(under: u8, over: u8, alpha: f64) -> u8 {
    (under as f64 * (1.0 - alpha) + over as f64 * alpha).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#112233", [0, 0, 0]), Rgba([17, 34, 51, 255]));
        assert_eq!(parse_hex_color("112233", [0, 0, 0]), Rgba([17, 34, 51, 255]));
    }

    #[test]
    fn test_malformed_color_degrades_to_fallback() {
        assert_eq!(
            parse_hex_color("teal-ish", [9, 9, 9]),
            Rgba([9, 9, 9, 255])
        );
        assert_eq!(parse_hex_color("#12", [9, 9, 9]), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_gradient_runs_top_to_bottom() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::FRONT_COLOR_TOP, "#000000");
        doc.set_text(keys::FRONT_COLOR_BOTTOM, "#ffffff");

        let mut canvas = RgbaImage::new(10, 100);
        paint(&mut canvas, &doc, Face::Front, None);

        assert!(canvas.get_pixel(5, 0)[0] < 10);
        assert!(canvas.get_pixel(5, 99)[0] > 245);
        let mid = canvas.get_pixel(5, 50)[0];
        assert!((100..=160).contains(&mid));
    }

    #[test]
    fn test_zero_opacity_shows_image_only() {
        let mut doc = CardDocument::starter();
        doc.set_number(keys::FRONT_BG_OPACITY, 0.0);
        doc.set_text(keys::FRONT_COLOR_TOP, "#ffffff");
        doc.set_text(keys::FRONT_COLOR_BOTTOM, "#ffffff");

        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([10, 20, 30, 255]),
        ));
        let mut canvas = RgbaImage::new(8, 8);
        paint(&mut canvas, &doc, Face::Front, Some(&photo));
        assert_eq!(*canvas.get_pixel(4, 4), Rgba([10, 20, 30, 255]));
    }
}
