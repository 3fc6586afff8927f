//! Bitmap text rasterization for the headless renderer.
//!
//! Draws strings with the Spleen 12x24 PSF2 font, scaled nearest-neighbor
//! to the requested pixel height. Bitmap glyphs keep the renderer free of
//! font-file assets and render identically everywhere.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};

/// Native glyph cell of the source font.
pub const GLYPH_WIDTH: usize = 12;
pub const GLYPH_HEIGHT: usize = 24;

/// Pixel width of `text` drawn at `size` (the advance, no kerning).
pub fn text_width(text: &str, size: f64) -> f64 {
    let scale = size / GLYPH_HEIGHT as f64;
    text.chars().count() as f64 * GLYPH_WIDTH as f64 * scale
}

/// Fetch one glyph as a 12x24 bitmap; unknown characters come back empty.
fn glyph_bitmap(ch: char) -> [bool; GLYPH_WIDTH * GLYPH_HEIGHT] {
    let mut bitmap = [false; GLYPH_WIDTH * GLYPH_HEIGHT];
    let Ok(mut font) = PSF2Font::new(FONT_12X24) else {
        return bitmap;
    };
    let utf8 = ch.to_string();
    if let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) {
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if on && row_y < GLYPH_HEIGHT && col_x < GLYPH_WIDTH {
                    bitmap[row_y * GLYPH_WIDTH + col_x] = true;
                }
            }
        }
    }
    bitmap
}

/// Draw `text` onto the canvas with its top-left at `(x, y)`, scaled to
/// `size` pixels tall. Pixels outside the canvas are clipped, not an error.
pub fn draw_text(canvas: &mut RgbaImage, x: f64, y: f64, text: &str, size: f64, color: Rgba<u8>) {
    let scale = size / GLYPH_HEIGHT as f64;
    let cell_w = (GLYPH_WIDTH as f64 * scale).round() as i64;
    let cell_h = (GLYPH_HEIGHT as f64 * scale).round() as i64;
    if cell_w <= 0 || cell_h <= 0 {
        return;
    }

    let mut pen_x = x.round() as i64;
    let pen_y = y.round() as i64;

    for ch in text.chars() {
        let bitmap = glyph_bitmap(ch);
        for py in 0..cell_h {
            // Nearest-neighbor sample back into the 12x24 source cell.
            let src_y = (py * GLYPH_HEIGHT as i64 / cell_h).clamp(0, GLYPH_HEIGHT as i64 - 1);
            for px in 0..cell_w {
                let src_x = (px * GLYPH_WIDTH as i64 / cell_w).clamp(0, GLYPH_WIDTH as i64 - 1);
                if !bitmap[src_y as usize * GLYPH_WIDTH + src_x as usize] {
                    continue;
                }
                let cx = pen_x + px;
                let cy = pen_y + py;
                if cx >= 0 && cy >= 0 && (cx as u32) < canvas.width() && (cy as u32) < canvas.height()
                {
                    canvas.put_pixel(cx as u32, cy as u32, color);
                }
            }
        }
        pen_x += cell_w;
    }
}
