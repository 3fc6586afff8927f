//! Two-page business-card PDF assembly.
//!
//! Pure page assembly: one face raster per page at the fixed card size.
//! Pixel data goes in as a raw RGB image XObject, so no image re-encoding
//! happens here.

use image::RgbaImage;
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};

/// Standard US business card: 3.5in x 2in.
pub const PAGE_WIDTH_MM: f32 = 88.9;
pub const PAGE_HEIGHT_MM: f32 = 50.8;

/// The DPI that maps the 1050x600 canvas onto the fixed page size.
const CARD_DPI: f32 = 300.0;

use crate::error::TarjetaError;

fn xobject_from_raster(img: &RgbaImage) -> ImageXObject {
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    ImageXObject {
        width: Px(rgb.width() as usize),
        height: Px(rgb.height() as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    }
}

/// Assemble a two-page PDF (front, back) from rendered face rasters.
pub fn to_pdf(front: &RgbaImage, back: &RgbaImage) -> Result<Vec<u8>, TarjetaError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Business Card",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "front",
    );

    let front_image = Image::from(xobject_from_raster(front));
    front_image.add_to_layer(
        doc.get_page(page1).get_layer(layer1),
        ImageTransform {
            dpi: Some(CARD_DPI),
            ..Default::default()
        },
    );

    let (page2, layer2) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "back");
    let back_image = Image::from(xobject_from_raster(back));
    back_image.add_to_layer(
        doc.get_page(page2).get_layer(layer2),
        ImageTransform {
            dpi: Some(CARD_DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| TarjetaError::Export(format!("PDF assembly failed: {e}")))
}
