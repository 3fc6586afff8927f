//! # Headless Reconstruction Renderer
//!
//! Rebuilds the visual card purely from a [`CardDocument`]: no live
//! editing surface, no form controls, no prior in-memory state. This is
//! the renderer behind the viewer page, the export pipeline, and the
//! share preview: anywhere only the document exists.
//!
//! Rendering is two-phase, like any snapshot path must be:
//!
//! 1. [`resolve_images`] fetches every externally-sourced image a face
//!    references (bounded timeout per image) into a [`ResolvedImages`]
//!    map. A snapshot taken mid-load silently bakes in missing images, so
//!    nothing renders until this completes.
//! 2. [`render_face`] paints synchronously from the document, the layout
//!    resolver, and the resolved map.
//!
//! A single placeable's failure (malformed color, undecodable image)
//! degrades that node to a default or omits it; it never aborts the card.

pub mod background;
pub mod text;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use tokio::sync::RwLock;

use crate::document::{CardDocument, Face};
use crate::error::TarjetaError;
use crate::export::qr::{self, QrSource};
use crate::layout::{self, CARD_HEIGHT, CARD_WIDTH, PlaceableVisual, VisualNode};

/// Upper bound on waiting for any single image before a render proceeds
/// without it.
pub const IMAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(8);

// ============================================================================
// IMAGE SOURCES
// ============================================================================

/// Capability to turn a URI from a document into decoded pixels.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<DynamicImage, TarjetaError>;
}

/// Remote images over HTTP(S), with an in-memory decode cache shared
/// across renders.
pub struct HttpImageSource {
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, TarjetaError> {
        let client = reqwest::Client::builder()
            .user_agent("tarjeta/0.1")
            .build()
            .map_err(|e| TarjetaError::Image(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn with_cache(cache: Arc<RwLock<HashMap<String, DynamicImage>>>) -> Result<Self, TarjetaError> {
        let mut source = Self::new()?;
        source.cache = cache;
        Ok(source)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, uri: &str) -> Result<DynamicImage, TarjetaError> {
        {
            let cache = self.cache.read().await;
            if let Some(img) = cache.get(uri) {
                return Ok(img.clone());
            }
        }

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| TarjetaError::Image(format!("Failed to download {uri}: {e}")))?;
        if !response.status().is_success() {
            return Err(TarjetaError::Image(format!(
                "Failed to download {uri}: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TarjetaError::Image(format!("Failed to read image data: {e}")))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| TarjetaError::Image(format!("Failed to decode image: {e}")))?;

        self.cache.write().await.insert(uri.to_string(), img.clone());
        Ok(img)
    }
}

/// Local images: upload references like `/uploads/abc.png` resolved under
/// a root directory, plus plain filesystem paths for CLI use.
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_path(&self, uri: &str) -> PathBuf {
        match uri.strip_prefix('/') {
            Some(relative) => self.root.join(relative),
            None => PathBuf::from(uri),
        }
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn fetch(&self, uri: &str) -> Result<DynamicImage, TarjetaError> {
        let path = self.resolve_path(uri);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| TarjetaError::Image(format!("Failed to read {}: {e}", path.display())))?;
        image::load_from_memory(&bytes)
            .map_err(|e| TarjetaError::Image(format!("Failed to decode {}: {e}", path.display())))
    }
}

/// Dispatching source: HTTP(S) URIs go remote, everything else local. A
/// shared decode cache fronts both (uploads get warmed into it on arrival).
pub struct ImageResolver {
    http: HttpImageSource,
    fs: FsImageSource,
    cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
}

impl ImageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TarjetaError> {
        Self::with_cache(root, Arc::new(RwLock::new(HashMap::new())))
    }

    pub fn with_cache(
        root: impl Into<PathBuf>,
        cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
    ) -> Result<Self, TarjetaError> {
        Ok(Self {
            http: HttpImageSource::with_cache(cache.clone())?,
            fs: FsImageSource::new(root),
            cache,
        })
    }
}

#[async_trait]
impl ImageSource for ImageResolver {
    async fn fetch(&self, uri: &str) -> Result<DynamicImage, TarjetaError> {
        if let Some(img) = self.cache.read().await.get(uri) {
            return Ok(img.clone());
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            // The HTTP source shares the cache and populates it itself.
            self.http.fetch(uri).await
        } else {
            let img = self.fs.fetch(uri).await?;
            self.cache.write().await.insert(uri.to_string(), img.clone());
            Ok(img)
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Decoded images keyed by the URI the document stores.
#[derive(Debug, Default)]
pub struct ResolvedImages {
    images: HashMap<String, DynamicImage>,
}

impl ResolvedImages {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, img: DynamicImage) {
        self.images.insert(uri.into(), img);
    }

    pub fn get(&self, uri: &str) -> Option<&DynamicImage> {
        self.images.get(uri)
    }
}

/// Every image URI a document can reference, across both faces.
pub fn collect_image_uris(doc: &CardDocument) -> Vec<String> {
    let mut uris = Vec::new();
    let mut push = |uri: &Option<String>| {
        if let Some(u) = uri
            && !u.is_empty()
            && !uris.contains(u)
        {
            uris.push(u.clone());
        }
    };
    push(&doc.images.front_background);
    push(&doc.images.back_background);
    push(&doc.images.photo);

    let logo = doc.text(crate::document::keys::LOGO_URL).trim().to_string();
    if !logo.is_empty() && !uris.contains(&logo) {
        uris.push(logo);
    }
    if let QrSource::Image(uri) = qr::resolve_source(doc)
        && !uris.contains(&uri)
    {
        uris.push(uri);
    }
    uris
}

/// Fetch every referenced image before any snapshot is taken.
///
/// Each image gets a bounded timeout; a failed or slow image is logged and
/// skipped, and its node degrades at render time rather than blocking the
/// card forever.
pub async fn resolve_images(doc: &CardDocument, source: &dyn ImageSource) -> ResolvedImages {
    let mut resolved = ResolvedImages::empty();
    for uri in collect_image_uris(doc) {
        match tokio::time::timeout(IMAGE_LOAD_TIMEOUT, source.fetch(&uri)).await {
            Ok(Ok(img)) => resolved.insert(uri, img),
            Ok(Err(e)) => println!("[render] image skipped: {e}"),
            Err(_) => println!("[render] image timed out: {uri}"),
        }
    }
    resolved
}

// ============================================================================
// FACE RENDERING
// ============================================================================

const DARK_TEXT_FALLBACK: [u8; 3] = [26, 26, 46];
const CONTACT_FALLBACK: [u8; 3] = [230, 240, 247];
const BUTTON_PAD_X: f64 = 14.0;
const BUTTON_PAD_Y: f64 = 8.0;

/// Render one face of the card to pixels.
pub fn render_face(doc: &CardDocument, face: Face, resolved: &ResolvedImages) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, Rgba([255, 255, 255, 255]));

    let background_uri = match face {
        Face::Front => doc.images.front_background.as_deref(),
        Face::Back => doc.images.back_background.as_deref(),
    };
    let background_img = background_uri.and_then(|uri| resolved.get(uri));
    background::paint(&mut canvas, doc, face, background_img);

    for visual in layout::resolve_layout(doc, face) {
        draw_visual(&mut canvas, &visual, resolved);
    }

    canvas
}

/// Render both faces (viewer / export entry point).
pub fn render_card(doc: &CardDocument, resolved: &ResolvedImages) -> (RgbaImage, RgbaImage) {
    (
        render_face(doc, Face::Front, resolved),
        render_face(doc, Face::Back, resolved),
    )
}

fn draw_visual(canvas: &mut RgbaImage, visual: &PlaceableVisual, resolved: &ResolvedImages) {
    let x = visual.origin.x;
    let y = visual.origin.y;
    match &visual.node {
        VisualNode::Logo { uri, size } | VisualNode::Photo { uri, size } => {
            // Unresolved image: the node is omitted, never a broken box.
            if let Some(img) = resolved.get(uri) {
                blit_scaled(canvas, img, x, y, *size);
            }
        }
        VisualNode::Name { text, style } => {
            let color = background::parse_hex_color(&style.color, DARK_TEXT_FALLBACK);
            text::draw_text(canvas, x, y, text, style.size, color);
        }
        VisualNode::Tagline { text, style } => {
            let color = background::parse_hex_color(&style.color, DARK_TEXT_FALLBACK);
            text::draw_text(canvas, x, y, text, style.size, color);
        }
        VisualNode::Qr { source, size } => match source {
            QrSource::Payload(payload) => match qr::encode_rgba(payload, *size as u32) {
                Ok(img) => blit_scaled(canvas, &DynamicImage::ImageRgba8(img), x, y, *size),
                Err(e) => println!("[render] QR skipped: {e}"),
            },
            QrSource::Image(uri) => {
                if let Some(img) = resolved.get(uri) {
                    blit_scaled(canvas, img, x, y, *size);
                }
            }
            QrSource::None => {}
        },
        VisualNode::Phone { value, style, .. } => draw_contact(canvas, x, y, value, style),
        VisualNode::Social { value, style, .. } => draw_contact(canvas, x, y, value, style),
        VisualNode::StaticChannel { value, style, .. } => draw_contact(canvas, x, y, value, style),
    }
}

/// Scale an image into a square box of `size` (aspect preserved) and
/// composite it at the node's origin.
fn blit_scaled(canvas: &mut RgbaImage, img: &DynamicImage, x: f64, y: f64, size: f64) {
    let size = size.max(1.0) as u32;
    let scaled = img.resize(size, size, imageops::FilterType::Triangle);
    imageops::overlay(canvas, &scaled.to_rgba8(), x.round() as i64, y.round() as i64);
}

/// One contact row: filled button or bare text, per the resolved style.
fn draw_contact(
    canvas: &mut RgbaImage,
    x: f64,
    y: f64,
    value: &str,
    style: &crate::layout::ContactStyle,
) {
    let color = background::parse_hex_color(&style.color, CONTACT_FALLBACK);
    if style.button {
        let width = text::text_width(value, style.size) + BUTTON_PAD_X * 2.0;
        let height = style.size + BUTTON_PAD_Y * 2.0;
        fill_rect(canvas, x, y, width, height, color);
        // Contrasting label on the filled background.
        let label = if background::luminance(color) > 0.55 {
            Rgba([26, 26, 46, 255])
        } else {
            Rgba([255, 255, 255, 255])
        };
        text::draw_text(
            canvas,
            x + BUTTON_PAD_X,
            y + BUTTON_PAD_Y,
            value,
            style.size,
            label,
        );
    } else {
        text::draw_text(canvas, x, y, value, style.size, color);
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: f64, y: f64, width: f64, height: f64, color: Rgba<u8>) {
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + height).round().max(0.0) as u32).min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Offset, PhoneEntry, PlaceableKey, StableId, keys, qr_mode};

    #[test]
    fn test_render_face_has_card_dimensions() {
        let doc = CardDocument::starter();
        let img = render_face(&doc, Face::Front, &ResolvedImages::empty());
        assert_eq!(img.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
    }

    #[test]
    fn test_empty_logo_renders_nothing_extra() {
        // No logo URI, no photo, no QR content: both faces render without
        // touching the resolved map at all.
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "");
        doc.set_text(keys::TAGLINE, "");
        doc.set_text(keys::LOGO_URL, "");
        let front = render_face(&doc, Face::Front, &ResolvedImages::empty());
        let back = render_face(&doc, Face::Back, &ResolvedImages::empty());
        assert_eq!(front.dimensions(), back.dimensions());
    }

    #[test]
    fn test_missing_image_degrades_not_panics() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::LOGO_URL, "/uploads/not-fetched.png");
        doc.images.photo = Some("/uploads/also-missing.png".into());
        // Resolved map is empty: nodes are skipped.
        let _ = render_face(&doc, Face::Front, &ResolvedImages::empty());
    }

    #[test]
    fn test_qr_drawn_on_its_face_only() {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "Ada");
        doc.set_text(keys::QR_MODE, qr_mode::AUTO_VCARD);
        doc.placements.insert(PlaceableKey::Qr, Face::Back);
        doc.set_text(keys::BACK_COLOR_TOP, "#000000");
        doc.set_text(keys::BACK_COLOR_BOTTOM, "#000000");

        let back = render_face(&doc, Face::Back, &ResolvedImages::empty());
        // QR quiet zone paints white pixels onto the black back face.
        assert!(back.pixels().any(|p| p[0] > 240 && p[1] > 240));
    }

    #[test]
    fn test_collect_image_uris_dedups() {
        let mut doc = CardDocument::starter();
        doc.images.front_background = Some("/uploads/bg.png".into());
        doc.images.back_background = Some("/uploads/bg.png".into());
        doc.images.photo = Some("/uploads/me.png".into());
        let uris = collect_image_uris(&doc);
        assert_eq!(uris.len(), 2);
    }

    #[test]
    fn test_phone_row_paints_button() {
        let mut doc = CardDocument::starter();
        doc.set_flag(keys::CONTACT_BUTTONS, true);
        doc.set_text(keys::CONTACT_COLOR, "#112233");
        doc.set_text(keys::FRONT_COLOR_TOP, "#ffffff");
        doc.set_text(keys::FRONT_COLOR_BOTTOM, "#ffffff");
        doc.phones.push(PhoneEntry {
            id: StableId::test("p1"),
            value: "+1 555 0100".into(),
            placement: Face::Front,
            position: Offset::ZERO,
        });

        let img = render_face(&doc, Face::Front, &ResolvedImages::empty());
        let button = Rgba([17u8, 34, 51, 255]);
        assert!(img.pixels().any(|p| *p == button));
    }

    #[tokio::test]
    async fn test_resolve_images_skips_failures() {
        struct FailingSource;
        #[async_trait]
        impl ImageSource for FailingSource {
            async fn fetch(&self, uri: &str) -> Result<DynamicImage, TarjetaError> {
                Err(TarjetaError::Image(format!("no such image: {uri}")))
            }
        }

        let mut doc = CardDocument::starter();
        doc.images.photo = Some("/uploads/gone.png".into());
        let resolved = resolve_images(&doc, &FailingSource).await;
        assert!(resolved.get("/uploads/gone.png").is_none());
    }
}
