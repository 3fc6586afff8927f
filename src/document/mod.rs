//! # Card Document Model
//!
//! A single serializable type hierarchy describing one two-sided business
//! card. `CardDocument` is the unit that gets snapshotted into history,
//! persisted locally and remotely, and handed to the headless renderer.
//! It must be fully self-contained: a viewer that never saw the editing
//! form reconstructs the identical card from this type alone.
//!
//! ```ignore
//! use tarjeta::document::*;
//!
//! // Rust construction
//! let mut doc = CardDocument::starter();
//! doc.set_text(keys::NAME, "Ada Lovelace");
//!
//! // JSON round-trip (the round-trip law: every field survives)
//! let json = serde_json::to_string(&doc).unwrap();
//! let back: CardDocument = serde_json::from_str(&json).unwrap();
//! assert_eq!(doc, back);
//! ```

pub mod identity;
pub mod placement;

pub use identity::{IdAllocator, StableId};
pub use placement::PlacementStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side of the card a placeable renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    #[default]
    Front,
    Back,
}

impl Face {
    /// Parse from a query/CLI string. Anything that isn't "back" is front.
    pub fn parse(s: &str) -> Face {
        match s {
            "back" => Face::Back,
            _ => Face::Front,
        }
    }
}

/// Pixel delta from a placeable's default layout slot. Additive and
/// unconstrained: clipping is a presentation concern, not a data error.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// A scalar form-field value: text, number, or toggle.
///
/// Untagged so documents read naturally: `"name": "Ada"`, `"qr_size": 180`,
/// `"contact_buttons": true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Text content, or `""` for non-text scalars.
    pub fn as_text(&self) -> &str {
        match self {
            Scalar::Text(s) => s,
            _ => "",
        }
    }

    /// Numeric content, or `None` for non-numeric scalars.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Scalar::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Flag(b)
    }
}

/// The closed set of fixed singleton placeables.
///
/// This set never grows or shrinks at runtime; `positions` and `placements`
/// are keyed by it. Dynamic list entries (phones, social links) carry their
/// own placement instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceableKey {
    Logo,
    Photo,
    Name,
    Tagline,
    Qr,
}

impl PlaceableKey {
    /// All five singleton placeables, in canonical order.
    pub const ALL: [PlaceableKey; 5] = [
        PlaceableKey::Logo,
        PlaceableKey::Photo,
        PlaceableKey::Name,
        PlaceableKey::Tagline,
        PlaceableKey::Qr,
    ];
}

/// Fixed, non-removable contact channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaticPlatform {
    Email,
    Website,
    Whatsapp,
    Facebook,
    Linkedin,
}

impl StaticPlatform {
    pub const ALL: [StaticPlatform; 5] = [
        StaticPlatform::Email,
        StaticPlatform::Website,
        StaticPlatform::Whatsapp,
        StaticPlatform::Facebook,
        StaticPlatform::Linkedin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StaticPlatform::Email => "Email",
            StaticPlatform::Website => "Website",
            StaticPlatform::Whatsapp => "WhatsApp",
            StaticPlatform::Facebook => "Facebook",
            StaticPlatform::Linkedin => "LinkedIn",
        }
    }
}

/// Per-entry style override for a social link.
///
/// Presence of the struct *is* the override: an override stored with the
/// same color as the section-wide default is still an override. "No
/// override" is only the absent field, never a sentinel comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleOverride {
    pub color: String,
    pub size: f64,
}

/// One user-added phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneEntry {
    pub id: StableId,
    pub value: String,
    #[serde(default)]
    pub placement: Face,
    #[serde(default)]
    pub position: Offset,
}

/// One user-added social link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialEntry {
    pub id: StableId,
    pub platform: String,
    pub value: String,
    #[serde(default)]
    pub placement: Face,
    #[serde(default)]
    pub position: Offset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_override: Option<StyleOverride>,
}

/// Value + placement for one fixed contact channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticSocialEntry {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub placement: Face,
    #[serde(default)]
    pub position: Offset,
}

/// Image references cached from prior uploads (or remote URLs).
///
/// Absent means "none chosen"; the renderer omits the corresponding node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_upload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Stable string keys for the flat scalar field map.
///
/// Any field added here must be wired through both `StateManager::read` and
/// `StateManager::write` together, or the round-trip law breaks.
pub mod keys {
    pub const NAME: &str = "name";
    pub const TAGLINE: &str = "tagline";
    pub const NAME_COLOR: &str = "name_color";
    pub const NAME_SIZE: &str = "name_size";
    pub const TAGLINE_COLOR: &str = "tagline_color";
    pub const TAGLINE_SIZE: &str = "tagline_size";

    pub const FRONT_COLOR_TOP: &str = "front_color_top";
    pub const FRONT_COLOR_BOTTOM: &str = "front_color_bottom";
    pub const BACK_COLOR_TOP: &str = "back_color_top";
    pub const BACK_COLOR_BOTTOM: &str = "back_color_bottom";
    pub const FRONT_BG_OPACITY: &str = "front_bg_opacity";
    pub const BACK_BG_OPACITY: &str = "back_bg_opacity";

    pub const LOGO_URL: &str = "logo_url";
    pub const LOGO_SIZE: &str = "logo_size";
    pub const PHOTO_SIZE: &str = "photo_size";

    /// Global toggle: render contact rows as filled buttons (true) or bare text.
    pub const CONTACT_BUTTONS: &str = "contact_buttons";
    pub const CONTACT_COLOR: &str = "contact_color";
    pub const CONTACT_SIZE: &str = "contact_size";

    pub const QR_MODE: &str = "qr_mode";
    pub const QR_SIZE: &str = "qr_size";
    /// Card-viewer URL encoded by the `auto-link` QR mode. Set on save.
    pub const VIEWER_URL: &str = "viewer_url";

    pub const THEME: &str = "theme";
}

/// QR payload source modes stored under [`keys::QR_MODE`].
pub mod qr_mode {
    /// Regenerate a vCard text blob from the document at render time.
    pub const AUTO_VCARD: &str = "auto-vcard";
    /// Regenerate the card-viewer URL at render time.
    pub const AUTO_LINK: &str = "auto-link";
    /// The document already names an image (custom URL).
    pub const URL: &str = "url";
    /// The document already names an image (prior upload).
    pub const UPLOAD: &str = "upload";
}

/// The complete, serializable description of one card design.
///
/// History stores immutable deep copies of this type; no component mutates
/// a document in place after it has been pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDocument {
    /// Flat key→value settings. No ordering significance.
    #[serde(default)]
    pub fields: BTreeMap<String, Scalar>,
    /// User-added phone numbers, in on-screen order.
    #[serde(default)]
    pub phones: Vec<PhoneEntry>,
    /// User-added social links, in on-screen order.
    #[serde(default)]
    pub social_links: Vec<SocialEntry>,
    /// Fixed contact channels (email, website, whatsapp, facebook, linkedin).
    #[serde(default)]
    pub static_social: BTreeMap<StaticPlatform, StaticSocialEntry>,
    /// Uploaded/remote image references.
    #[serde(default)]
    pub images: ImageRefs,
    /// Fine-position offsets for the closed singleton set.
    #[serde(default)]
    pub positions: BTreeMap<PlaceableKey, Offset>,
    /// Face assignment for the closed singleton set.
    #[serde(default)]
    pub placements: BTreeMap<PlaceableKey, Face>,
}

impl Default for CardDocument {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
            phones: Vec::new(),
            social_links: Vec::new(),
            static_social: StaticPlatform::ALL
                .iter()
                .map(|p| (*p, StaticSocialEntry::default()))
                .collect(),
            images: ImageRefs::default(),
            positions: BTreeMap::new(),
            placements: BTreeMap::new(),
        }
    }
}

impl CardDocument {
    /// First-run starter document with example content, so a fresh card is
    /// immediately useful rather than blank.
    pub fn starter() -> Self {
        let mut doc = Self::default();
        doc.set_text(keys::NAME, "Your Name");
        doc.set_text(keys::TAGLINE, "What you do");
        doc.set_text(keys::NAME_COLOR, "#1a1a2e");
        doc.set_number(keys::NAME_SIZE, 56.0);
        doc.set_text(keys::TAGLINE_COLOR, "#4a4a68");
        doc.set_number(keys::TAGLINE_SIZE, 28.0);
        doc.set_text(keys::FRONT_COLOR_TOP, "#ffffff");
        doc.set_text(keys::FRONT_COLOR_BOTTOM, "#e6f0f7");
        doc.set_text(keys::BACK_COLOR_TOP, "#1a1a2e");
        doc.set_text(keys::BACK_COLOR_BOTTOM, "#16213e");
        doc.set_number(keys::FRONT_BG_OPACITY, 1.0);
        doc.set_number(keys::BACK_BG_OPACITY, 1.0);
        doc.set_text(keys::LOGO_URL, "");
        doc.set_number(keys::LOGO_SIZE, 140.0);
        doc.set_number(keys::PHOTO_SIZE, 180.0);
        doc.set_flag(keys::CONTACT_BUTTONS, true);
        doc.set_text(keys::CONTACT_COLOR, "#e6f0f7");
        doc.set_number(keys::CONTACT_SIZE, 22.0);
        doc.set_text(keys::QR_MODE, qr_mode::AUTO_VCARD);
        doc.set_number(keys::QR_SIZE, 180.0);
        doc.set_text(keys::VIEWER_URL, "");
        doc.set_text(keys::THEME, "classic");
        for key in PlaceableKey::ALL {
            doc.positions.insert(key, Offset::ZERO);
            doc.placements.insert(key, default_face(key));
        }
        doc
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), Scalar::Text(value.into()));
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.fields.insert(key.to_string(), Scalar::Number(value));
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.fields.insert(key.to_string(), Scalar::Flag(value));
    }

    /// Text value of a field, or `""` when absent or non-text.
    pub fn text(&self, key: &str) -> &str {
        self.fields.get(key).map(Scalar::as_text).unwrap_or("")
    }

    /// Numeric value of a field, or the given default.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.fields
            .get(key)
            .and_then(Scalar::as_number)
            .unwrap_or(default)
    }

    /// Boolean value of a field, or the given default.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.fields
            .get(key)
            .and_then(Scalar::as_flag)
            .unwrap_or(default)
    }

    /// Face a singleton placeable renders on (configured default when unset).
    pub fn placement(&self, key: PlaceableKey) -> Face {
        self.placements
            .get(&key)
            .copied()
            .unwrap_or_else(|| default_face(key))
    }

    /// Stored offset for a singleton placeable. Absence means the default
    /// layout slot, not hidden.
    pub fn position(&self, key: PlaceableKey) -> Offset {
        self.positions.get(&key).copied().unwrap_or(Offset::ZERO)
    }

    pub fn static_social_value(&self, platform: StaticPlatform) -> &str {
        self.static_social
            .get(&platform)
            .map(|e| e.value.as_str())
            .unwrap_or("")
    }
}

/// Configured default face for each singleton placeable.
pub fn default_face(key: PlaceableKey) -> Face {
    match key {
        PlaceableKey::Logo => Face::Front,
        PlaceableKey::Photo => Face::Front,
        PlaceableKey::Name => Face::Front,
        PlaceableKey::Tagline => Face::Front,
        PlaceableKey::Qr => Face::Back,
    }
}
