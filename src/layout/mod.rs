//! # Layout Resolver
//!
//! The one canonical mapping from a card document and a face to the list
//! of positioned visual nodes on that face. Both the interactive editing
//! surface and the headless reconstruction renderer consume this function,
//! which is what keeps two independently-evolving presentations from
//! drifting: there is exactly one place that knows default anchors, offset
//! arithmetic, empty-content omission, and style-override precedence.
//!
//! Positions are `default anchor + stored offset`. Offsets are additive
//! pixel deltas and unconstrained; clipping is the presentation layer's
//! concern.

use crate::document::{
    CardDocument, Face, Offset, PlaceableKey, StableId, StaticPlatform, keys,
};
use crate::export::qr::{self, QrSource};

/// Card canvas dimensions: 3.5in x 2in at 300 dpi.
pub const CARD_WIDTH: u32 = 1050;
pub const CARD_HEIGHT: u32 = 600;

/// Absolute top-left position of a visual node on its face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn shifted(self, offset: Offset) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Resolved text styling for a rendered block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: String,
    pub size: f64,
}

/// Resolved styling for a contact row (phone, social, static channel).
#[derive(Debug, Clone, PartialEq)]
pub struct ContactStyle {
    /// True renders a filled button, false a bare text node.
    pub button: bool,
    pub color: String,
    pub size: f64,
}

/// One positioned visual node.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualNode {
    Logo {
        uri: String,
        size: f64,
    },
    Photo {
        uri: String,
        size: f64,
    },
    Name {
        text: String,
        style: TextStyle,
    },
    Tagline {
        text: String,
        style: TextStyle,
    },
    Qr {
        source: QrSource,
        size: f64,
    },
    Phone {
        id: StableId,
        value: String,
        style: ContactStyle,
    },
    Social {
        id: StableId,
        platform: String,
        value: String,
        style: ContactStyle,
    },
    StaticChannel {
        platform: StaticPlatform,
        value: String,
        style: ContactStyle,
    },
}

/// A visual node plus its resolved on-face position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceableVisual {
    pub origin: Point,
    pub node: VisualNode,
}

/// Default anchor slots for the closed singleton set, per face.
///
/// A fixed layout convention: every consumer of the document must agree on
/// these, since stored offsets are deltas from them.
pub fn singleton_anchor(key: PlaceableKey, face: Face) -> Point {
    match (key, face) {
        (PlaceableKey::Logo, Face::Front) => Point::new(60.0, 56.0),
        (PlaceableKey::Logo, Face::Back) => Point::new(455.0, 80.0),
        (PlaceableKey::Photo, Face::Front) => Point::new(810.0, 56.0),
        (PlaceableKey::Photo, Face::Back) => Point::new(810.0, 330.0),
        (PlaceableKey::Name, Face::Front) => Point::new(60.0, 290.0),
        (PlaceableKey::Name, Face::Back) => Point::new(60.0, 70.0),
        (PlaceableKey::Tagline, Face::Front) => Point::new(60.0, 362.0),
        (PlaceableKey::Tagline, Face::Back) => Point::new(60.0, 140.0),
        (PlaceableKey::Qr, Face::Front) => Point::new(820.0, 370.0),
        (PlaceableKey::Qr, Face::Back) => Point::new(435.0, 230.0),
    }
}

/// Anchor of the first phone row; later rows stack downward.
pub fn phone_anchor(face: Face) -> Point {
    match face {
        Face::Front => Point::new(60.0, 444.0),
        Face::Back => Point::new(60.0, 470.0),
    }
}

/// Anchor of the first social link row.
pub fn social_anchor(face: Face) -> Point {
    match face {
        Face::Front => Point::new(540.0, 444.0),
        Face::Back => Point::new(540.0, 470.0),
    }
}

/// Anchor of the first static contact channel row.
pub fn static_anchor(face: Face) -> Point {
    match face {
        Face::Front => Point::new(60.0, 510.0),
        Face::Back => Point::new(60.0, 210.0),
    }
}

/// Vertical spacing between stacked contact rows.
pub const ROW_STEP: f64 = 44.0;

fn section_contact_style(doc: &CardDocument) -> ContactStyle {
    ContactStyle {
        button: doc.flag(keys::CONTACT_BUTTONS, true),
        color: doc.text(keys::CONTACT_COLOR).to_string(),
        size: doc.number(keys::CONTACT_SIZE, 22.0),
    }
}

/// Resolve every visible node on `face`, in paint order.
///
/// Empty governing content omits the node entirely: a missing logo URL
/// means no logo node, not an empty one.
pub fn resolve_layout(doc: &CardDocument, face: Face) -> Vec<PlaceableVisual> {
    let mut visuals = Vec::new();
    let contact_style = section_contact_style(doc);

    for key in PlaceableKey::ALL {
        if doc.placement(key) != face {
            continue;
        }
        let anchor = singleton_anchor(key, face);
        let origin = anchor.shifted(doc.position(key));
        let node = match key {
            PlaceableKey::Logo => {
                let uri = doc.text(keys::LOGO_URL).trim().to_string();
                if uri.is_empty() {
                    continue;
                }
                VisualNode::Logo {
                    uri,
                    size: doc.number(keys::LOGO_SIZE, 140.0),
                }
            }
            PlaceableKey::Photo => {
                let Some(uri) = doc.images.photo.clone().filter(|u| !u.is_empty()) else {
                    continue;
                };
                VisualNode::Photo {
                    uri,
                    size: doc.number(keys::PHOTO_SIZE, 180.0),
                }
            }
            PlaceableKey::Name => {
                let text = doc.text(keys::NAME).trim().to_string();
                if text.is_empty() {
                    continue;
                }
                VisualNode::Name {
                    text,
                    style: TextStyle {
                        color: doc.text(keys::NAME_COLOR).to_string(),
                        size: doc.number(keys::NAME_SIZE, 56.0),
                    },
                }
            }
            PlaceableKey::Tagline => {
                let text = doc.text(keys::TAGLINE).trim().to_string();
                if text.is_empty() {
                    continue;
                }
                VisualNode::Tagline {
                    text,
                    style: TextStyle {
                        color: doc.text(keys::TAGLINE_COLOR).to_string(),
                        size: doc.number(keys::TAGLINE_SIZE, 28.0),
                    },
                }
            }
            PlaceableKey::Qr => {
                let source = qr::resolve_source(doc);
                if source == QrSource::None {
                    continue;
                }
                VisualNode::Qr {
                    source,
                    size: doc.number(keys::QR_SIZE, 180.0),
                }
            }
        };
        visuals.push(PlaceableVisual { origin, node });
    }

    // Phones stack from the face's phone anchor, in on-screen order; each
    // entry's own offset shifts it from its slot in the stack.
    let mut slot = 0usize;
    for phone in &doc.phones {
        if phone.placement != face || phone.value.trim().is_empty() {
            continue;
        }
        let anchor = phone_anchor(face);
        let origin = Point::new(anchor.x, anchor.y + slot as f64 * ROW_STEP)
            .shifted(phone.position);
        visuals.push(PlaceableVisual {
            origin,
            node: VisualNode::Phone {
                id: phone.id.clone(),
                value: phone.value.clone(),
                style: contact_style.clone(),
            },
        });
        slot += 1;
    }

    let mut slot = 0usize;
    for link in &doc.social_links {
        if link.placement != face || link.value.trim().is_empty() {
            continue;
        }
        // Per-entry override beats the section style when present; absence
        // of the override struct is the only "not overridden" state.
        let style = match &link.style_override {
            Some(o) => ContactStyle {
                button: contact_style.button,
                color: o.color.clone(),
                size: o.size,
            },
            None => contact_style.clone(),
        };
        let anchor = social_anchor(face);
        let origin =
            Point::new(anchor.x, anchor.y + slot as f64 * ROW_STEP).shifted(link.position);
        visuals.push(PlaceableVisual {
            origin,
            node: VisualNode::Social {
                id: link.id.clone(),
                platform: link.platform.clone(),
                value: link.value.clone(),
                style,
            },
        });
        slot += 1;
    }

    let mut slot = 0usize;
    for platform in StaticPlatform::ALL {
        let Some(entry) = doc.static_social.get(&platform) else {
            continue;
        };
        if entry.placement != face || entry.value.trim().is_empty() {
            continue;
        }
        let anchor = static_anchor(face);
        let origin =
            Point::new(anchor.x, anchor.y + slot as f64 * ROW_STEP).shifted(entry.position);
        visuals.push(PlaceableVisual {
            origin,
            node: VisualNode::StaticChannel {
                platform,
                value: entry.value.clone(),
                style: contact_style.clone(),
            },
        });
        slot += 1;
    }

    visuals
}
