//! # Card Core Integration Tests
//!
//! End-to-end checks of the properties the whole system leans on:
//!
//! - **Round-trip law**: `read(write(d)) == d` for every document `read`
//!   can produce, including stable ids and offsets.
//! - **Identity stability** across edits, reorders, and save/load cycles.
//! - **Undo/redo** behavior through the full synchronizer.
//! - **Layout parity**: every consumer resolves the same faces, positions
//!   (anchor + stored offset), and QR payloads.
//! - **Viewer reconstruction**: a stored document renders with no editing
//!   state anywhere in reach.

use pretty_assertions::assert_eq;

use tarjeta::document::{
    CardDocument, Face, Offset, PhoneEntry, PlaceableKey, StableId, StyleOverride, keys, qr_mode,
};
use tarjeta::export::qr::QrSource;
use tarjeta::export::vcard;
use tarjeta::layout::{self, VisualNode};
use tarjeta::render::{self, ResolvedImages};
use tarjeta::sync::{StateManager, WriteOptions};

/// A document with content on both faces, dragged placeables, and list
/// entries: the shape the properties below must survive.
fn busy_state() -> StateManager<tarjeta::sync::MemorySurface> {
    let mut state = StateManager::in_memory();
    state.set_field(keys::NAME, "Ada Lovelace".into());
    state.set_field(keys::TAGLINE, "Analyst & Metaphysician".into());
    state.set_field(keys::QR_MODE, qr_mode::AUTO_VCARD.into());

    let phone_front = state.add_phone("+44 20 7946 0321");
    let phone_back = state.add_phone("+44 20 7946 0999");
    state.placements_mut().set_entry_face(&phone_back, Face::Back);
    state.placements_mut().add_entry_offset(&phone_front, 6.0, 2.0);
    state.placements_mut().add_entry_offset(&phone_back, -14.0, 9.0);

    let social = state.add_social_link("github", "adalovelace");
    state.placements_mut().set_entry_face(&social, Face::Back);

    state.placements_mut().set_face(PlaceableKey::Logo, Face::Back);
    state.placements_mut().add_offset(PlaceableKey::Logo, 10.0, -4.0);
    state.commit();
    state
}

#[test]
fn round_trip_law_holds_for_busy_documents() {
    let mut state = busy_state();
    let doc = state.read();
    let converged = state.write(&doc, WriteOptions::default());
    assert_eq!(converged, doc);
    assert_eq!(state.read(), doc);
}

#[test]
fn round_trip_survives_serialization() {
    let mut state = busy_state();
    let doc = state.read();

    // Persist and reload through JSON, as the remote save/load path does.
    let json = serde_json::to_string(&doc).unwrap();
    let restored: CardDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, doc);

    // Applying the reloaded document converges to the identical state:
    // ids restored from the document, never regenerated.
    let converged = state.write(&restored, WriteOptions::default());
    assert_eq!(converged, doc);
}

#[test]
fn identity_and_position_survive_edit_and_reorder() {
    let mut state = StateManager::in_memory();
    let id = state.add_phone("+1 555 0100");
    state.placements_mut().add_entry_offset(&id, 4.0, 4.0);
    let _other = state.add_phone("+1 555 0200");

    for i in 0..5 {
        let mut doc = state.read();
        doc.phones
            .iter_mut()
            .find(|p| p.id == id)
            .unwrap()
            .value = format!("+1 555 99{i:02}");
        state.write(&doc, WriteOptions::default());
    }

    let mut doc = state.read();
    doc.phones.reverse();
    let converged = state.write(&doc, WriteOptions::default());

    let entry = converged.phones.iter().find(|p| p.id == id).unwrap();
    assert_eq!(entry.value, "+1 555 9904");
    assert_eq!(entry.position, Offset::new(4.0, 4.0));
}

#[test]
fn undo_redo_are_inverses_through_the_synchronizer() {
    let mut state = StateManager::in_memory();
    state.set_field(keys::NAME, "One".into());
    state.commit();
    state.set_field(keys::NAME, "Two".into());
    state.commit();
    state.set_field(keys::NAME, "Three".into());
    let top = state.commit();

    assert!(state.undo());
    assert!(state.undo());
    assert_eq!(state.read().text(keys::NAME), "One");

    assert!(state.redo());
    assert!(state.redo());
    assert_eq!(state.read(), top);
    assert!(!state.redo());
}

#[test]
fn layout_places_every_node_at_anchor_plus_offset() {
    let state = busy_state();
    let doc = state.read();

    // Logo moved to the back face at offset {10,-4}.
    let back = layout::resolve_layout(&doc, Face::Back);
    let front = layout::resolve_layout(&doc, Face::Front);

    assert!(
        !front
            .iter()
            .any(|v| matches!(v.node, VisualNode::Logo { .. })),
        "moved logo must leave the front face"
    );
    // (Logo has no URL in this fixture, so the back omits it too; the
    // placement itself is asserted through the document.)
    assert_eq!(doc.placement(PlaceableKey::Logo), Face::Back);
    assert_eq!(doc.position(PlaceableKey::Logo), Offset::new(10.0, -4.0));

    // Each phone renders on its own face, shifted by its own offset.
    let front_phone = front
        .iter()
        .find_map(|v| match &v.node {
            VisualNode::Phone { value, .. } => Some((v.origin, value.clone())),
            _ => None,
        })
        .unwrap();
    let back_phone = back
        .iter()
        .find_map(|v| match &v.node {
            VisualNode::Phone { value, .. } => Some((v.origin, value.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(front_phone.1, "+44 20 7946 0321");
    assert_eq!(back_phone.1, "+44 20 7946 0999");

    let fa = layout::phone_anchor(Face::Front);
    let ba = layout::phone_anchor(Face::Back);
    assert_eq!(front_phone.0, layout::Point::new(fa.x + 6.0, fa.y + 2.0));
    assert_eq!(back_phone.0, layout::Point::new(ba.x - 14.0, ba.y + 9.0));
}

#[test]
fn qr_payload_matches_vcard_export_byte_for_byte() {
    let state = busy_state();
    let doc = state.read();

    let qr_source = doc
        .placements
        .get(&PlaceableKey::Qr)
        .map(|face| layout::resolve_layout(&doc, *face))
        .unwrap_or_default()
        .into_iter()
        .find_map(|v| match v.node {
            VisualNode::Qr { source, .. } => Some(source),
            _ => None,
        })
        .unwrap();

    assert_eq!(qr_source, QrSource::Payload(vcard::to_vcard(&doc)));
}

#[test]
fn empty_logo_field_yields_no_logo_node_anywhere() {
    let mut doc = CardDocument::starter();
    doc.set_text(keys::LOGO_URL, "");
    for face in [Face::Front, Face::Back] {
        let nodes = layout::resolve_layout(&doc, face);
        assert!(!nodes.iter().any(|v| matches!(v.node, VisualNode::Logo { .. })));
        // The headless render agrees: nothing panics, nothing references
        // the absent image.
        let _ = render::render_face(&doc, face, &ResolvedImages::empty());
    }
}

#[test]
fn style_override_applies_to_its_entry_only() {
    let mut state = StateManager::in_memory();
    state.set_field(keys::CONTACT_COLOR, "#e6f0f7".into());
    let plain = state.add_social_link("github", "plain");
    let styled = state.add_social_link("github", "styled");

    let mut doc = state.read();
    doc.social_links
        .iter_mut()
        .find(|l| l.id == styled)
        .unwrap()
        .style_override = Some(StyleOverride {
        color: "#112233".into(),
        size: 22.0,
    });
    let doc = state.write(&doc, WriteOptions::default());

    let colors: Vec<(StableId, String)> = layout::resolve_layout(&doc, Face::Front)
        .into_iter()
        .filter_map(|v| match v.node {
            VisualNode::Social { id, style, .. } => Some((id, style.color)),
            _ => None,
        })
        .collect();
    assert_eq!(colors.len(), 2);
    assert!(colors.contains(&(plain, "#e6f0f7".to_string())));
    assert!(colors.contains(&(styled, "#112233".to_string())));
}

#[test]
fn viewer_reconstructs_from_document_alone() {
    // Simulate the share flow: the editor's document goes through JSON,
    // and a viewer that never saw the editor renders it.
    let state = busy_state();
    let json = serde_json::to_string(&state.read()).unwrap();
    drop(state);

    let doc: CardDocument = serde_json::from_str(&json).unwrap();
    let front = render::render_face(&doc, Face::Front, &ResolvedImages::empty());
    let back = render::render_face(&doc, Face::Back, &ResolvedImages::empty());
    assert_eq!(front.dimensions(), (layout::CARD_WIDTH, layout::CARD_HEIGHT));
    assert_eq!(back.dimensions(), (layout::CARD_WIDTH, layout::CARD_HEIGHT));
}

#[test]
fn phone_entry_on_each_face_renders_on_that_face_only() {
    let mut doc = CardDocument::starter();
    doc.set_flag(keys::CONTACT_BUTTONS, true);
    doc.set_text(keys::CONTACT_COLOR, "#ff0000");
    doc.set_text(keys::FRONT_COLOR_TOP, "#ffffff");
    doc.set_text(keys::FRONT_COLOR_BOTTOM, "#ffffff");
    doc.set_text(keys::BACK_COLOR_TOP, "#ffffff");
    doc.set_text(keys::BACK_COLOR_BOTTOM, "#ffffff");
    doc.set_text(keys::NAME, "");
    doc.set_text(keys::TAGLINE, "");
    doc.set_text(keys::QR_MODE, "none");
    doc.phones.push(PhoneEntry {
        id: StableId::test("front-only"),
        value: "+1 555 0100".into(),
        placement: Face::Front,
        position: Offset::ZERO,
    });

    let front = render::render_face(&doc, Face::Front, &ResolvedImages::empty());
    let back = render::render_face(&doc, Face::Back, &ResolvedImages::empty());

    let red = image::Rgba([255u8, 0, 0, 255]);
    assert!(front.pixels().any(|p| *p == red));
    assert!(!back.pixels().any(|p| *p == red));
}
