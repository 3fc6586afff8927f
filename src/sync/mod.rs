//! # Document Synchronizer
//!
//! The single place where "UI truth" and "document truth" are reconciled.
//! [`StateManager`] reads the live editing surface into a [`CardDocument`]
//! and applies a document back onto the surface, keeping both in lock-step
//! with the undo/redo [`History`].
//!
//! The editing surface itself is outside the core: it is injected through
//! the narrow [`EditSurface`] capability (`read`/`apply`), which keeps the
//! synchronizer testable with the in-memory [`MemorySurface`] fake.
//!
//! Key rule: `write` always ends by calling `read` again and pushing *that*
//! result to history (never the caller-supplied document), so history
//! stores what the surface actually converged to, even when a foreign
//! document carried fields the surface dropped.

pub mod autosave;
pub mod history;

pub use history::History;

use std::collections::BTreeMap;

use crate::document::{
    CardDocument, Face, IdAllocator, ImageRefs, PhoneEntry, PlaceableKey, PlacementStore, Scalar,
    SocialEntry, StableId, StaticPlatform, StaticSocialEntry, StyleOverride, keys,
};
use crate::export::qr::{self, QrSource};

// ============================================================================
// RAW FORM SNAPSHOT
// ============================================================================

/// Value held by one scalar form control.
///
/// The control kind fixes the coercion on read: checkbox-like controls
/// yield booleans, slider/numeric controls yield numbers, everything else
/// strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Text(String),
    Number(f64),
    Checkbox(bool),
}

impl ControlValue {
    fn to_scalar(&self) -> Scalar {
        match self {
            ControlValue::Text(s) => Scalar::Text(s.clone()),
            ControlValue::Number(n) => Scalar::Number(*n),
            ControlValue::Checkbox(b) => Scalar::Flag(*b),
        }
    }

    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => ControlValue::Text(s.clone()),
            Scalar::Number(n) => ControlValue::Number(*n),
            Scalar::Flag(b) => ControlValue::Checkbox(*b),
        }
    }
}

/// One phone row's controls: identity plus the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneRow {
    pub id: StableId,
    pub value: String,
}

/// One social link row's controls.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialRow {
    pub id: StableId,
    pub platform: String,
    pub value: String,
    pub style_override: Option<StyleOverride>,
}

/// Everything the editing surface holds, in raw form.
///
/// Placement and drag offsets are not here: those live on the visual nodes
/// and are tracked by the synchronizer's [`PlacementStore`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormSnapshot {
    pub controls: BTreeMap<String, ControlValue>,
    pub phone_rows: Vec<PhoneRow>,
    pub social_rows: Vec<SocialRow>,
    pub static_social: BTreeMap<StaticPlatform, String>,
    pub images: ImageRefs,
}

/// The injected live editing surface.
///
/// `apply` must be apply-all-or-log-and-skip-field: an unsupported control
/// is skipped, never a partial failure.
pub trait EditSurface {
    fn read(&self) -> FormSnapshot;
    fn apply(&mut self, snapshot: FormSnapshot);
}

// ============================================================================
// IN-MEMORY SURFACE
// ============================================================================

/// In-memory editing surface: the test double for the DOM form layer, and
/// the real surface for batch export and CLI rendering.
///
/// Knows a fixed registry of control keys (the starter document's fields);
/// unknown keys in an applied snapshot are logged and skipped, so foreign
/// or future documents load without failing.
#[derive(Debug)]
pub struct MemorySurface {
    state: FormSnapshot,
    known_keys: Vec<String>,
}

impl MemorySurface {
    pub fn new() -> Self {
        let starter = CardDocument::starter();
        let mut state = FormSnapshot::default();
        for (key, scalar) in &starter.fields {
            state
                .controls
                .insert(key.clone(), ControlValue::from_scalar(scalar));
        }
        for platform in StaticPlatform::ALL {
            state.static_social.insert(platform, String::new());
        }
        let known_keys = starter.fields.keys().cloned().collect();
        Self { state, known_keys }
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSurface for MemorySurface {
    fn read(&self) -> FormSnapshot {
        self.state.clone()
    }

    fn apply(&mut self, snapshot: FormSnapshot) {
        for (key, value) in snapshot.controls {
            if self.known_keys.iter().any(|k| k == &key) {
                self.state.controls.insert(key, value);
            } else {
                println!("[sync] skip unknown field {key}");
            }
        }
        self.state.phone_rows = snapshot.phone_rows;
        self.state.social_rows = snapshot.social_rows;
        for (platform, value) in snapshot.static_social {
            self.state.static_social.insert(platform, value);
        }
        self.state.images = snapshot.images;
    }
}

// ============================================================================
// FIELD -> RECOMPUTE DEPENDENCY LIST
// ============================================================================

/// A visual consequence that follows a field change.
///
/// `write` is not atomic with respect to re-derivation: values are applied
/// first, then the dependent recomputation runs. This table is the
/// deterministic, complete field-to-step list; recomputation is pulled by the
/// synchronizer, not pushed by a reactive graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    /// Re-resolve the QR payload (auto modes regenerate it from content).
    QrPayload,
    /// Re-render one face's background layers.
    Background(Face),
    /// Re-render one singleton placeable's node.
    Placeable(PlaceableKey),
    /// Re-render the phone/social contact rows (both faces).
    ContactRows,
}

/// The recompute steps that follow a change to `key`. Complete over the
/// starter field set; unknown keys have no visual consequences.
pub fn steps_for_field(key: &str) -> &'static [Recompute] {
    use Recompute::*;
    match key {
        keys::NAME => &[Placeable(PlaceableKey::Name), QrPayload],
        keys::TAGLINE => &[Placeable(PlaceableKey::Tagline), QrPayload],
        keys::NAME_COLOR | keys::NAME_SIZE => &[Placeable(PlaceableKey::Name)],
        keys::TAGLINE_COLOR | keys::TAGLINE_SIZE => &[Placeable(PlaceableKey::Tagline)],
        keys::FRONT_COLOR_TOP | keys::FRONT_COLOR_BOTTOM | keys::FRONT_BG_OPACITY => {
            &[Background(Face::Front)]
        }
        keys::BACK_COLOR_TOP | keys::BACK_COLOR_BOTTOM | keys::BACK_BG_OPACITY => {
            &[Background(Face::Back)]
        }
        keys::LOGO_URL | keys::LOGO_SIZE => &[Placeable(PlaceableKey::Logo)],
        keys::PHOTO_SIZE => &[Placeable(PlaceableKey::Photo)],
        keys::CONTACT_BUTTONS | keys::CONTACT_COLOR | keys::CONTACT_SIZE => &[ContactRows],
        keys::QR_MODE | keys::QR_SIZE | keys::VIEWER_URL => {
            &[Placeable(PlaceableKey::Qr), QrPayload]
        }
        keys::THEME => &[Background(Face::Front), Background(Face::Back)],
        _ => &[],
    }
}

/// State derived from the document, refreshed by the dependency list.
#[derive(Debug, Clone, Default)]
pub struct DerivedState {
    /// Regenerated QR payload text for the auto modes (`None` for image
    /// modes or when nothing encodable exists).
    pub qr_payload: Option<String>,
    /// Faces whose rendered output is stale.
    dirty_faces: Vec<Face>,
}

impl DerivedState {
    fn mark_dirty(&mut self, face: Face) {
        if !self.dirty_faces.contains(&face) {
            self.dirty_faces.push(face);
        }
    }

    /// Faces needing re-render since the last take. Drains.
    pub fn take_dirty(&mut self) -> Vec<Face> {
        std::mem::take(&mut self.dirty_faces)
    }
}

// ============================================================================
// STATE MANAGER
// ============================================================================

/// Options for [`StateManager::write`].
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub push_history: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { push_history: true }
    }
}

/// The document synchronizer: owns the surface capability, the placement
/// store, the id allocator, and the history log.
pub struct StateManager<S: EditSurface> {
    surface: S,
    placements: PlacementStore,
    history: History,
    ids: IdAllocator,
    derived: DerivedState,
}

impl StateManager<MemorySurface> {
    /// A manager over the in-memory surface, loaded with the starter card.
    pub fn in_memory() -> Self {
        Self::new(MemorySurface::new(), CardDocument::starter())
    }
}

impl<S: EditSurface> StateManager<S> {
    /// Wrap a surface and bring it in sync with `initial`.
    pub fn new(surface: S, initial: CardDocument) -> Self {
        let mut manager = Self {
            surface,
            placements: PlacementStore::new(),
            history: History::new(initial.clone()),
            ids: IdAllocator::new(),
            derived: DerivedState::default(),
        };
        // History starts at what the surface converged to, not the raw
        // input, so the first undo target is always reproducible.
        let converged = manager.write(&initial, WriteOptions { push_history: false });
        manager.history = History::new(converged);
        manager
    }

    /// Walk the surface's current values and assemble a document.
    pub fn read(&self) -> CardDocument {
        let snapshot = self.surface.read();
        let mut doc = CardDocument::default();

        for (key, value) in &snapshot.controls {
            doc.fields.insert(key.clone(), value.to_scalar());
        }

        for row in &snapshot.phone_rows {
            doc.phones.push(PhoneEntry {
                id: row.id.clone(),
                value: row.value.clone(),
                placement: self.placements.entry_face(&row.id),
                position: self.placements.entry_offset(&row.id),
            });
        }
        for row in &snapshot.social_rows {
            doc.social_links.push(SocialEntry {
                id: row.id.clone(),
                platform: row.platform.clone(),
                value: row.value.clone(),
                placement: self.placements.entry_face(&row.id),
                position: self.placements.entry_offset(&row.id),
                style_override: row.style_override.clone(),
            });
        }

        for platform in StaticPlatform::ALL {
            let value = snapshot
                .static_social
                .get(&platform)
                .cloned()
                .unwrap_or_default();
            doc.static_social.insert(
                platform,
                StaticSocialEntry {
                    value,
                    placement: self.placements.static_face(platform),
                    position: self.placements.static_offset(platform),
                },
            );
        }

        doc.images = snapshot.images.clone();

        for key in PlaceableKey::ALL {
            doc.positions.insert(key, self.placements.offset(key));
            doc.placements.insert(key, self.placements.face(key));
        }

        doc
    }

    /// Apply a document onto the surface, re-derive visual consequences,
    /// then converge: re-read the surface and (optionally) push that result
    /// to history.
    ///
    /// List sections are fully torn down and rebuilt: entries are
    /// destroyed and recreated with their `StableId`s restored from the
    /// document, never regenerated. Unknown fields are skipped by the
    /// surface; nothing here hard-fails.
    pub fn write(&mut self, doc: &CardDocument, options: WriteOptions) -> CardDocument {
        let mut snapshot = FormSnapshot::default();
        for (key, scalar) in &doc.fields {
            snapshot
                .controls
                .insert(key.clone(), ControlValue::from_scalar(scalar));
        }
        snapshot.phone_rows = doc
            .phones
            .iter()
            .map(|p| PhoneRow {
                id: p.id.clone(),
                value: p.value.clone(),
            })
            .collect();
        snapshot.social_rows = doc
            .social_links
            .iter()
            .map(|s| SocialRow {
                id: s.id.clone(),
                platform: s.platform.clone(),
                value: s.value.clone(),
                style_override: s.style_override.clone(),
            })
            .collect();
        for (platform, entry) in &doc.static_social {
            snapshot.static_social.insert(*platform, entry.value.clone());
        }
        snapshot.images = doc.images.clone();

        self.surface.apply(snapshot);
        self.placements.load_from(doc);

        // Orphan cleanup: visual state whose entry vanished is removed.
        let live: Vec<StableId> = doc
            .phones
            .iter()
            .map(|p| p.id.clone())
            .chain(doc.social_links.iter().map(|s| s.id.clone()))
            .collect();
        self.placements.retain_entries(&|id| live.contains(id));

        // Applying a whole document touches everything: run the full
        // dependency list once.
        self.recompute_all();

        let converged = self.read();
        if options.push_history {
            self.history.push_state(&converged);
        }
        converged
    }

    /// Change one scalar field through the surface and run exactly the
    /// recompute steps the dependency list names for it.
    pub fn set_field(&mut self, key: &str, value: Scalar) {
        let mut snapshot = self.surface.read();
        snapshot
            .controls
            .insert(key.to_string(), ControlValue::from_scalar(&value));
        self.surface.apply(snapshot);
        let steps = steps_for_field(key);
        self.run_steps(steps);
    }

    /// Snapshot the current surface into history. Call after a burst of
    /// interactive edits (typically via the autosave debounce).
    pub fn commit(&mut self) -> CardDocument {
        let doc = self.read();
        self.history.push_state(&doc);
        doc
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step history back and re-apply. Undo never generates a new entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(doc) => {
                self.write(&doc, WriteOptions { push_history: false });
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(doc) => {
                self.write(&doc, WriteOptions { push_history: false });
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // List entry lifecycle
    // ------------------------------------------------------------------

    /// Add a phone row. The id is allocated here, once, and never changes.
    pub fn add_phone(&mut self, value: &str) -> StableId {
        let id = self.ids.new_id("phone");
        let mut snapshot = self.surface.read();
        snapshot.phone_rows.push(PhoneRow {
            id: id.clone(),
            value: value.to_string(),
        });
        self.surface.apply(snapshot);
        self.run_steps(&[Recompute::ContactRows, Recompute::QrPayload]);
        id
    }

    pub fn add_social_link(&mut self, platform: &str, value: &str) -> StableId {
        let id = self.ids.new_id("social");
        let mut snapshot = self.surface.read();
        snapshot.social_rows.push(SocialRow {
            id: id.clone(),
            platform: platform.to_string(),
            value: value.to_string(),
            style_override: None,
        });
        self.surface.apply(snapshot);
        self.run_steps(&[Recompute::ContactRows, Recompute::QrPayload]);
        id
    }

    pub fn remove_entry(&mut self, id: &StableId) {
        let mut snapshot = self.surface.read();
        snapshot.phone_rows.retain(|r| &r.id != id);
        snapshot.social_rows.retain(|r| &r.id != id);
        self.surface.apply(snapshot);
        self.placements.retain_entries(&|candidate| candidate != id);
        self.run_steps(&[Recompute::ContactRows, Recompute::QrPayload]);
    }

    // ------------------------------------------------------------------
    // Placement passthrough (drag + face moves)
    // ------------------------------------------------------------------

    pub fn placements(&self) -> &PlacementStore {
        &self.placements
    }

    pub fn placements_mut(&mut self) -> &mut PlacementStore {
        &mut self.placements
    }

    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    pub fn derived_mut(&mut self) -> &mut DerivedState {
        &mut self.derived
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn recompute_all(&mut self) {
        self.run_steps(&[
            Recompute::QrPayload,
            Recompute::Background(Face::Front),
            Recompute::Background(Face::Back),
            Recompute::ContactRows,
            Recompute::Placeable(PlaceableKey::Logo),
            Recompute::Placeable(PlaceableKey::Photo),
            Recompute::Placeable(PlaceableKey::Name),
            Recompute::Placeable(PlaceableKey::Tagline),
            Recompute::Placeable(PlaceableKey::Qr),
        ]);
    }

    fn run_steps(&mut self, steps: &[Recompute]) {
        for step in steps {
            match step {
                Recompute::QrPayload => {
                    let doc = self.read();
                    self.derived.qr_payload = match qr::resolve_source(&doc) {
                        QrSource::Payload(text) => Some(text),
                        _ => None,
                    };
                    self.derived.mark_dirty(doc.placement(PlaceableKey::Qr));
                }
                Recompute::Background(face) => self.derived.mark_dirty(*face),
                Recompute::Placeable(key) => {
                    let face = self.placements.face(*key);
                    self.derived.mark_dirty(face);
                }
                Recompute::ContactRows => {
                    self.derived.mark_dirty(Face::Front);
                    self.derived.mark_dirty(Face::Back);
                }
            }
        }
    }
}
