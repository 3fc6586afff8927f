//! Placement and fine-position state for everything draggable.
//!
//! Answers "where is placeable X" for both the closed singleton set and the
//! open list sets. Singleton keys are the typed [`PlaceableKey`] enum, so
//! the unknown-key caller error of a stringly-typed store is unrepresentable
//! here. List entries are tracked by [`StableId`] and read leniently:
//! entries can be deleted out from under stale references, so an unknown id
//! simply behaves as front/{0,0}.

use std::collections::HashMap;

use super::{CardDocument, Face, Offset, PlaceableKey, StableId, StaticPlatform, default_face};

/// Face + offset state for singletons, list entries, and static channels.
#[derive(Debug, Clone, Default)]
pub struct PlacementStore {
    positions: HashMap<PlaceableKey, Offset>,
    placements: HashMap<PlaceableKey, Face>,
    entry_positions: HashMap<StableId, Offset>,
    entry_placements: HashMap<StableId, Face>,
    static_positions: HashMap<StaticPlatform, Offset>,
    static_placements: HashMap<StaticPlatform, Face>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Closed singleton set
    // ------------------------------------------------------------------

    pub fn face(&self, key: PlaceableKey) -> Face {
        self.placements
            .get(&key)
            .copied()
            .unwrap_or_else(|| default_face(key))
    }

    /// Move a singleton to the other face. Clears its manual fine-position:
    /// a freshly-moved element starts at its new face's default slot.
    pub fn set_face(&mut self, key: PlaceableKey, face: Face) {
        self.placements.insert(key, face);
        self.positions.insert(key, Offset::ZERO);
    }

    pub fn offset(&self, key: PlaceableKey) -> Offset {
        self.positions.get(&key).copied().unwrap_or(Offset::ZERO)
    }

    /// Apply a drag delta. Unclamped; containment is the presentation
    /// layer's policy.
    pub fn add_offset(&mut self, key: PlaceableKey, dx: f64, dy: f64) {
        let current = self.offset(key);
        self.positions
            .insert(key, Offset::new(current.x + dx, current.y + dy));
    }

    pub fn set_offset(&mut self, key: PlaceableKey, offset: Offset) {
        self.positions.insert(key, offset);
    }

    // ------------------------------------------------------------------
    // Open list entries (phones, social links)
    // ------------------------------------------------------------------

    pub fn entry_face(&self, id: &StableId) -> Face {
        self.entry_placements.get(id).copied().unwrap_or_default()
    }

    pub fn set_entry_face(&mut self, id: &StableId, face: Face) {
        self.entry_placements.insert(id.clone(), face);
        self.entry_positions.insert(id.clone(), Offset::ZERO);
    }

    pub fn entry_offset(&self, id: &StableId) -> Offset {
        self.entry_positions.get(id).copied().unwrap_or(Offset::ZERO)
    }

    pub fn add_entry_offset(&mut self, id: &StableId, dx: f64, dy: f64) {
        let current = self.entry_offset(id);
        self.entry_positions
            .insert(id.clone(), Offset::new(current.x + dx, current.y + dy));
    }

    pub fn set_entry_offset(&mut self, id: &StableId, offset: Offset) {
        self.entry_positions.insert(id.clone(), offset);
    }

    /// Drop entry state for ids no longer present in the document. Orphaned
    /// visual state is removed, not hidden.
    pub fn retain_entries(&mut self, live: &dyn Fn(&StableId) -> bool) {
        self.entry_positions.retain(|id, _| live(id));
        self.entry_placements.retain(|id, _| live(id));
    }

    // ------------------------------------------------------------------
    // Static contact channels
    // ------------------------------------------------------------------

    pub fn static_face(&self, platform: StaticPlatform) -> Face {
        self.static_placements
            .get(&platform)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_static_face(&mut self, platform: StaticPlatform, face: Face) {
        self.static_placements.insert(platform, face);
        self.static_positions.insert(platform, Offset::ZERO);
    }

    pub fn static_offset(&self, platform: StaticPlatform) -> Offset {
        self.static_positions
            .get(&platform)
            .copied()
            .unwrap_or(Offset::ZERO)
    }

    pub fn add_static_offset(&mut self, platform: StaticPlatform, dx: f64, dy: f64) {
        let current = self.static_offset(platform);
        self.static_positions
            .insert(platform, Offset::new(current.x + dx, current.y + dy));
    }

    // ------------------------------------------------------------------
    // Document sync
    // ------------------------------------------------------------------

    /// Replace all state from a document (the write side of the sync).
    pub fn load_from(&mut self, doc: &CardDocument) {
        self.positions.clear();
        self.placements.clear();
        self.entry_positions.clear();
        self.entry_placements.clear();
        self.static_positions.clear();
        self.static_placements.clear();

        for key in PlaceableKey::ALL {
            self.positions.insert(key, doc.position(key));
            self.placements.insert(key, doc.placement(key));
        }
        for phone in &doc.phones {
            self.entry_positions.insert(phone.id.clone(), phone.position);
            self.entry_placements.insert(phone.id.clone(), phone.placement);
        }
        for link in &doc.social_links {
            self.entry_positions.insert(link.id.clone(), link.position);
            self.entry_placements.insert(link.id.clone(), link.placement);
        }
        for (platform, entry) in &doc.static_social {
            self.static_positions.insert(*platform, entry.position);
            self.static_placements.insert(*platform, entry.placement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_defaults() {
        let store = PlacementStore::new();
        assert_eq!(store.face(PlaceableKey::Qr), Face::Back);
        assert_eq!(store.face(PlaceableKey::Logo), Face::Front);
        assert_eq!(store.offset(PlaceableKey::Logo), Offset::ZERO);
    }

    #[test]
    fn test_set_face_clears_offset() {
        let mut store = PlacementStore::new();
        store.add_offset(PlaceableKey::Logo, 25.0, -8.0);
        assert_eq!(store.offset(PlaceableKey::Logo), Offset::new(25.0, -8.0));

        store.set_face(PlaceableKey::Logo, Face::Back);
        assert_eq!(store.face(PlaceableKey::Logo), Face::Back);
        assert_eq!(store.offset(PlaceableKey::Logo), Offset::ZERO);
    }

    #[test]
    fn test_add_offset_is_additive() {
        let mut store = PlacementStore::new();
        store.add_offset(PlaceableKey::Name, 3.0, 4.0);
        store.add_offset(PlaceableKey::Name, -1.0, 1.0);
        assert_eq!(store.offset(PlaceableKey::Name), Offset::new(2.0, 5.0));
    }

    #[test]
    fn test_unknown_entry_reads_as_defaults() {
        let store = PlacementStore::new();
        let stale = StableId::test("deleted-entry");
        assert_eq!(store.entry_face(&stale), Face::Front);
        assert_eq!(store.entry_offset(&stale), Offset::ZERO);
    }

    #[test]
    fn test_entry_face_change_clears_entry_offset() {
        let mut store = PlacementStore::new();
        let id = StableId::test("p1");
        store.add_entry_offset(&id, 10.0, 10.0);
        store.set_entry_face(&id, Face::Back);
        assert_eq!(store.entry_offset(&id), Offset::ZERO);
    }

    #[test]
    fn test_retain_entries_drops_orphans() {
        let mut store = PlacementStore::new();
        let keep = StableId::test("keep");
        let drop = StableId::test("drop");
        store.add_entry_offset(&keep, 1.0, 1.0);
        store.add_entry_offset(&drop, 2.0, 2.0);

        store.retain_entries(&|id| id == &keep);
        assert_eq!(store.entry_offset(&keep), Offset::new(1.0, 1.0));
        assert_eq!(store.entry_offset(&drop), Offset::ZERO);
    }

    #[test]
    fn test_load_from_document() {
        let mut doc = CardDocument::starter();
        doc.positions.insert(PlaceableKey::Logo, Offset::new(10.0, -4.0));
        doc.placements.insert(PlaceableKey::Logo, Face::Back);

        let mut store = PlacementStore::new();
        store.add_offset(PlaceableKey::Photo, 99.0, 99.0);
        store.load_from(&doc);

        assert_eq!(store.face(PlaceableKey::Logo), Face::Back);
        assert_eq!(store.offset(PlaceableKey::Logo), Offset::new(10.0, -4.0));
        // Photo came back from the document's stored zero, not the stale 99.
        assert_eq!(store.offset(PlaceableKey::Photo), Offset::ZERO);
    }
}
