//! Stable identity allocation for dynamic list entries.
//!
//! A `StableId` is assigned once when a phone/social entry is created and
//! never regenerated: it is the join key between the entry's data, its
//! on-canvas visual node, and its form control group. Editing a value in
//! place never changes identity, and identity survives serialization.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity token for a dynamic list entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    /// Fixed id for tests and fixtures.
    pub fn test(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues process-unique ids: timestamp + kind + sequence.
///
/// The sequence keeps ids unique within a millisecond; the kind makes them
/// self-describing in stored JSON. Ids are never derived from entry
/// content. Allocation never fails.
#[derive(Debug, Default)]
pub struct IdAllocator {
    seq: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_id(&self, kind: &str) -> StableId {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        StableId(format!("{kind}-{millis}-{seq}"))
    }
}
