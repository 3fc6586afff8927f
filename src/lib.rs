//! # Tarjeta - Business Card Composer Core
//!
//! Tarjeta is a Rust library for composing two-sided business cards as
//! portable documents. It provides:
//!
//! - **Document model**: one serializable type describing a whole card
//! - **Synchronizer**: bidirectional sync between an editing surface and
//!   the document, with depth-bounded undo/redo
//! - **Headless renderer**: pixel reconstruction from the document alone
//! - **Export pipeline**: PNG/JPEG snapshots, PDF, vCard 3.0, QR, zip
//!
//! ## Quick Start
//!
//! ```no_run
//! use tarjeta::document::{CardDocument, keys};
//! use tarjeta::sync::StateManager;
//! use tarjeta::render::{self, ResolvedImages};
//! use tarjeta::document::Face;
//!
//! // Edit through the synchronizer; every commit is undoable.
//! let mut state = StateManager::in_memory();
//! state.set_field(keys::NAME, "Ada Lovelace".into());
//! state.add_phone("+44 20 7946 0321");
//! let doc = state.commit();
//!
//! // Reconstruct the card from the document alone.
//! let front = render::render_face(&doc, Face::Front, &ResolvedImages::empty());
//! front.save("card-front.png")?;
//!
//! # Ok::<(), image::ImageError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Card document model, identity, placement |
//! | [`sync`] | Synchronizer, history, debounced autosave |
//! | [`layout`] | Canonical document→visual-node resolver |
//! | [`render`] | Headless reconstruction renderer |
//! | [`export`] | Raster/PDF/vCard/QR/zip exports |
//! | [`store`] | Local and id-keyed persistence |
//! | [`server`] | HTTP save/view/export service |
//! | [`error`] | Error types |

pub mod document;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod server;
pub mod store;
pub mod sync;

// Re-exports for convenience
pub use document::CardDocument;
pub use error::TarjetaError;
pub use sync::StateManager;
