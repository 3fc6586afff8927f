//! Batch export: many stored documents, one zip bundle.
//!
//! Batch export is a destructive, sequential process over the shared live
//! state: each document is written through the synchronizer, snapshotted
//! on both faces, then the next one runs: strictly one at a time, every
//! step awaited. One item failing to snapshot is skipped and reported;
//! the batch continues.
//!
//! Restoring the originally-active document afterwards is guarded by a
//! staleness check: the pre-batch document is captured before anything
//! runs, and the live surface is compared against the last batch-applied
//! state before the restore. If they differ, a newer interactively-applied
//! document landed mid-batch and the restore is skipped. The batch must
//! never stomp it.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::document::CardDocument;
use crate::error::TarjetaError;
use crate::export::{SnapshotOptions, encode_raster};
use crate::render::{self, ImageSource};
use crate::sync::{EditSurface, StateManager, WriteOptions};

/// One document in a batch, with the file-name stem for its snapshots.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub name: String,
    pub doc: CardDocument,
}

/// What happened to each item, and whether the live state was restored.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub restored: bool,
}

/// Export every item through the live synchronizer into a zip blob.
pub async fn export_batch<S: EditSurface>(
    state: &mut StateManager<S>,
    items: &[BatchItem],
    source: &dyn ImageSource,
    options: SnapshotOptions,
) -> Result<(Vec<u8>, BatchReport), TarjetaError> {
    // Captured before anything is applied; this is what gets restored.
    let original = state.read();
    let mut report = BatchReport::default();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default();
    let mut last_applied = original.clone();

    for item in items {
        // Batch writes bypass history: intermediate states are not edits.
        let applied = state.write(&item.doc, WriteOptions { push_history: false });
        last_applied = applied.clone();

        match snapshot_both(&applied, source, options).await {
            Ok((front, back)) => {
                let ext = options.format.extension();
                let result = zip
                    .start_file(format!("{}-front.{ext}", item.name), file_options)
                    .and_then(|_| zip.write_all(&front).map_err(Into::into))
                    .and_then(|_| zip.start_file(format!("{}-back.{ext}", item.name), file_options))
                    .and_then(|_| zip.write_all(&back).map_err(Into::into));
                match result {
                    Ok(()) => report.exported.push(item.name.clone()),
                    Err(e) => report.failed.push((item.name.clone(), e.to_string())),
                }
            }
            Err(e) => {
                println!("[export] batch item '{}' skipped: {e}", item.name);
                report.failed.push((item.name.clone(), e.to_string()));
            }
        }
    }

    // Restore unless the live surface moved on while the batch ran.
    if state.read() == last_applied {
        state.write(&original, WriteOptions { push_history: false });
        report.restored = true;
    } else {
        println!("[export] live state changed during batch; restore skipped");
    }

    let blob = zip
        .finish()
        .map_err(|e| TarjetaError::Export(format!("zip assembly failed: {e}")))?
        .into_inner();
    Ok((blob, report))
}

async fn snapshot_both(
    doc: &CardDocument,
    source: &dyn ImageSource,
    options: SnapshotOptions,
) -> Result<(Vec<u8>, Vec<u8>), TarjetaError> {
    let resolved = render::resolve_images(doc, source).await;
    let (front, back) = render::render_card(doc, &resolved);
    Ok((encode_raster(&front, options)?, encode_raster(&back, options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::keys;
    use crate::render::FsImageSource;
    use pretty_assertions::assert_eq;

    fn item(name: &str) -> BatchItem {
        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, name);
        BatchItem {
            name: name.to_string(),
            doc,
        }
    }

    #[tokio::test]
    async fn test_batch_restores_original_state() {
        let mut state = StateManager::in_memory();
        state.set_field(keys::NAME, "Original".into());
        state.commit();
        let before = state.read();

        let items = vec![item("b"), item("c"), item("d")];
        let source = FsImageSource::new(".");
        let (blob, report) =
            export_batch(&mut state, &items, &source, SnapshotOptions::default())
                .await
                .unwrap();

        assert_eq!(report.exported, vec!["b", "c", "d"]);
        assert!(report.restored);
        assert!(!blob.is_empty());
        assert_eq!(state.read(), before);
    }

    #[tokio::test]
    async fn test_batch_zip_lists_both_faces_per_item() {
        let mut state = StateManager::in_memory();
        let items = vec![item("solo")];
        let source = FsImageSource::new(".");
        let (blob, _) = export_batch(&mut state, &items, &source, SnapshotOptions::default())
            .await
            .unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(blob)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"solo-front.png"));
        assert!(names.contains(&"solo-back.png"));
    }

    #[tokio::test]
    async fn test_batch_does_not_touch_history() {
        let mut state = StateManager::in_memory();
        state.set_field(keys::NAME, "Original".into());
        state.commit();
        let could_undo = state.can_undo();

        let source = FsImageSource::new(".");
        let _ = export_batch(
            &mut state,
            &[item("x")],
            &source,
            SnapshotOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(state.can_undo(), could_undo);
        assert!(!state.can_redo());
    }
}
