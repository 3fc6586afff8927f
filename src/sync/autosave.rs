//! Debounced history-push + persistence.
//!
//! Rapid-fire edits (dragging, slider scrubbing) must produce one history
//! entry and one persistence write per pause in activity, not one per
//! intermediate event. The debounce is trailing-edge and last-write-wins;
//! teardown flushes the pending state rather than dropping it.

use std::time::Duration;

use tokio::time::Instant;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::document::CardDocument;
use crate::error::TarjetaError;

/// Debounce window between the last edit in a burst and the coalesced save.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(800);

/// Where coalesced documents get persisted.
#[async_trait]
pub trait DesignSink: Send + Sync + 'static {
    async fn persist(&self, doc: &CardDocument) -> Result<(), TarjetaError>;
}

/// Pure trailing-edge debounce core. Offers replace each other (last write
/// wins); `ready` releases the pending value once the window has elapsed;
/// `flush` releases it unconditionally.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a new value at `now`, superseding any pending one.
    pub fn offer(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    /// The deadline of the pending value, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending value if its window has elapsed.
    pub fn ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now >= *at => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of the window (teardown path).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

/// Handle to the background autosave task.
///
/// Dropping the handle's sender closes the channel; the task flushes any
/// pending document before exiting, so the last state in a burst is always
/// the one persisted.
pub struct Autosave {
    tx: mpsc::UnboundedSender<CardDocument>,
    handle: JoinHandle<()>,
}

impl Autosave {
    /// Spawn the autosave loop over a sink.
    pub fn spawn(sink: impl DesignSink) -> Self {
        Self::spawn_with_window(sink, DEBOUNCE_WINDOW)
    }

    pub fn spawn_with_window(sink: impl DesignSink, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_loop(rx, sink, window));
        Self { tx, handle }
    }

    /// Queue a document for coalesced persistence.
    pub fn offer(&self, doc: CardDocument) {
        // Send only fails when the task is gone; nothing to coalesce then.
        let _ = self.tx.send(doc);
    }

    /// Close the channel and wait for the final flush.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

async fn run_loop(
    mut rx: mpsc::UnboundedReceiver<CardDocument>,
    sink: impl DesignSink,
    window: Duration,
) {
    let mut debounce: Debouncer<CardDocument> = Debouncer::new(window);
    loop {
        let next = match debounce.deadline() {
            Some(deadline) => {
                tokio::select! {
                    msg = rx.recv() => Some(msg),
                    _ = tokio::time::sleep_until(deadline) => None,
                }
            }
            None => Some(rx.recv().await),
        };

        match next {
            // New edit: supersede the pending document.
            Some(Some(doc)) => debounce.offer(doc, Instant::now()),
            // Channel closed: flush rather than drop, then exit.
            Some(None) => {
                if let Some(doc) = debounce.flush() {
                    persist(&sink, &doc).await;
                }
                return;
            }
            // Window elapsed: persist the coalesced state.
            None => {
                if let Some(doc) = debounce.ready(Instant::now()) {
                    persist(&sink, &doc).await;
                }
            }
        }
    }
}

async fn persist(sink: &impl DesignSink, doc: &CardDocument) {
    if let Err(e) = sink.persist(doc).await {
        // A failed save must not corrupt anything; surface and move on.
        println!("[autosave] persist failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::keys;
    use std::sync::Mutex;

    #[test]
    fn test_debouncer_last_write_wins() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.offer(1, start);
        d.offer(2, start + Duration::from_millis(50));

        // First deadline passed, but the second offer reset the window.
        assert_eq!(d.ready(start + Duration::from_millis(120)), None);
        assert_eq!(d.ready(start + Duration::from_millis(150)), Some(2));
        assert_eq!(d.ready(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_debouncer_flush_ignores_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.offer(7, start);
        assert_eq!(d.flush(), Some(7));
        assert_eq!(d.flush(), None);
    }

    struct RecordingSink(Mutex<Vec<String>>);

    #[async_trait]
    impl DesignSink for &'static RecordingSink {
        async fn persist(&self, doc: &CardDocument) -> Result<(), TarjetaError> {
            self.0.lock().unwrap().push(doc.text(keys::NAME).to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_final_state() {
        static SINK: RecordingSink = RecordingSink(Mutex::new(Vec::new()));
        let autosave = Autosave::spawn_with_window(&SINK, Duration::from_millis(200));

        for name in ["a", "ab", "abc"] {
            let mut doc = CardDocument::starter();
            doc.set_text(keys::NAME, name);
            autosave.offer(doc);
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        // Pause long enough for the trailing edge to fire.
        tokio::time::advance(Duration::from_millis(400)).await;
        autosave.shutdown().await;

        let saved = SINK.0.lock().unwrap().clone();
        assert_eq!(saved, vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending() {
        static SINK: RecordingSink = RecordingSink(Mutex::new(Vec::new()));
        let autosave = Autosave::spawn_with_window(&SINK, Duration::from_secs(60));

        let mut doc = CardDocument::starter();
        doc.set_text(keys::NAME, "unsaved");
        autosave.offer(doc);
        // Yield so the task picks the message up before the channel closes.
        tokio::time::advance(Duration::from_millis(1)).await;
        autosave.shutdown().await;

        let saved = SINK.0.lock().unwrap().clone();
        assert_eq!(saved, vec!["unsaved".to_string()]);
    }
}
