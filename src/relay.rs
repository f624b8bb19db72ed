//! Hand-off queue between the socket task and the translation worker thread

use crate::audio::AudioChunk;
use crate::timing::{Stage, TimingBus};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

enum RelayItem {
    Chunk(AudioChunk),
    End,
}

/// Ordered, stop-aware queue from one producer to one blocking consumer.
///
/// `submit` never blocks and is called from the async side. `next` blocks
/// and is called only from the worker thread running the translation stream.
/// After `stop`, chunks already queued are still delivered, then `next`
/// returns `None`; chunks submitted after `stop` are dropped.
pub struct Relay {
    tx: mpsc::Sender<RelayItem>,
    rx: Mutex<mpsc::Receiver<RelayItem>>,
    stopped: AtomicBool,
    submitted: AtomicUsize,
    poll_interval: Duration,
    timing: Option<Arc<TimingBus>>,
}

impl Relay {
    pub fn new(poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            stopped: AtomicBool::new(false),
            submitted: AtomicUsize::new(0),
            poll_interval,
            timing: None,
        }
    }

    /// Record an `audio_to_service` event for every chunk handed out by `next`
    pub fn with_timing(mut self, timing: Arc<TimingBus>) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Queue a chunk for the consumer.
    ///
    /// Returns `false` (and drops the chunk) if the relay is already stopped.
    pub fn submit(&self, chunk: AudioChunk) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            debug!("Relay stopped, dropping {} byte chunk", chunk.len());
            return false;
        }

        let count = self.submitted.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Relay chunk {} queued ({} bytes)", count, chunk.len());

        // The receiver lives as long as self, so this only fails after drop
        self.tx.send(RelayItem::Chunk(chunk)).is_ok()
    }

    /// Stop the relay and wake a consumer blocked in `next`. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            "Relay stopped after {} chunks",
            self.submitted.load(Ordering::Relaxed)
        );
        let _ = self.tx.send(RelayItem::End);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of chunks accepted so far
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Block until the next chunk is available.
    ///
    /// Returns `None` at end-of-stream. Waits in slices of the poll interval
    /// and re-checks the stop flag between them, so a stopped relay releases
    /// its consumer within one interval even if the end marker is lost to a
    /// race.
    pub fn next(&self) -> Option<AudioChunk> {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(RelayItem::Chunk(chunk)) => {
                    if let Some(timing) = &self.timing {
                        timing.record_chunk(Stage::AudioToService, chunk.index, chunk.len());
                    }
                    return Some(chunk);
                }
                Ok(RelayItem::End) => {
                    debug!("Relay reached end marker");
                    return None;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.is_stopped() {
                        debug!("Relay stopped during wait");
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Blocking iterator over the remaining chunks
    pub fn iter(&self) -> RelayIter<'_> {
        RelayIter { relay: self }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

pub struct RelayIter<'a> {
    relay: &'a Relay,
}

impl Iterator for RelayIter<'_> {
    type Item = AudioChunk;

    fn next(&mut self) -> Option<AudioChunk> {
        self.relay.next()
    }
}
