use super::event::{Stage, TimingEvent};
use crate::config::{AudioConfig, TimingConfig};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};

pub const DEFAULT_CAPACITY: usize = 100_000;
pub const DEFAULT_SUBSCRIBER_QUEUE_SIZE: usize = 10_000;

/// Identifies a live subscription for `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a subscriber queue
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<TimingEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event; `None` once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<TimingEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TimingEvent> {
        self.rx.try_recv().ok()
    }
}

struct TimingData {
    events: VecDeque<TimingEvent>,
    active: bool,
    test_started_at: Option<DateTime<Utc>>,
    chunk_counter: i64,
}

/// Thread-safe timing event recorder with live fan-out.
///
/// Called from both tokio tasks and the translation worker thread. Event
/// data and the chunk counter live under one lock so all recordings are
/// totally ordered; fan-out happens while that lock is held, taking the
/// subscriber lock only for the duration of the non-blocking pushes.
pub struct TimingBus {
    seconds_per_chunk: f64,
    capacity: usize,
    subscriber_queue_size: usize,
    data: Mutex<TimingData>,
    subscribers: Mutex<BTreeMap<SubscriptionId, mpsc::Sender<TimingEvent>>>,
    next_subscriber_id: AtomicU64,
}

impl TimingBus {
    pub fn new(seconds_per_chunk: f64) -> Self {
        Self::with_limits(
            seconds_per_chunk,
            DEFAULT_CAPACITY,
            DEFAULT_SUBSCRIBER_QUEUE_SIZE,
        )
    }

    pub fn with_limits(seconds_per_chunk: f64, capacity: usize, subscriber_queue_size: usize) -> Self {
        Self {
            seconds_per_chunk,
            capacity: capacity.max(1),
            subscriber_queue_size: subscriber_queue_size.max(1),
            data: Mutex::new(TimingData {
                events: VecDeque::new(),
                active: false,
                test_started_at: None,
                chunk_counter: 0,
            }),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber_id: AtomicU64::new(0),
        }
    }

    pub fn from_config(audio: &AudioConfig, timing: &TimingConfig) -> Self {
        Self::with_limits(
            audio.seconds_per_chunk(),
            timing.capacity,
            timing.subscriber_queue_size,
        )
    }

    pub fn seconds_per_chunk(&self) -> f64 {
        self.seconds_per_chunk
    }

    /// Begin a new test, discarding previous events
    pub fn start_test(&self) {
        let mut data = self.lock_data();
        data.events.clear();
        data.chunk_counter = 0;
        data.test_started_at = Some(Utc::now());
        data.active = true;
        info!("Timing test started");
    }

    /// End the current test; events stay available for export
    pub fn stop_test(&self) {
        let mut data = self.lock_data();
        data.active = false;
        info!("Timing test stopped ({} events retained)", data.events.len());
    }

    pub fn is_test_active(&self) -> bool {
        self.lock_data().active
    }

    pub fn test_started_at(&self) -> Option<DateTime<Utc>> {
        self.lock_data().test_started_at
    }

    /// Record an event at `stage`.
    ///
    /// When `is_index_source` is set the event takes the next chunk index.
    /// Returns the index assigned, or -1 when nothing was assigned (including
    /// when no test is active and the call is ignored).
    pub fn record(&self, stage: Stage, byte_length: usize, is_index_source: bool) -> i64 {
        let mut data = self.lock_data();
        if !data.active {
            return -1;
        }

        let chunk_index = if is_index_source {
            let idx = data.chunk_counter;
            data.chunk_counter += 1;
            idx
        } else {
            -1
        };

        self.push(&mut data, stage, chunk_index, byte_length);
        chunk_index
    }

    /// Record a chunk-scoped event for an index assigned by an earlier `record`
    pub fn record_chunk(&self, stage: Stage, chunk_index: i64, byte_length: usize) {
        let mut data = self.lock_data();
        if !data.active {
            return;
        }
        self.push(&mut data, stage, chunk_index, byte_length);
    }

    fn push(&self, data: &mut TimingData, stage: Stage, chunk_index: i64, byte_length: usize) {
        let now = Utc::now();
        let wall_clock = data
            .test_started_at
            .map(|start| seconds(now - start))
            .unwrap_or(0.0);
        let source_position_sec = if chunk_index >= 0 {
            chunk_index as f64 * self.seconds_per_chunk
        } else {
            0.0
        };

        let event = TimingEvent {
            stage,
            timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
            chunk_index,
            source_position_sec,
            byte_length,
            wall_clock,
        };

        if data.events.len() >= self.capacity {
            data.events.pop_front();
        }
        data.events.push_back(event.clone());

        self.notify(event);
    }

    /// Push to every subscriber without blocking; slow subscribers lose events
    fn notify(&self, event: TimingEvent) {
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Subscriber {:?} queue full, dropping {} event", id, event.stage);
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Subscriber {:?} went away, removing", id);
                false
            }
        });
    }

    /// Register a new bounded delivery queue
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.subscriber_queue_size);
        let id = SubscriptionId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        self.lock_subscribers().insert(id, tx);
        debug!("Timing subscriber {:?} registered", id);
        Subscription { id, rx }
    }

    /// Remove a subscriber; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.lock_subscribers().remove(&id).is_some() {
            debug!("Timing subscriber {:?} removed", id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Snapshot of all retained events in recording order (does not clear)
    pub fn export(&self) -> Vec<TimingEvent> {
        self.lock_data().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_data().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_data(&self) -> MutexGuard<'_, TimingData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(
        &self,
    ) -> MutexGuard<'_, BTreeMap<SubscriptionId, mpsc::Sender<TimingEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn seconds(delta: chrono::Duration) -> f64 {
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1000.0)
}
