//! # Projector Listener
//!
//! Drains an engine subscription into a shared [`Projection`].
//!
//! ```text
//! ┌──────────────┐ try_send ┌──────────────┐  apply  ┌──────────────┐
//! │    Engine    │ ───────▶ │   Listener   │ ──────▶ │  Projection  │ ──▶ readers
//! │   (outbox)   │ ◀─────── │ (seq check)  │         │   (RwLock)   │
//! └──────────────┘  replay  └──────────────┘         └──────────────┘
//! ```
//!
//! The engine never waits for us, so envelopes can be skipped when the
//! channel is full. The listener tracks the next sequence it expects; any
//! gap is filled by replaying the engine's log, and anything it has already
//! seen is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::RwLock;
use stakefour_engine::{Envelope, GameEngine};

use crate::projection::Projection;

/// Where the listener gets envelopes from.
pub trait NotificationSource: Send + Sync {
    /// Subscribes to new envelopes; returns the receiver and the first
    /// sequence it will carry.
    fn subscribe(&self) -> (Receiver<Envelope>, u64);

    /// Every envelope with `sequence >= from`.
    fn since(&self, from: u64) -> Vec<Envelope>;

    /// Number of envelopes published so far.
    fn head(&self) -> u64;
}

impl NotificationSource for GameEngine {
    fn subscribe(&self) -> (Receiver<Envelope>, u64) {
        GameEngine::subscribe(self)
    }

    fn since(&self, from: u64) -> Vec<Envelope> {
        self.notifications_since(from)
    }

    fn head(&self) -> u64 {
        self.outbox_stats().published
    }
}

/// Listener counters.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Envelopes taken off the channel.
    pub received: AtomicU64,
    /// Envelopes handed to the projection, from the channel or a replay.
    pub processed: AtomicU64,
    /// Envelopes ignored because their sequence was already processed.
    pub skipped: AtomicU64,
    /// Replays triggered by a sequence gap.
    pub replays: AtomicU64,
    /// Average apply latency in microseconds.
    pub avg_latency_us: AtomicU64,
    /// Maximum apply latency in microseconds.
    pub max_latency_us: AtomicU64,
}

/// Cloneable control and read access for a listener running elsewhere.
#[derive(Clone, Debug)]
pub struct ListenerHandle {
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<ListenerStats>,
    projection: Arc<RwLock<Projection>>,
}

impl ListenerHandle {
    /// Asks the listener loop to exit after its current wait. Sticky: a
    /// loop started after this call returns at once.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether the listener loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Listener counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// The shared projection.
    #[must_use]
    pub fn projection(&self) -> Arc<RwLock<Projection>> {
        Arc::clone(&self.projection)
    }
}

/// Feeds one projection from one notification source.
pub struct ProjectorListener<S: NotificationSource> {
    source: Arc<S>,
    receiver: Receiver<Envelope>,
    /// Sequence of the next envelope to process.
    next_sequence: u64,
    projection: Arc<RwLock<Projection>>,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<ListenerStats>,
}

impl<S: NotificationSource> ProjectorListener<S> {
    /// Subscribes to `source` and catches up on everything already published.
    #[must_use]
    pub fn attach(source: Arc<S>, projection: Arc<RwLock<Projection>>) -> Self {
        let (receiver, _first) = source.subscribe();
        let mut listener = Self {
            source,
            receiver,
            next_sequence: 0,
            projection,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ListenerStats::default()),
        };
        listener.replay();
        listener
    }

    /// Control and read handle.
    #[must_use]
    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            running: Arc::clone(&self.running),
            shutdown: Arc::clone(&self.shutdown),
            stats: Arc::clone(&self.stats),
            projection: Arc::clone(&self.projection),
        }
    }

    /// Sequence of the next envelope this listener expects.
    #[inline]
    #[must_use]
    pub const fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Drains whatever is waiting without blocking, then fills any gap
    /// left at the tail. Returns the number of envelopes processed.
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            processed += self.ingest(envelope);
        }
        if self.source.head() > self.next_sequence {
            processed += self.replay();
        }
        processed
    }

    /// Blocks processing envelopes until [`ListenerHandle::stop`] is called
    /// or the source goes away. Tail gaps are checked every `idle`.
    pub fn run(&mut self, idle: Duration) {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(next_sequence = self.next_sequence, "projector listener started");

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.receiver.recv_timeout(idle) {
                Ok(envelope) => {
                    self.ingest(envelope);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.source.head() > self.next_sequence {
                        self.replay();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("notification source disconnected");
                    break;
                }
            }
        }

        self.poll();
        self.running.store(false, Ordering::SeqCst);
        tracing::info!(
            next_sequence = self.next_sequence,
            processed = self.stats.processed.load(Ordering::Relaxed),
            "projector listener stopped"
        );
    }

    /// Processes one envelope from the channel. Returns how many envelopes
    /// reached the projection, counting any replayed to fill a gap.
    fn ingest(&mut self, envelope: Envelope) -> usize {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        if envelope.sequence < self.next_sequence {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return 0;
        }
        if envelope.sequence > self.next_sequence {
            tracing::warn!(
                expected = self.next_sequence,
                got = envelope.sequence,
                "sequence gap, replaying"
            );
            // The replay covers this envelope too.
            return self.replay();
        }

        self.process(&envelope);
        1
    }

    /// Replays every envelope from `next_sequence` on.
    fn replay(&mut self) -> usize {
        let missed = self.source.since(self.next_sequence);
        if missed.is_empty() {
            return 0;
        }
        self.stats.replays.fetch_add(1, Ordering::Relaxed);
        for envelope in &missed {
            self.process(envelope);
        }
        missed.len()
    }

    fn process(&mut self, envelope: &Envelope) {
        let start = Instant::now();
        self.projection.write().apply(envelope);
        self.next_sequence = envelope.sequence + 1;
        self.record_latency(start);
    }

    fn record_latency(&self, start: Instant) {
        let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        let count = self.stats.processed.fetch_add(1, Ordering::Relaxed) + 1;

        let _ = self.stats.max_latency_us.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |current| (latency_us > current).then_some(latency_us),
        );

        let current_avg = self.stats.avg_latency_us.load(Ordering::Relaxed);
        let new_avg = if count == 1 {
            latency_us
        } else {
            (current_avg * 7 + latency_us) / 8
        };
        self.stats.avg_latency_us.store(new_avg, Ordering::Relaxed);
    }
}

impl<S: NotificationSource> std::fmt::Debug for ProjectorListener<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorListener")
            .field("next_sequence", &self.next_sequence)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
