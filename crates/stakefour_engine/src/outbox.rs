//! # Notification Outbox
//!
//! Append-only log of every notification plus a non-blocking fan-out to
//! subscribers.
//!
//! ```text
//! ┌──────────┐ publish ┌──────────────┐ try_send ┌──────────────┐
//! │  Engine  │ ──────▶ │  Outbox log  │ ───────▶ │  Subscriber  │ ──▶ Projector
//! │ (locked) │         │ (append-only)│          │  (bounded)   │
//! └──────────┘         └──────────────┘          └──────────────┘
//! ```
//!
//! A slow or dead subscriber never slows the engine down: when its channel
//! is full the envelope is skipped for that subscriber and counted. The
//! subscriber catches up by replaying [`Outbox::since`] from the last
//! sequence it saw, which makes delivery at-least-once.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::notification::{Envelope, Notification};

/// Outbox counters.
#[derive(Debug, Default)]
pub struct OutboxStats {
    /// Notifications appended to the log.
    pub published: AtomicU64,
    /// Envelopes handed to subscriber channels.
    pub delivered: AtomicU64,
    /// Envelopes skipped because a subscriber channel was full.
    pub dropped: AtomicU64,
}

/// Snapshot of [`OutboxStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutboxCounts {
    /// Notifications appended to the log.
    pub published: u64,
    /// Envelopes handed to subscriber channels.
    pub delivered: u64,
    /// Envelopes skipped because a subscriber channel was full.
    pub dropped: u64,
}

/// The append-only notification outbox.
pub struct Outbox {
    /// Every envelope ever published; `log[i].sequence == i`.
    log: Mutex<Vec<Envelope>>,
    /// Live subscriber channels.
    subscribers: Mutex<Vec<Sender<Envelope>>>,
    /// Capacity of each new subscriber channel.
    buffer: usize,
    /// Counters.
    stats: OutboxStats,
}

impl Outbox {
    /// Creates an empty outbox whose subscriber channels hold `buffer` envelopes.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            buffer: buffer.max(1),
            stats: OutboxStats::default(),
        }
    }

    /// Appends a notification and offers it to every subscriber.
    ///
    /// Never blocks on subscribers. Returns the assigned sequence.
    pub fn publish(&self, revision: u32, notification: Notification) -> u64 {
        let mut log = self.log.lock();
        let sequence = log.len() as u64;
        let envelope = Envelope {
            sequence,
            revision,
            notification,
        };

        // Fan out under the log lock so every channel sees sequence order.
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sender| match sender.try_send(envelope.clone()) {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    sequence,
                    game_id = envelope.game_id(),
                    "subscriber channel full, envelope left for replay"
                );
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("dropping disconnected subscriber");
                false
            }
        });
        drop(subscribers);

        log.push(envelope);
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        sequence
    }

    /// Registers a subscriber that receives every envelope published from
    /// now on.
    ///
    /// Returns the receiver and the sequence of the first envelope it will
    /// see; anything earlier is available through [`Outbox::since`].
    #[must_use]
    pub fn subscribe(&self) -> (Receiver<Envelope>, u64) {
        let log = self.log.lock();
        let (sender, receiver) = bounded(self.buffer);
        self.subscribers.lock().push(sender);
        (receiver, log.len() as u64)
    }

    /// Copies every envelope with `sequence >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<Envelope> {
        let log = self.log.lock();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(log.len());
        log[start..].to_vec()
    }

    /// Number of envelopes in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether nothing has been published yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Number of live subscriber channels.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> OutboxCounts {
        OutboxCounts {
            published: self.stats.published.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("len", &self.len())
            .field("subscribers", &self.subscriber_count())
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Side;

    fn moved(game_id: u64, board_index: u8) -> Notification {
        Notification::BoardUpdated {
            game_id,
            mover: Side::Challenger,
            board_index,
        }
    }

    #[test]
    fn test_publish_assigns_sequences() {
        let outbox = Outbox::new(8);
        assert!(outbox.is_empty());
        assert_eq!(outbox.publish(1, moved(0, 0)), 0);
        assert_eq!(outbox.publish(2, moved(0, 7)), 1);
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.since(1)[0].revision, 2);
        assert!(outbox.since(99).is_empty());
    }

    #[test]
    fn test_subscriber_receives_in_order() {
        let outbox = Outbox::new(8);
        outbox.publish(1, moved(0, 0));
        let (receiver, first) = outbox.subscribe();
        assert_eq!(first, 1);

        outbox.publish(1, moved(1, 3));
        outbox.publish(2, moved(1, 10));

        let a = receiver.try_recv().unwrap();
        let b = receiver.try_recv().unwrap();
        assert_eq!((a.sequence, b.sequence), (1, 2));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_full_subscriber_never_blocks() {
        let outbox = Outbox::new(1);
        let (receiver, _) = outbox.subscribe();

        for i in 0..5 {
            outbox.publish(i, moved(0, 0));
        }

        let stats = outbox.stats();
        assert_eq!(stats.published, 5);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.dropped, 4);

        // The subscriber recovers the rest from the log.
        let first = receiver.try_recv().unwrap();
        let replay = outbox.since(first.sequence + 1);
        assert_eq!(replay.len(), 4);
    }

    #[test]
    fn test_disconnected_subscriber_pruned() {
        let outbox = Outbox::new(4);
        let (receiver, _) = outbox.subscribe();
        assert_eq!(outbox.subscriber_count(), 1);
        drop(receiver);
        outbox.publish(1, moved(0, 0));
        assert_eq!(outbox.subscriber_count(), 0);
    }
}
