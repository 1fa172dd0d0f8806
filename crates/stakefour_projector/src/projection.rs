//! # Projection
//!
//! Notification-driven read model: one [`GameRecord`] per game, updated in
//! place as notifications arrive.
//!
//! The projection trusts the engine completely. It never rejects a
//! notification; it only skips ones it has already applied and ones that
//! refer to games it has never seen.

use std::collections::HashMap;

use alloy_primitives::Address;
use stakefour_engine::{Envelope, GameId, Notification, Side};

use crate::record::{GameRecord, RecordStatus};

/// What [`Projection::apply`] did with an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record was created or updated.
    Applied,
    /// The envelope's revision was already reflected; nothing changed.
    Duplicate,
    /// The envelope refers to a game with no record; nothing changed.
    UnknownGame,
}

/// In-memory read model of every game.
///
/// - O(1) lookup by id
/// - O(1) lookup by participant
#[derive(Debug)]
pub struct Projection {
    /// Records by game id.
    records: HashMap<GameId, GameRecord>,
    /// Game ids each address takes part in, in join order.
    participants: HashMap<Address, Vec<GameId>>,
    /// Envelopes that changed a record.
    applied: u64,
    /// Envelopes skipped as already applied.
    duplicates: u64,
    /// Envelopes skipped for unknown games.
    unknown: u64,
}

impl Projection {
    /// Creates an empty projection sized for `capacity` games.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            participants: HashMap::new(),
            applied: 0,
            duplicates: 0,
            unknown: 0,
        }
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Envelopes that changed a record.
    #[inline]
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Envelopes skipped as duplicates.
    #[inline]
    #[must_use]
    pub const fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Envelopes skipped because their game was unknown.
    #[inline]
    #[must_use]
    pub const fn unknown(&self) -> u64 {
        self.unknown
    }

    /// Record for game `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: GameId) -> Option<&GameRecord> {
        self.records.get(&id)
    }

    /// Record stored under `key` (see [`crate::record::record_key`]).
    #[must_use]
    pub fn get_by_key(&self, key: &str) -> Option<&GameRecord> {
        let id = key.parse::<GameId>().ok()?;
        self.records.get(&id).filter(|record| record.key == key)
    }

    /// Every record `address` plays in, oldest first.
    #[must_use]
    pub fn games_for(&self, address: &Address) -> Vec<&GameRecord> {
        self.participants
            .get(address)
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id)).collect())
            .unwrap_or_default()
    }

    /// All records ordered by id.
    #[must_use]
    pub fn records(&self) -> Vec<&GameRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_unstable_by_key(|record| record.game_id);
        records
    }

    /// Applies one envelope.
    pub fn apply(&mut self, envelope: &Envelope) -> ApplyOutcome {
        let outcome = self.apply_inner(envelope);
        match outcome {
            ApplyOutcome::Applied => self.applied += 1,
            ApplyOutcome::Duplicate => self.duplicates += 1,
            ApplyOutcome::UnknownGame => {
                self.unknown += 1;
                tracing::debug!(
                    game_id = envelope.game_id(),
                    sequence = envelope.sequence,
                    "notification for unknown game skipped"
                );
            }
        }
        outcome
    }

    fn apply_inner(&mut self, envelope: &Envelope) -> ApplyOutcome {
        if let Notification::GameInitialized {
            game_id,
            challenger,
            stake,
        } = envelope.notification
        {
            if self.records.contains_key(&game_id) {
                return ApplyOutcome::Duplicate;
            }
            let mut record = GameRecord::initialized(game_id, challenger, stake);
            record.last_revision = envelope.revision;
            self.records.insert(game_id, record);
            self.participants.entry(challenger).or_default().push(game_id);
            return ApplyOutcome::Applied;
        }

        let Some(record) = self.records.get_mut(&envelope.game_id()) else {
            return ApplyOutcome::UnknownGame;
        };
        if envelope.revision <= record.last_revision {
            return ApplyOutcome::Duplicate;
        }

        match envelope.notification {
            Notification::GameInitialized { .. } => return ApplyOutcome::Duplicate,
            Notification::GameStarted { game_id, opponent } => {
                record.opponent = opponent;
                record.status = RecordStatus::Started;
                record.next_player = record.challenger;
                if opponent != record.challenger {
                    self.participants.entry(opponent).or_default().push(game_id);
                }
            }
            Notification::BoardUpdated {
                mover, board_index, ..
            } => {
                record.moves.push(board_index);
                record.next_player = match mover {
                    Side::Challenger => record.opponent,
                    Side::Opponent => record.challenger,
                };
            }
            Notification::RewardClaimed { winner, .. } => {
                record.winner = winner;
                record.status = RecordStatus::Finished;
            }
        }
        record.last_revision = envelope.revision;
        ApplyOutcome::Applied
    }

    /// Applies a batch in order and returns how many were applied.
    pub fn process_batch<'a>(&mut self, envelopes: impl Iterator<Item = &'a Envelope>) -> usize {
        envelopes
            .filter(|envelope| self.apply(envelope) == ApplyOutcome::Applied)
            .count()
    }

    /// Clears all records and counters.
    pub fn clear(&mut self) {
        self.records.clear();
        self.participants.clear();
        self.applied = 0;
        self.duplicates = 0;
        self.unknown = 0;
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(1_024)
    }
}
