//! # Game Records
//!
//! The denormalized per-game row the projector maintains. Fields that have
//! no value yet hold the zero address, so a record always has the same shape.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use stakefour_engine::GameId;

/// Width of the zero-padded record key.
pub const KEY_WIDTH: usize = 5;

/// Record key for a game id: the decimal id left-padded with zeros to
/// [`KEY_WIDTH`] digits. Longer ids are not truncated.
#[must_use]
pub fn record_key(id: GameId) -> String {
    format!("{id:0width$}", width = KEY_WIDTH)
}

/// Read-model status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Waiting for an opponent.
    Initialized,
    /// Being played.
    Started,
    /// Won and paid out.
    Finished,
}

impl RecordStatus {
    /// Lower-case name, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One game as seen by the read model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Zero-padded key, see [`record_key`].
    pub key: String,
    /// Engine id.
    pub game_id: GameId,
    /// Stake each side deposited.
    pub stake: U256,
    /// Creator.
    pub challenger: Address,
    /// Joiner, or zero before start.
    pub opponent: Address,
    /// Current status.
    pub status: RecordStatus,
    /// Board index of every accepted move, in order.
    pub moves: Vec<u8>,
    /// Identity expected to move next, or zero.
    pub next_player: Address,
    /// Winner, or zero until finished.
    pub winner: Address,
    /// Revision of the last notification applied.
    pub last_revision: u32,
}

impl GameRecord {
    /// Fresh record for a just-initialized game.
    #[must_use]
    pub fn initialized(game_id: GameId, challenger: Address, stake: U256) -> Self {
        Self {
            key: record_key(game_id),
            game_id,
            stake,
            challenger,
            opponent: Address::ZERO,
            status: RecordStatus::Initialized,
            moves: Vec::new(),
            next_player: Address::ZERO,
            winner: Address::ZERO,
            last_revision: 0,
        }
    }

    /// Whether `address` plays in this game.
    #[must_use]
    pub fn involves(&self, address: &Address) -> bool {
        *address != Address::ZERO && (self.challenger == *address || self.opponent == *address)
    }
}
