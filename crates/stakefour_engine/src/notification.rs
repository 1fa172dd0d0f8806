//! # Notifications
//!
//! Immutable records of state changes, consumed by read-model projectors.
//! The schema of each variant is stable.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::board::Side;
use crate::game::GameId;

/// Notification kind discriminator.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A game was created.
    GameInitialized = 0,
    /// A game was joined.
    GameStarted = 1,
    /// A disc was placed.
    BoardUpdated = 2,
    /// A game was won and paid out.
    RewardClaimed = 3,
}

/// A state change emitted by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A game was created and the challenger's stake escrowed.
    GameInitialized {
        /// New game.
        game_id: GameId,
        /// Creator.
        challenger: Address,
        /// Stake each side deposits.
        stake: U256,
    },

    /// An opponent joined and matched the stake.
    GameStarted {
        /// Joined game.
        game_id: GameId,
        /// Joining participant.
        opponent: Address,
    },

    /// A disc was dropped.
    BoardUpdated {
        /// Game moved in.
        game_id: GameId,
        /// Side that moved.
        mover: Side,
        /// `row * 7 + column` of the placed disc.
        board_index: u8,
    },

    /// A four-in-a-row claim was verified and the pot released.
    RewardClaimed {
        /// Finished game.
        game_id: GameId,
        /// Participant who proved the line.
        winner: Address,
        /// Address credited with the pot.
        recipient: Address,
        /// Amount released.
        amount: U256,
    },
}

impl Notification {
    /// Returns the notification kind.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::GameInitialized { .. } => NotificationKind::GameInitialized,
            Self::GameStarted { .. } => NotificationKind::GameStarted,
            Self::BoardUpdated { .. } => NotificationKind::BoardUpdated,
            Self::RewardClaimed { .. } => NotificationKind::RewardClaimed,
        }
    }

    /// Returns the game this notification concerns.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        match self {
            Self::GameInitialized { game_id, .. }
            | Self::GameStarted { game_id, .. }
            | Self::BoardUpdated { game_id, .. }
            | Self::RewardClaimed { game_id, .. } => *game_id,
        }
    }
}

/// A notification as stored in the outbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Position in the outbox log. Strictly increasing.
    pub sequence: u64,
    /// Per-game counter: 0 for `GameInitialized`, then +1 per notification.
    pub revision: u32,
    /// The notification itself.
    pub notification: Notification,
}

impl Envelope {
    /// Shorthand for `self.notification.game_id()`.
    #[inline]
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.notification.game_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_game_id() {
        let notification = Notification::BoardUpdated {
            game_id: 12,
            mover: Side::Opponent,
            board_index: 40,
        };
        assert_eq!(notification.kind(), NotificationKind::BoardUpdated);
        assert_eq!(notification.game_id(), 12);

        let claimed = Notification::RewardClaimed {
            game_id: 3,
            winner: Address::repeat_byte(1),
            recipient: Address::repeat_byte(2),
            amount: U256::from(10),
        };
        assert_eq!(claimed.kind(), NotificationKind::RewardClaimed);
        assert_eq!(claimed.game_id(), 3);
    }
}
