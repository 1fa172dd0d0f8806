//! # Engine Error Types
//!
//! Every rejected request maps to exactly one variant. None of them is
//! transient: retrying with identical arguments reproduces the same error.

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::game::GameId;

/// Errors that can occur in the game engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Deposit is zero or outside the configured stake bounds.
    #[error("invalid deposit {deposit}: must be within [{min}, {max}]")]
    InvalidDeposit {
        /// The rejected deposit.
        deposit: U256,
        /// Configured minimum stake.
        min: U256,
        /// Configured maximum stake.
        max: U256,
    },

    /// Game does not exist or is no longer waiting for an opponent.
    #[error("game {0} hasn't been initialized or was already started")]
    GameNotJoinable(GameId),

    /// The challenger tried to join their own game.
    #[error("{0} can't start the same game they initialized")]
    SelfJoinForbidden(Address),

    /// Opponent deposit differs from the challenger's stake.
    #[error("stake mismatch: expected {expected}, got {got}")]
    StakeMismatch {
        /// The stake fixed at initialization.
        expected: U256,
        /// The deposit that was sent.
        got: U256,
    },

    /// Game does not exist, hasn't started, or is already over.
    #[error("game {0} hasn't started, doesn't exist, or is already over")]
    GameNotActive(GameId),

    /// Caller is not the participant whose turn it is.
    #[error("not {0}'s turn")]
    NotYourTurn(Address),

    /// Column index outside the board.
    #[error("column {0} is out of range")]
    ColumnOutOfRange(u8),

    /// Column already holds a disc in every row.
    #[error("column {0} is full")]
    ColumnFull(u8),

    /// A cell of the claimed line lies outside the board.
    #[error("cell ({row}, {col}) is out of bounds")]
    OutOfBounds {
        /// Row of the first offending cell.
        row: i16,
        /// Column of the first offending cell.
        col: i16,
    },

    /// A cell of the claimed line holds no disc.
    #[error("cell ({row}, {col}) is empty")]
    CellEmpty {
        /// Row of the empty cell.
        row: u8,
        /// Column of the empty cell.
        col: u8,
    },

    /// The claimed line is mixed, or belongs to someone other than the caller.
    #[error("claimed discs are not all owned by {0}")]
    OwnerMismatch(Address),

    /// Unknown direction code.
    #[error("invalid direction code {0}")]
    InvalidDirection(u8),

    /// Checked escrow arithmetic overflowed.
    #[error("arithmetic overflow in escrow accounting")]
    ArithmeticOverflow,

    /// Invalid configuration file or values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
