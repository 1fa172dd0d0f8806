//! # Game Record
//!
//! One staked match. The record enforces its own transition rules; the
//! engine decides when to touch the ledger and the outbox around them.
//!
//! ```text
//!  (absent) ──initialize──▶ Initialized ──start──▶ Started ──claim──▶ Finished
//! ```
//!
//! Transitions only ever move right. A missing record is the "nonexistent"
//! state; nothing here synthesizes a default game.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Placement, Side};
use crate::error::{EngineError, EngineResult};
use crate::line::{verify_line, Direction, LineFault};

/// Unique, monotonically assigned game identifier.
pub type GameId = u64;

/// Stored lifecycle status.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for an opponent.
    Initialized = 1,
    /// Both stakes escrowed, moves being played.
    Started = 2,
    /// Pot paid out. Terminal.
    Finished = 3,
}

impl GameStatus {
    /// Lower-case name used by read models.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }
}

/// A validated claim, ready to be paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimPlan {
    /// Side that owns the verified line.
    pub side: Side,
    /// Identity of the winner (always the claimant).
    pub winner: Address,
    /// Full pot to release.
    pub payout: U256,
}

/// A single staked game. Read out as snapshots; never rebuilt from data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Game {
    id: GameId,
    stake: U256,
    challenger: Address,
    opponent: Option<Address>,
    status: GameStatus,
    turn: Side,
    board: Board,
    escrowed: U256,
    winner: Option<Address>,
    revision: u32,
}

impl Game {
    /// Creates a freshly initialized game with the challenger's stake escrowed.
    #[must_use]
    pub fn new(id: GameId, challenger: Address, stake: U256) -> Self {
        Self {
            id,
            stake,
            challenger,
            opponent: None,
            status: GameStatus::Initialized,
            turn: Side::Challenger,
            board: Board::new(),
            escrowed: stake,
            winner: None,
            revision: 0,
        }
    }

    /// Game identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> GameId {
        self.id
    }

    /// Stake each side deposits.
    #[inline]
    #[must_use]
    pub const fn stake(&self) -> U256 {
        self.stake
    }

    /// Participant who created the game.
    #[inline]
    #[must_use]
    pub const fn challenger(&self) -> Address {
        self.challenger
    }

    /// Participant who joined, once started.
    #[inline]
    #[must_use]
    pub const fn opponent(&self) -> Option<Address> {
        self.opponent
    }

    /// Current lifecycle status.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Side to move next. Meaningful only while started.
    #[inline]
    #[must_use]
    pub const fn turn(&self) -> Side {
        self.turn
    }

    /// The board.
    #[inline]
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Funds currently held for this game.
    #[inline]
    #[must_use]
    pub const fn escrowed(&self) -> U256 {
        self.escrowed
    }

    /// Winner, once finished.
    #[inline]
    #[must_use]
    pub const fn winner(&self) -> Option<Address> {
        self.winner
    }

    /// Discs placed so far.
    #[must_use]
    pub fn move_count(&self) -> u32 {
        self.board.disc_count()
    }

    /// Notifications emitted for this game so far.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u32 {
        self.revision
    }

    /// Identity playing `side`, if seated.
    #[must_use]
    pub const fn participant(&self, side: Side) -> Option<Address> {
        match side {
            Side::Challenger => Some(self.challenger),
            Side::Opponent => self.opponent,
        }
    }

    /// Identity whose turn it is, while started.
    #[must_use]
    pub fn turn_owner(&self) -> Option<Address> {
        match self.status {
            GameStatus::Started => self.participant(self.turn),
            _ => None,
        }
    }

    /// Validates a join request and returns the escrow total after it.
    ///
    /// # Errors
    ///
    /// `GameNotJoinable`, `SelfJoinForbidden`, `StakeMismatch` or
    /// `ArithmeticOverflow`, checked in that order.
    pub fn check_join(&self, caller: Address, deposit: U256) -> EngineResult<U256> {
        if self.status != GameStatus::Initialized {
            return Err(EngineError::GameNotJoinable(self.id));
        }
        if caller == self.challenger {
            return Err(EngineError::SelfJoinForbidden(caller));
        }
        if deposit != self.stake {
            return Err(EngineError::StakeMismatch {
                expected: self.stake,
                got: deposit,
            });
        }
        self.escrowed
            .checked_add(deposit)
            .ok_or(EngineError::ArithmeticOverflow)
    }

    /// Seats the opponent. Call only after [`Game::check_join`] succeeded.
    pub(crate) fn commit_join(&mut self, opponent: Address, escrowed: U256) {
        self.opponent = Some(opponent);
        self.status = GameStatus::Started;
        self.turn = Side::Challenger;
        self.escrowed = escrowed;
    }

    /// Plays a move for `caller`, returning the mover's side and placement.
    ///
    /// # Errors
    ///
    /// `GameNotActive`, `NotYourTurn`, `ColumnOutOfRange` or `ColumnFull`.
    /// The game is untouched on error.
    pub(crate) fn play(&mut self, caller: Address, column: u8) -> EngineResult<(Side, Placement)> {
        if self.status != GameStatus::Started {
            return Err(EngineError::GameNotActive(self.id));
        }
        let mover = self.turn;
        if self.participant(mover) != Some(caller) {
            return Err(EngineError::NotYourTurn(caller));
        }
        let placement = self.board.drop_disc(column, mover)?;
        self.turn = mover.other();
        Ok((mover, placement))
    }

    /// Verifies a four-in-a-row claim without changing anything.
    ///
    /// # Errors
    ///
    /// `GameNotActive`, `OutOfBounds`, `CellEmpty` or `OwnerMismatch`.
    pub fn check_claim(
        &self,
        caller: Address,
        row: u8,
        col: u8,
        direction: Direction,
    ) -> EngineResult<ClaimPlan> {
        if self.status != GameStatus::Started {
            return Err(EngineError::GameNotActive(self.id));
        }
        let side = verify_line(&self.board, row, col, direction).map_err(|fault| match fault {
            LineFault::OutOfBounds { row, col } => EngineError::OutOfBounds { row, col },
            LineFault::Empty { row, col } => EngineError::CellEmpty { row, col },
            LineFault::Mixed => EngineError::OwnerMismatch(caller),
        })?;
        if self.participant(side) != Some(caller) {
            return Err(EngineError::OwnerMismatch(caller));
        }
        Ok(ClaimPlan {
            side,
            winner: caller,
            payout: self.escrowed,
        })
    }

    /// Closes the game. Call only after the payout was released.
    pub(crate) fn commit_claim(&mut self, plan: &ClaimPlan) {
        self.status = GameStatus::Finished;
        self.escrowed = U256::ZERO;
        self.winner = Some(plan.winner);
    }

    /// Returns the revision for the next notification and advances it.
    pub(crate) fn next_revision(&mut self) -> u32 {
        let revision = self.revision;
        self.revision += 1;
        revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ALICE: Address = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");
    const BOB: Address = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");

    fn started() -> Game {
        let mut game = Game::new(0, ALICE, U256::from(5));
        let escrow = game.check_join(BOB, U256::from(5)).unwrap();
        game.commit_join(BOB, escrow);
        game
    }

    #[test]
    fn test_new_game() {
        let game = Game::new(7, ALICE, U256::from(3));
        assert_eq!(game.status(), GameStatus::Initialized);
        assert_eq!(game.escrowed(), U256::from(3));
        assert_eq!(game.opponent(), None);
        assert_eq!(game.turn_owner(), None);
        assert_eq!(game.board().disc_count(), 0);
    }

    #[test]
    fn test_join_checks_in_order() {
        let game = Game::new(1, ALICE, U256::from(5));
        assert_eq!(
            game.check_join(ALICE, U256::from(4)),
            Err(EngineError::SelfJoinForbidden(ALICE))
        );
        assert_eq!(
            game.check_join(BOB, U256::from(4)),
            Err(EngineError::StakeMismatch {
                expected: U256::from(5),
                got: U256::from(4)
            })
        );
        assert_eq!(game.check_join(BOB, U256::from(5)), Ok(U256::from(10)));
    }

    #[test]
    fn test_started_game_not_joinable() {
        let game = started();
        assert_eq!(
            game.check_join(Address::repeat_byte(3), U256::from(5)),
            Err(EngineError::GameNotJoinable(0))
        );
        assert_eq!(game.turn_owner(), Some(ALICE));
        assert_eq!(game.escrowed(), U256::from(10));
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = started();
        assert_eq!(game.play(BOB, 0), Err(EngineError::NotYourTurn(BOB)));
        let (side, placement) = game.play(ALICE, 0).unwrap();
        assert_eq!(side, Side::Challenger);
        assert_eq!(placement.board_index(), 0);
        assert_eq!(game.turn_owner(), Some(BOB));
        assert_eq!(game.play(ALICE, 1), Err(EngineError::NotYourTurn(ALICE)));
        let (side, placement) = game.play(BOB, 0).unwrap();
        assert_eq!(side, Side::Opponent);
        assert_eq!(placement.board_index(), 7);
        assert_eq!(game.move_count(), 2);
    }

    #[test]
    fn test_rejected_move_keeps_turn() {
        let mut game = started();
        assert_eq!(game.play(ALICE, 9), Err(EngineError::ColumnOutOfRange(9)));
        assert_eq!(game.turn_owner(), Some(ALICE));
    }

    #[test]
    fn test_play_before_start() {
        let mut game = Game::new(4, ALICE, U256::from(1));
        assert_eq!(game.play(ALICE, 0), Err(EngineError::GameNotActive(4)));
    }

    #[test]
    fn test_claim_opponents_line_rejected() {
        let mut game = started();
        for _ in 0..3 {
            game.play(ALICE, 0).unwrap();
            game.play(BOB, 1).unwrap();
        }
        game.play(ALICE, 0).unwrap();

        assert_eq!(
            game.check_claim(BOB, 0, 0, Direction::Up),
            Err(EngineError::OwnerMismatch(BOB))
        );
        let plan = game.check_claim(ALICE, 0, 0, Direction::Up).unwrap();
        assert_eq!(plan.side, Side::Challenger);
        assert_eq!(plan.payout, U256::from(10));

        game.commit_claim(&plan);
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.escrowed(), U256::ZERO);
        assert_eq!(game.winner(), Some(ALICE));
        assert_eq!(
            game.check_claim(ALICE, 0, 0, Direction::Up),
            Err(EngineError::GameNotActive(0))
        );
    }

    #[test]
    fn test_revision_counter() {
        let mut game = Game::new(0, ALICE, U256::from(1));
        assert_eq!(game.next_revision(), 0);
        assert_eq!(game.next_revision(), 1);
        assert_eq!(game.revision(), 2);
    }
}
