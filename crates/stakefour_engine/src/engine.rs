//! # Game Engine
//!
//! **The referee and the bank.** Every caller-facing operation goes through
//! here.
//!
//! ## Operation Pipeline
//!
//! ```text
//! caller ──▶ lookup handle ──▶ lock game ──▶ validate ──▶ ledger ──▶ commit ──▶ publish
//!                 │                              │           │                     │
//!            (map read lock,               (any error:   (checked,           (under the
//!             released at once)             nothing       all-or-nothing)     game lock)
//!                                           changed)
//! ```
//!
//! Publishing under the game lock is what keeps each game's notifications
//! in order. Lock order is always game, then ledger, then outbox.
//!
//! The ledger and the outbox log are each one process-wide mutex, so every
//! game funnels through them. Both are held only for a checked add or
//! subtract, or for a push plus non-blocking fan-out, and never across
//! board or claim logic. No thread ever holds two game locks.

use alloy_primitives::{Address, U256};
use crossbeam_channel::Receiver;

use crate::board::Placement;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::{Game, GameId, GameStatus};
use crate::ledger::Ledger;
use crate::line::Direction;
use crate::notification::{Envelope, Notification};
use crate::outbox::{Outbox, OutboxCounts};
use crate::store::GameStore;

/// The game-and-escrow state machine.
///
/// `GameEngine` is `Send + Sync`; share it behind an `Arc`.
///
/// ## Usage
///
/// ```rust,ignore
/// let engine = GameEngine::new(EngineConfig::default())?;
/// let id = engine.initialize_game(alice, stake)?;
/// engine.start_game(bob, id, stake)?;
/// engine.play_move(alice, id, 3)?;
/// // ...
/// let paid = engine.claim_reward(alice, id, alice_wallet, 0, 0, Direction::Right)?;
/// ```
#[derive(Debug)]
pub struct GameEngine {
    config: EngineConfig,
    store: GameStore,
    ledger: Ledger,
    outbox: Outbox,
}

impl GameEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`] if the config fails validation.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        tracing::info!(
            min_stake = config.min_stake,
            max_stake = config.max_stake,
            "game engine ready"
        );
        Ok(Self {
            outbox: Outbox::new(config.subscriber_buffer),
            config,
            store: GameStore::new(),
            ledger: Ledger::new(),
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates a game staked with `deposit` and returns its id.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidDeposit`] if `deposit` is zero or outside the
    /// configured bounds.
    pub fn initialize_game(&self, caller: Address, deposit: U256) -> EngineResult<GameId> {
        let (min, max) = (self.config.min_stake_wei(), self.config.max_stake_wei());
        if deposit.is_zero() || deposit < min || deposit > max {
            tracing::debug!(%caller, %deposit, "rejected initialize: invalid deposit");
            return Err(EngineError::InvalidDeposit { deposit, min, max });
        }
        self.ledger.lock(deposit)?;

        let id = self.store.allocate_id();
        self.store.insert_locked(Game::new(id, caller, deposit), |game| {
            self.publish(
                game,
                Notification::GameInitialized {
                    game_id: id,
                    challenger: caller,
                    stake: deposit,
                },
            );
        });

        tracing::info!(game_id = id, %caller, %deposit, "game initialized");
        Ok(id)
    }

    /// Joins game `id` as the opponent, matching its stake.
    ///
    /// # Errors
    ///
    /// [`EngineError::GameNotJoinable`], [`EngineError::SelfJoinForbidden`]
    /// or [`EngineError::StakeMismatch`].
    pub fn start_game(&self, caller: Address, id: GameId, deposit: U256) -> EngineResult<()> {
        let handle = self
            .store
            .handle(id)
            .ok_or(EngineError::GameNotJoinable(id))?;
        let mut game = handle.lock();

        let escrowed = game.check_join(caller, deposit).map_err(|e| {
            tracing::debug!(game_id = id, %caller, error = %e, "rejected start");
            e
        })?;
        self.ledger.lock(deposit)?;
        game.commit_join(caller, escrowed);
        self.publish(
            &mut game,
            Notification::GameStarted {
                game_id: id,
                opponent: caller,
            },
        );

        tracing::info!(game_id = id, opponent = %caller, pot = %escrowed, "game started");
        Ok(())
    }

    // ========================================================================
    // Moves
    // ========================================================================

    /// Drops a disc for `caller` into `column` of game `id`.
    ///
    /// Never declares a winner; see [`GameEngine::claim_reward`].
    ///
    /// # Errors
    ///
    /// [`EngineError::GameNotActive`], [`EngineError::NotYourTurn`],
    /// [`EngineError::ColumnOutOfRange`] or [`EngineError::ColumnFull`].
    pub fn play_move(&self, caller: Address, id: GameId, column: u8) -> EngineResult<Placement> {
        let handle = self
            .store
            .handle(id)
            .ok_or(EngineError::GameNotActive(id))?;
        let mut game = handle.lock();

        let (mover, placement) = game.play(caller, column).map_err(|e| {
            tracing::debug!(game_id = id, %caller, column, error = %e, "rejected move");
            e
        })?;
        self.publish(
            &mut game,
            Notification::BoardUpdated {
                game_id: id,
                mover,
                board_index: placement.board_index(),
            },
        );

        tracing::debug!(
            game_id = id,
            ?mover,
            row = placement.row,
            column = placement.column,
            "disc placed"
        );
        Ok(placement)
    }

    // ========================================================================
    // Win verification & payout
    // ========================================================================

    /// Verifies that `caller` owns the four cells starting at `(row, col)` in
    /// `direction`, then pays the whole pot to `recipient` and finishes the
    /// game. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// [`EngineError::GameNotActive`], [`EngineError::OutOfBounds`],
    /// [`EngineError::CellEmpty`] or [`EngineError::OwnerMismatch`].
    pub fn claim_reward(
        &self,
        caller: Address,
        id: GameId,
        recipient: Address,
        row: u8,
        col: u8,
        direction: Direction,
    ) -> EngineResult<U256> {
        let handle = self
            .store
            .handle(id)
            .ok_or(EngineError::GameNotActive(id))?;
        let mut game = handle.lock();

        let plan = game.check_claim(caller, row, col, direction).map_err(|e| {
            tracing::debug!(game_id = id, %caller, row, col, ?direction, error = %e, "rejected claim");
            e
        })?;
        self.ledger.release(recipient, plan.payout)?;
        game.commit_claim(&plan);
        self.publish(
            &mut game,
            Notification::RewardClaimed {
                game_id: id,
                winner: plan.winner,
                recipient,
                amount: plan.payout,
            },
        );

        tracing::info!(
            game_id = id,
            winner = %plan.winner,
            side = ?plan.side,
            %recipient,
            amount = %plan.payout,
            "reward claimed"
        );
        Ok(plan.payout)
    }

    /// Same as [`GameEngine::claim_reward`] with the direction given as its
    /// wire code.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidDirection`] for unknown codes, otherwise as
    /// [`GameEngine::claim_reward`].
    pub fn claim_reward_code(
        &self,
        caller: Address,
        id: GameId,
        recipient: Address,
        row: u8,
        col: u8,
        direction: u8,
    ) -> EngineResult<U256> {
        let direction = Direction::try_from(direction)?;
        self.claim_reward(caller, id, recipient, row, col, direction)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of game `id`. `None` means it doesn't exist.
    #[must_use]
    pub fn game(&self, id: GameId) -> Option<Game> {
        self.store.snapshot(id)
    }

    /// Status of game `id`. `None` means it doesn't exist.
    #[must_use]
    pub fn status(&self, id: GameId) -> Option<GameStatus> {
        self.store.handle(id).map(|handle| handle.lock().status())
    }

    /// Number of games created.
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.store.len()
    }

    /// Configured minimum stake.
    #[must_use]
    pub fn min_stake(&self) -> U256 {
        self.config.min_stake_wei()
    }

    /// Configured maximum stake.
    #[must_use]
    pub fn max_stake(&self) -> U256 {
        self.config.max_stake_wei()
    }

    /// Value held in escrow across all games.
    #[must_use]
    pub fn escrow_held(&self) -> U256 {
        self.ledger.held()
    }

    /// Total value paid out so far.
    #[must_use]
    pub fn paid_out(&self) -> U256 {
        self.ledger.paid_out()
    }

    /// Withdrawable payout balance of `address`.
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> U256 {
        self.ledger.balance_of(address)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Subscribes to notifications published from now on.
    ///
    /// Returns the receiver and the first sequence it will carry. Earlier
    /// envelopes can be replayed with [`GameEngine::notifications_since`].
    #[must_use]
    pub fn subscribe(&self) -> (Receiver<Envelope>, u64) {
        self.outbox.subscribe()
    }

    /// Every envelope with `sequence >= from`.
    #[must_use]
    pub fn notifications_since(&self, from: u64) -> Vec<Envelope> {
        self.outbox.since(from)
    }

    /// Outbox counters.
    #[must_use]
    pub fn outbox_stats(&self) -> OutboxCounts {
        self.outbox.stats()
    }

    /// Stamps the game's next revision on `notification` and publishes it.
    /// Must be called with the game locked.
    fn publish(&self, game: &mut Game, notification: Notification) {
        let revision = game.next_revision();
        self.outbox.publish(revision, notification);
    }
}
