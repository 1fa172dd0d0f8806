//! # STAKEFOUR Engine
//!
//! Referee, escrow and payout authority for staked four-in-a-row matches.
//!
//! Two participants each deposit the same stake, alternate dropping discs
//! into a 7 × 6 grid, and whoever proves a line of four takes the whole pot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          GameEngine                              │
//! │                                                                  │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐                │
//! │  │ GameStore  │   │   Ledger   │   │   Outbox   │──▶ subscribers │
//! │  │ (lock/game)│   │  (escrow)  │   │ (append)   │                │
//! │  └─────┬──────┘   └────────────┘   └────────────┘                │
//! │        │                                                         │
//! │  ┌─────▼──────┐   ┌────────────┐                                 │
//! │  │    Game    │──▶│   Board    │◀── line verification            │
//! │  └────────────┘   └────────────┘                                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **All-or-nothing** - a rejected request changes no state and emits nothing
//! 2. **Claims, not scans** - the engine only checks the line the caller names
//! 3. **Per-game ordering** - each game's notifications come out in the order applied
//! 4. **Non-blocking fan-out** - a stalled subscriber never holds up a move
//!
//! ## Example
//!
//! ```rust,ignore
//! use stakefour_engine::{Direction, EngineConfig, GameEngine};
//!
//! let engine = GameEngine::new(EngineConfig::load("data/config/engine.toml")?)?;
//! let id = engine.initialize_game(alice, stake)?;
//! engine.start_game(bob, id, stake)?;
//! engine.play_move(alice, id, 0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod ledger;
pub mod line;
pub mod notification;
pub mod outbox;
pub mod store;

pub use board::{Board, Cell, Placement, Side, CELLS, COLUMNS, ROWS};
pub use config::EngineConfig;
pub use engine::GameEngine;
pub use error::{EngineError, EngineResult};
pub use game::{ClaimPlan, Game, GameId, GameStatus};
pub use ledger::Ledger;
pub use line::{verify_line, Direction, LineFault, LINE_LENGTH};
pub use notification::{Envelope, Notification, NotificationKind};
pub use outbox::{Outbox, OutboxCounts};
pub use store::{GameHandle, GameStore};
