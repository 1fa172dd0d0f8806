//! # Game Store
//!
//! Map from id to game with one lock per game.
//!
//! The map itself sits behind an `RwLock` that is only held long enough to
//! find or insert a handle. All game work happens under the game's own
//! `Mutex`, so operations on different ids never wait on each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::game::{Game, GameId};

/// Shared handle to one game's lock.
pub type GameHandle = Arc<Mutex<Game>>;

/// Indexed store of games with per-id locking.
#[derive(Debug, Default)]
pub struct GameStore {
    games: RwLock<HashMap<GameId, GameHandle>>,
    next_id: AtomicU64,
}

impl GameStore {
    /// Creates an empty store. The first id handed out is 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh id.
    pub fn allocate_id(&self) -> GameId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts a game while holding its lock, and runs `f` on it before any
    /// other caller can observe it. This is the only way into the store.
    pub fn insert_locked<R>(&self, game: Game, f: impl FnOnce(&mut Game) -> R) -> R {
        let id = game.id();
        let handle = Arc::new(Mutex::new(game));
        let mut guard = handle.lock();
        self.games.write().insert(id, Arc::clone(&handle));
        f(&mut guard)
    }

    /// Looks up the handle for `id`. `None` means the game doesn't exist.
    #[must_use]
    pub fn handle(&self, id: GameId) -> Option<GameHandle> {
        self.games.read().get(&id).cloned()
    }

    /// Copy of the game as it is right now.
    #[must_use]
    pub fn snapshot(&self, id: GameId) -> Option<Game> {
        self.handle(id).map(|handle| handle.lock().clone())
    }

    /// Number of games ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    /// Whether no game was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_ids_are_monotonic() {
        let store = GameStore::new();
        assert_eq!(store.allocate_id(), 0);
        assert_eq!(store.allocate_id(), 1);
        assert_eq!(store.allocate_id(), 2);
    }

    #[test]
    fn test_missing_game_is_none() {
        let store = GameStore::new();
        assert!(store.handle(0).is_none());
        assert!(store.snapshot(0).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_and_snapshot() {
        let store = GameStore::new();
        let id = store.allocate_id();
        store.insert_locked(Game::new(id, Address::repeat_byte(1), U256::from(2)), |_| ());

        let game = store.snapshot(id).unwrap();
        assert_eq!(game.stake(), U256::from(2));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(store.handle(id + 1).is_none());
    }

    #[test]
    fn test_insert_locked_runs_before_visible() {
        let store = GameStore::new();
        let id = store.allocate_id();
        let revision = store.insert_locked(
            Game::new(id, Address::repeat_byte(1), U256::from(2)),
            Game::next_revision,
        );
        assert_eq!(revision, 0);
        assert_eq!(store.snapshot(id).unwrap().revision(), 1);
    }
}
