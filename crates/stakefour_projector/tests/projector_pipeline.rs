//! Engine to projector, end to end.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use parking_lot::RwLock;
use stakefour_engine::{Direction, EngineConfig, GameEngine};
use stakefour_projector::{Projection, ProjectorListener, RecordStatus};

fn player1() -> Address {
    Address::repeat_byte(0x11)
}

fn player2() -> Address {
    Address::repeat_byte(0x22)
}

fn engine() -> Arc<GameEngine> {
    Arc::new(GameEngine::new(EngineConfig::default()).unwrap())
}

#[test]
fn test_record_follows_a_match() {
    let engine = engine();
    let projection = Arc::new(RwLock::new(Projection::default()));
    let mut listener = ProjectorListener::attach(Arc::clone(&engine), Arc::clone(&projection));

    let id = engine.initialize_game(player1(), U256::from(3)).unwrap();
    listener.poll();
    {
        let view = projection.read();
        let record = view.get_by_key("00000").unwrap();
        assert_eq!(record.status, RecordStatus::Initialized);
        assert_eq!(record.opponent, Address::ZERO);
        assert_eq!(record.stake, U256::from(3));
    }

    engine.start_game(player2(), id, U256::from(3)).unwrap();
    for column in [2, 4, 2, 4, 2, 4, 2] {
        let player = engine.game(id).unwrap().turn_owner().unwrap();
        engine.play_move(player, id, column).unwrap();
    }
    listener.poll();
    {
        let view = projection.read();
        let record = view.get(id).unwrap();
        assert_eq!(record.status, RecordStatus::Started);
        assert_eq!(record.moves, vec![2, 4, 9, 11, 16, 18, 23]);
        assert_eq!(record.next_player, player2());
        assert_eq!(record.winner, Address::ZERO);
    }

    engine
        .claim_reward(player1(), id, player1(), 0, 2, Direction::Up)
        .unwrap();
    listener.poll();

    let view = projection.read();
    let record = view.get(id).unwrap();
    assert_eq!(record.status, RecordStatus::Finished);
    assert_eq!(record.winner, player1());
    assert_eq!(view.games_for(&player2()).len(), 1);
    assert_eq!(view.applied(), 10);
}

#[test]
fn test_replayed_history_is_idempotent() {
    let engine = engine();
    let id = engine.initialize_game(player1(), U256::from(1)).unwrap();
    engine.start_game(player2(), id, U256::from(1)).unwrap();
    engine.play_move(player1(), id, 0).unwrap();

    let mut projection = Projection::default();
    let history = engine.notifications_since(0);
    assert_eq!(projection.process_batch(history.iter()), 3);
    assert_eq!(projection.process_batch(history.iter()), 0);
    assert_eq!(projection.duplicates(), 3);
    assert_eq!(projection.get(id).unwrap().moves, vec![0]);
}

#[test]
fn test_listener_thread_converges() {
    let engine = engine();
    let projection = Arc::new(RwLock::new(Projection::default()));
    let mut listener = ProjectorListener::attach(Arc::clone(&engine), Arc::clone(&projection));
    let handle = listener.handle();

    let worker = thread::spawn(move || listener.run(Duration::from_millis(5)));

    for seat in 1..=20u8 {
        let challenger = Address::repeat_byte(seat);
        let id = engine.initialize_game(challenger, U256::from(2)).unwrap();
        engine.start_game(player2(), id, U256::from(2)).unwrap();
    }

    // Wait for the projection to see every game started.
    for _ in 0..400 {
        let started = projection
            .read()
            .records()
            .iter()
            .filter(|r| r.status == RecordStatus::Started)
            .count();
        if started == 20 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    handle.stop();
    worker.join().unwrap();

    let view = projection.read();
    assert_eq!(view.len(), 20);
    assert_eq!(view.games_for(&player2()).len(), 20);
    assert!(view.records().iter().all(|r| r.status == RecordStatus::Started));
    assert!(!handle.is_running());
}
