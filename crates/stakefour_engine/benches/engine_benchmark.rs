//! Benchmark for the engine hot paths.
//!
//! Run with: cargo bench --package stakefour_engine --bench engine_benchmark

use alloy_primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stakefour_engine::{verify_line, Board, Direction, EngineConfig, GameEngine, Side};

fn players() -> (Address, Address) {
    (Address::repeat_byte(0x11), Address::repeat_byte(0x22))
}

fn benchmark_verify_line(c: &mut Criterion) {
    let mut board = Board::new();
    for column in 0..4 {
        board.drop_disc(column, Side::Challenger).unwrap();
    }

    c.bench_function("verify_line_right", |b| {
        b.iter(|| verify_line(black_box(&board), 0, 0, black_box(Direction::Right)));
    });
}

fn benchmark_full_match(c: &mut Criterion) {
    let (p1, p2) = players();
    let engine = GameEngine::new(EngineConfig::default()).unwrap();

    let mut group = c.benchmark_group("match");
    group.throughput(Throughput::Elements(1));
    group.bench_function("init_start_seven_moves_claim", |b| {
        b.iter(|| {
            let id = engine.initialize_game(p1, U256::from(1)).unwrap();
            engine.start_game(p2, id, U256::from(1)).unwrap();
            for _ in 0..3 {
                engine.play_move(p1, id, 0).unwrap();
                engine.play_move(p2, id, 1).unwrap();
            }
            engine.play_move(p1, id, 0).unwrap();
            black_box(
                engine
                    .claim_reward(p1, id, p1, 0, 0, Direction::Up)
                    .unwrap(),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_verify_line, benchmark_full_match);
criterion_main!(benches);
