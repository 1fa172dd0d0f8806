//! Scripted winning matches.

use alloy_primitives::{Address, U256};
use stakefour_engine::{Direction, EngineResult, GameEngine, GameId};

/// A move sequence that ends with the challenger holding four in a row.
#[derive(Clone, Copy, Debug)]
pub struct Script {
    /// Short label for logs.
    pub name: &'static str,
    /// Columns played alternately, challenger first.
    pub columns: &'static [u8],
    /// Anchor row of the winning line.
    pub row: u8,
    /// Anchor column of the winning line.
    pub col: u8,
    /// Direction of the winning line.
    pub direction: Direction,
}

/// One script per direction.
pub const SCRIPTS: [Script; 4] = [
    Script {
        name: "right",
        columns: &[0, 5, 1, 5, 2, 5, 3],
        row: 0,
        col: 0,
        direction: Direction::Right,
    },
    Script {
        name: "up",
        columns: &[0, 5, 0, 5, 0, 5, 0],
        row: 0,
        col: 0,
        direction: Direction::Up,
    },
    Script {
        name: "left-diagonal",
        columns: &[5, 4, 4, 3, 3, 1, 3, 2, 2, 2, 2],
        row: 0,
        col: 5,
        direction: Direction::LeftDiagonal,
    },
    Script {
        name: "right-diagonal",
        columns: &[0, 1, 1, 2, 2, 5, 2, 3, 3, 3, 3],
        row: 0,
        col: 0,
        direction: Direction::RightDiagonal,
    },
];

/// Plays `script` from initialization to payout and returns the game id and
/// the amount paid to the challenger.
pub fn play(
    engine: &GameEngine,
    script: &Script,
    challenger: Address,
    opponent: Address,
    stake: U256,
) -> EngineResult<(GameId, U256)> {
    let id = engine.initialize_game(challenger, stake)?;
    engine.start_game(opponent, id, stake)?;

    for (i, &column) in script.columns.iter().enumerate() {
        let mover = if i % 2 == 0 { challenger } else { opponent };
        engine.play_move(mover, id, column)?;
    }

    let paid = engine.claim_reward(
        challenger,
        id,
        challenger,
        script.row,
        script.col,
        script.direction,
    )?;
    Ok((id, paid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakefour_engine::{EngineConfig, GameStatus};

    #[test]
    fn test_every_script_wins() {
        let engine = GameEngine::new(EngineConfig::default()).unwrap();
        let (a, b) = (Address::repeat_byte(1), Address::repeat_byte(2));

        for script in &SCRIPTS {
            let (id, paid) = play(&engine, script, a, b, U256::from(10)).unwrap();
            assert_eq!(paid, U256::from(20), "{}", script.name);
            assert_eq!(engine.status(id), Some(GameStatus::Finished));
        }
        assert_eq!(engine.escrow_held(), U256::ZERO);
    }
}
