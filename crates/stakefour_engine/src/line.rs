//! # Four-in-a-Row Verification
//!
//! The engine never searches the board for a winner. A claimant names an
//! anchor cell and a direction; we check exactly the four cells that line
//! covers. Cost is constant no matter how full the board is.
//!
//! ```text
//!   LeftDiagonal   Up   RightDiagonal
//!           ↖      ↑      ↗
//!                anchor ──→ Right
//! ```

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Side, COLUMNS, ROWS};
use crate::error::{EngineError, EngineResult};

/// Number of consecutive discs that make a win.
pub const LINE_LENGTH: usize = 4;

/// Direction in which a claimed line extends from its anchor.
///
/// Discriminants are the wire codes accepted by
/// [`crate::GameEngine::claim_reward_code`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Up and to the left: `(+1, -1)`.
    LeftDiagonal = 0,
    /// Straight up: `(+1, 0)`.
    Up = 1,
    /// Up and to the right: `(+1, +1)`.
    RightDiagonal = 2,
    /// Along the row: `(0, +1)`.
    Right = 3,
}

impl Direction {
    /// All directions, in wire-code order.
    pub const ALL: [Self; 4] = [
        Self::LeftDiagonal,
        Self::Up,
        Self::RightDiagonal,
        Self::Right,
    ];

    /// Unit step as `(Δrow, Δcol)`.
    #[inline]
    #[must_use]
    pub const fn step(self) -> (i16, i16) {
        match self {
            Self::LeftDiagonal => (1, -1),
            Self::Up => (1, 0),
            Self::RightDiagonal => (1, 1),
            Self::Right => (0, 1),
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = EngineError;

    fn try_from(code: u8) -> EngineResult<Self> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(EngineError::InvalidDirection(code))
    }
}

/// Why a line failed to verify, before identities are known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineFault {
    /// Cell outside the grid.
    OutOfBounds {
        /// Row of the offending cell.
        row: i16,
        /// Column of the offending cell.
        col: i16,
    },
    /// Cell with no disc.
    Empty {
        /// Row of the empty cell.
        row: u8,
        /// Column of the empty cell.
        col: u8,
    },
    /// Cells owned by both sides.
    Mixed,
}

/// Computes the four cells of a claimed line.
///
/// # Errors
///
/// [`LineFault::OutOfBounds`] naming the first cell that leaves the grid.
pub fn line_cells(
    row: u8,
    col: u8,
    direction: Direction,
) -> Result<[(u8, u8); LINE_LENGTH], LineFault> {
    let (d_row, d_col) = direction.step();
    let mut cells = [(0u8, 0u8); LINE_LENGTH];
    for (i, slot) in (0i16..).zip(cells.iter_mut()) {
        let r = i16::from(row) + i * d_row;
        let c = i16::from(col) + i * d_col;
        let in_rows = usize::try_from(r).map_or(false, |r| r < ROWS);
        let in_cols = usize::try_from(c).map_or(false, |c| c < COLUMNS);
        if !(in_rows && in_cols) {
            return Err(LineFault::OutOfBounds { row: r, col: c });
        }
        // Both fit in u8 after the bounds check.
        *slot = (r as u8, c as u8);
    }
    Ok(cells)
}

/// Verifies that the four cells starting at `(row, col)` in `direction` are
/// all owned by the same side, and returns that side.
///
/// Every cell is bounds-checked before any is read, then emptiness is
/// checked for all four before ownership is compared.
///
/// # Errors
///
/// A [`LineFault`] describing the first failed check.
pub fn verify_line(
    board: &Board,
    row: u8,
    col: u8,
    direction: Direction,
) -> Result<Side, LineFault> {
    let cells = line_cells(row, col, direction)?;

    let mut owners = [Side::Challenger; LINE_LENGTH];
    for (owner, &(r, c)) in owners.iter_mut().zip(cells.iter()) {
        match board.cell(usize::from(r), usize::from(c)) {
            Some(Cell::Taken(side)) => *owner = side,
            _ => return Err(LineFault::Empty { row: r, col: c }),
        }
    }

    let first = owners[0];
    if owners.iter().all(|&side| side == first) {
        Ok(first)
    } else {
        Err(LineFault::Mixed)
    }
}
