//! # Board
//!
//! Fixed 7 × 6 grid with gravity-drop placement.
//!
//! ```text
//!  row 5 │ . . . . . . . │
//!  row 4 │ . . . . . . . │
//!  row 3 │ . . . . . . . │
//!  row 2 │ . . . . . . . │
//!  row 1 │ . . . X . . . │
//!  row 0 │ . . O X O . . │   <- discs land here first
//!        └───────────────┘
//!          0 1 2 3 4 5 6      column
//! ```
//!
//! Cells are write-once: a placed disc never moves or changes owner.
//! `column_fill` mirrors the occupancy of each column so legality checks
//! never walk the grid.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Number of columns.
pub const COLUMNS: usize = 7;

/// Number of rows.
pub const ROWS: usize = 6;

/// Total number of cells, and the exclusive upper bound of a board index.
pub const CELLS: usize = COLUMNS * ROWS;

/// One of the two participants of a game.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The participant who initialized the game. Moves first.
    Challenger = 1,
    /// The participant who joined the game.
    Opponent = 2,
}

impl Side {
    /// Returns the other side.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Challenger => Self::Opponent,
            Self::Opponent => Self::Challenger,
        }
    }
}

/// Contents of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// No disc.
    #[default]
    Empty,
    /// Disc owned by a side.
    Taken(Side),
}

/// Where an accepted disc came to rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Row the disc landed on (0 = bottom).
    pub row: u8,
    /// Column the disc was dropped into.
    pub column: u8,
}

impl Placement {
    /// Flattened cell coordinate: `row * 7 + column`, in `0..42`.
    #[inline]
    #[must_use]
    pub const fn board_index(self) -> u8 {
        self.row * COLUMNS as u8 + self.column
    }

    /// Inverse of [`Placement::board_index`].
    #[must_use]
    pub const fn from_board_index(index: u8) -> Option<Self> {
        if index as usize >= CELLS {
            return None;
        }
        Some(Self {
            row: index / COLUMNS as u8,
            column: index % COLUMNS as u8,
        })
    }
}

/// The game grid plus per-column fill counters.
///
/// Only [`Board::drop_disc`] changes a board, so the counters always match
/// the cells. Boards serialize for read models but are never parsed back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Cells indexed `[row][column]`.
    cells: [[Cell; COLUMNS]; ROWS],
    /// Discs placed in each column.
    column_fill: [u8; COLUMNS],
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `(row, column)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Discs currently stacked in `column` (0 for an invalid column).
    #[inline]
    #[must_use]
    pub fn column_fill(&self, column: usize) -> u8 {
        self.column_fill.get(column).copied().unwrap_or(0)
    }

    /// Per-column fill counters.
    #[inline]
    #[must_use]
    pub const fn column_fills(&self) -> &[u8; COLUMNS] {
        &self.column_fill
    }

    /// Total discs on the board.
    #[must_use]
    pub fn disc_count(&self) -> u32 {
        self.column_fill.iter().map(|&f| u32::from(f)).sum()
    }

    /// Checks that a disc may be dropped into `column` and returns where it
    /// would land. Does not mutate.
    ///
    /// # Errors
    ///
    /// [`EngineError::ColumnOutOfRange`] or [`EngineError::ColumnFull`].
    pub fn landing(&self, column: u8) -> EngineResult<Placement> {
        let fill = *self
            .column_fill
            .get(usize::from(column))
            .ok_or(EngineError::ColumnOutOfRange(column))?;
        if usize::from(fill) >= ROWS {
            return Err(EngineError::ColumnFull(column));
        }
        Ok(Placement { row: fill, column })
    }

    /// Drops a disc for `side` into `column`.
    ///
    /// # Errors
    ///
    /// Same as [`Board::landing`]; the board is untouched on error.
    pub fn drop_disc(&mut self, column: u8, side: Side) -> EngineResult<Placement> {
        let placement = self.landing(column)?;
        let (row, col) = (usize::from(placement.row), usize::from(placement.column));
        debug_assert_eq!(self.cells[row][col], Cell::Empty);
        self.cells[row][col] = Cell::Taken(side);
        self.column_fill[col] += 1;
        Ok(placement)
    }
}
