//! Common types: coordinates, sides, shot outcomes and the command-boundary
//! error taxonomy.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitboard::{BitBoard, BitBoardError};
use crate::config::BOARD_SIZE;
use crate::session::SessionStatus;
use crate::ship::ShipKind;

/// Cell mask sized for the game board.
pub type Grid = BitBoard<u128, BOARD_SIZE>;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A board coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Builds a coordinate from signed components, `None` when off the board.
    pub fn checked(x: i16, y: i16) -> Option<Self> {
        let size = BOARD_SIZE as i16;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Some(Self::new(x as u8, y as u8))
        } else {
            None
        }
    }

    pub fn in_bounds(&self) -> bool {
        (self.x as usize) < BOARD_SIZE && (self.y as usize) < BOARD_SIZE
    }

    /// Offset by `(dx, dy)`, `None` when the result leaves the board.
    pub fn offset(&self, dx: i16, dy: i16) -> Option<Self> {
        Self::checked(self.x as i16 + dx, self.y as i16 + dy)
    }

    /// In-bounds orthogonal neighbours.
    pub fn neighbors4(&self) -> impl Iterator<Item = Coord> {
        let origin = *self;
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .filter_map(move |(dx, dy)| origin.offset(dx, dy))
    }

    /// In-bounds neighbours including diagonals.
    pub fn neighbors8(&self) -> impl Iterator<Item = Coord> {
        let origin = *self;
        (-1i16..=1)
            .flat_map(|dy| (-1i16..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| origin.offset(dx, dy))
    }

    /// Parse a board label such as `B5` (column letter, 1-based row).
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let mut chars = label.chars();
        let col = chars.next()?.to_ascii_uppercase();
        if !col.is_ascii_uppercase() {
            return None;
        }
        let row: u8 = chars.as_str().parse().ok()?;
        let coord = Coord::new(col as u8 - b'A', row.checked_sub(1)?);
        coord.in_bounds().then_some(coord)
    }

    /// Every coordinate on the board, row-major.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE as u8).flat_map(|y| (0..BOARD_SIZE as u8).map(move |x| Coord::new(x, y)))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.x) as char, self.y + 1)
    }
}

/// One of the two seats in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

/// Result of a resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "ship")]
pub enum ShotOutcome {
    Miss,
    Hit,
    /// The shot hit the last intact cell of a ship.
    Sunk(ShipKind),
}

impl ShotOutcome {
    /// Hit or sunk.
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }
}

/// Errors returned by board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    BitBoard(#[from] BitBoardError),
    #[error("cell {0} was already targeted")]
    AlreadyTargeted(Coord),
    #[error("board is frozen")]
    Frozen,
}

/// Why a command was refused. A rejected command never mutates state, so
/// callers can present these as disabled actions rather than failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("session is {0:?}, command not allowed")]
    WrongStatus(SessionStatus),
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("it is not this side's turn")]
    NotYourTurn,
    #[error("cell {0} was already targeted")]
    AlreadyTargeted(Coord),
    #[error("coordinate ({x}, {y}) is off the board")]
    OutOfBounds { x: u8, y: u8 },
    #[error("fleet is incomplete or violates the no-touch rule")]
    InvalidFleet,
    #[error("fleet was already submitted")]
    AlreadySubmitted,
    #[error("ship cannot be placed there")]
    IllegalPlacement,
    #[error("side is controlled by the engine")]
    NotLocalSide,
    #[error("game end is being processed")]
    EndPending,
    #[error("not connected to the session authority")]
    Disconnected,
    #[error("session was torn down")]
    TornDown,
}

impl From<BoardError> for Rejection {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::BitBoard(BitBoardError::OutOfBounds { x, y }) => {
                Rejection::OutOfBounds { x, y }
            }
            BoardError::AlreadyTargeted(coord) => Rejection::AlreadyTargeted(coord),
            BoardError::Frozen => Rejection::WrongStatus(SessionStatus::Completed),
        }
    }
}
