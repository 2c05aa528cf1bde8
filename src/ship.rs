//! Ship definitions and per-ship hit tracking.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Coord, Grid};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Unit step along the ship's axis as `(dx, dy)`.
    pub fn step(self) -> (i16, i16) {
        match self {
            Orientation::Horizontal => (1, 0),
            Orientation::Vertical => (0, 1),
        }
    }
}

/// The five ship types of a standard fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    pub const fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "Carrier",
            ShipKind::Battleship => "Battleship",
            ShipKind::Cruiser => "Cruiser",
            ShipKind::Submarine => "Submarine",
            ShipKind::Destroyer => "Destroyer",
        }
    }

    /// Position of this kind in [`FLEET`](crate::config::FLEET).
    pub const fn slot(self) -> usize {
        match self {
            ShipKind::Carrier => 0,
            ShipKind::Battleship => 1,
            ShipKind::Cruiser => 2,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 4,
        }
    }

    /// Look a kind up by case-insensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        crate::config::FLEET
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a ship within its fleet.
pub type ShipId = u8;

/// A placed ship: its occupied cells in order from the origin and which of
/// them have been hit. Ships are only laid out by this crate and always
/// have at least one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ship {
    id: ShipId,
    kind: ShipKind,
    orientation: Orientation,
    cells: Vec<Coord>,
    hits: Vec<bool>,
}

impl Ship {
    /// Lay out `kind` from `origin` along `orientation`. Returns `None` when
    /// any cell would fall off the board.
    pub fn new(id: ShipId, kind: ShipKind, origin: Coord, orientation: Orientation) -> Option<Self> {
        let (dx, dy) = orientation.step();
        let cells = (0..kind.length() as i16)
            .map(|i| origin.offset(dx * i, dy * i))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_cells(id, kind, orientation, cells))
    }

    pub(crate) fn from_cells(
        id: ShipId,
        kind: ShipKind,
        orientation: Orientation,
        cells: Vec<Coord>,
    ) -> Self {
        let hits = vec![false; cells.len()];
        Ship {
            id,
            kind,
            orientation,
            cells,
            hits,
        }
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub fn kind(&self) -> ShipKind {
        self.kind
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn origin(&self) -> Coord {
        self.cells[0]
    }

    pub fn occupies(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    /// Occupancy mask of the ship.
    pub fn footprint(&self) -> Grid {
        // cells are in bounds by construction
        Grid::from_coords(self.cells.iter().copied()).unwrap_or_default()
    }

    /// Record a hit at `coord`. Returns `true` if the ship occupies it.
    pub fn register_hit(&mut self, coord: Coord) -> bool {
        match self.cells.iter().position(|&c| c == coord) {
            Some(i) => {
                self.hits[i] = true;
                true
            }
            None => false,
        }
    }

    pub fn is_hit_at(&self, coord: Coord) -> bool {
        self.cells
            .iter()
            .position(|&c| c == coord)
            .map(|i| self.hits[i])
            .unwrap_or(false)
    }

    /// Every segment hit.
    pub fn is_sunk(&self) -> bool {
        self.hits.iter().all(|&h| h)
    }

    pub fn hit_count(&self) -> usize {
        self.hits.iter().filter(|&&h| h).count()
    }
}
