//! Per-side board: the canonical record of ships and shots. Grid views and
//! targeting views are derived from it on demand.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{BoardError, Coord, Grid, ShotOutcome};
use crate::config::{BOARD_SIZE, FLEET};
use crate::placement::Fleet;
use crate::ship::{Ship, ShipId, ShipKind};

/// State of a single cell as seen by the board's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "ship")]
pub enum Cell {
    Empty,
    Ship(ShipId),
    Hit,
    Miss,
}

/// What a shooter may know about the opposing board: where it has hit and
/// missed, which cells belong to ships it has sunk, and the lengths of ships
/// still afloat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetingView {
    pub hits: Grid,
    pub misses: Grid,
    pub sunk: Grid,
    pub remaining: Vec<usize>,
}

impl TargetingView {
    /// A view with no shots taken and the whole fleet afloat.
    pub fn fresh() -> Self {
        Self {
            hits: Grid::new(),
            misses: Grid::new(),
            sunk: Grid::new(),
            remaining: FLEET.iter().map(|k| k.length()).collect(),
        }
    }

    pub fn targeted(&self) -> Grid {
        self.hits | self.misses
    }

    pub fn is_targeted(&self, coord: Coord) -> bool {
        self.hits.contains(coord) || self.misses.contains(coord)
    }

    /// Hits not yet attributed to a sunk ship.
    pub fn unresolved_hits(&self) -> Grid {
        self.hits & !self.sunk
    }

    /// Every cell not yet fired at.
    pub fn untargeted(&self) -> Vec<Coord> {
        (!self.targeted()).iter().collect()
    }
}

/// One side's board. When the fleet is unknown (a remote opponent) the board
/// only records reported shot results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    ships: Vec<Ship>,
    hits: Grid,
    misses: Grid,
    sunk_cells: Grid,
    sunk: Vec<ShipKind>,
    frozen: bool,
}

impl Board {
    /// Empty board with no ships.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fleet. Only allowed before the first shot.
    pub fn set_fleet(&mut self, fleet: &Fleet) -> Result<(), BoardError> {
        if self.frozen || !(self.hits | self.misses).is_empty() {
            return Err(BoardError::Frozen);
        }
        self.ships = fleet.to_vec();
        Ok(())
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id() == id)
    }

    /// Whether ship `id` has been sunk.
    pub fn is_sunk(&self, id: ShipId) -> bool {
        self.ship(id).map_or(false, Ship::is_sunk)
    }

    pub fn has_fleet(&self) -> bool {
        !self.ships.is_empty()
    }

    pub fn cell(&self, coord: Coord) -> Cell {
        if self.hits.contains(coord) {
            Cell::Hit
        } else if self.misses.contains(coord) {
            Cell::Miss
        } else {
            match self.ships.iter().find(|s| s.occupies(coord)) {
                Some(ship) => Cell::Ship(ship.id()),
                None => Cell::Empty,
            }
        }
    }

    pub fn is_targeted(&self, coord: Coord) -> bool {
        self.hits.contains(coord) || self.misses.contains(coord)
    }

    pub fn hits(&self) -> Grid {
        self.hits
    }

    pub fn misses(&self) -> Grid {
        self.misses
    }

    /// Kinds sunk so far, in the order they went down.
    pub fn sunk_kinds(&self) -> &[ShipKind] {
        &self.sunk
    }

    /// Kinds still afloat.
    pub fn remaining_kinds(&self) -> Vec<ShipKind> {
        FLEET
            .iter()
            .copied()
            .filter(|k| !self.sunk.contains(k))
            .collect()
    }

    pub fn all_sunk(&self) -> bool {
        if self.has_fleet() {
            self.ships.iter().all(Ship::is_sunk)
        } else {
            self.sunk.len() == FLEET.len()
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Make the board immutable.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Resolve a shot at `coord` against the fleet. Hit detection and the
    /// sunk check happen in the same pass; sunk supersedes hit.
    pub fn fire(&mut self, coord: Coord) -> Result<ShotOutcome, BoardError> {
        if self.frozen {
            return Err(BoardError::Frozen);
        }
        let mut mark = Grid::new();
        mark.set(coord)?;
        if self.is_targeted(coord) {
            return Err(BoardError::AlreadyTargeted(coord));
        }

        let struck = self
            .ships
            .iter_mut()
            .filter(|s| !s.is_sunk())
            .find_map(|s| s.register_hit(coord).then_some(s));
        match struck {
            Some(ship) => {
                self.hits = self.hits | mark;
                if ship.is_sunk() {
                    let kind = ship.kind();
                    self.sunk_cells = self.sunk_cells | ship.footprint();
                    self.sunk.push(kind);
                    Ok(ShotOutcome::Sunk(kind))
                } else {
                    Ok(ShotOutcome::Hit)
                }
            }
            None => {
                self.misses = self.misses | mark;
                Ok(ShotOutcome::Miss)
            }
        }
    }

    /// Record a result decided elsewhere. The reported outcome wins over
    /// anything this board would compute; the return value tells whether the
    /// two agreed.
    pub fn apply_reported(&mut self, coord: Coord, outcome: ShotOutcome) -> Result<bool, BoardError> {
        if self.frozen {
            return Err(BoardError::Frozen);
        }
        let mut mark = Grid::new();
        mark.set(coord)?;

        let local = self.cell(coord);
        let agreed = match (local, outcome.is_hit()) {
            (Cell::Ship(_) | Cell::Hit, true) => true,
            (Cell::Empty | Cell::Miss, false) => true,
            _ => !self.has_fleet(),
        };

        if outcome.is_hit() {
            self.misses = self.misses & !mark;
            self.hits = self.hits | mark;
            for ship in self.ships.iter_mut() {
                ship.register_hit(coord);
            }
        } else {
            self.hits = self.hits & !mark;
            self.misses = self.misses | mark;
        }
        if let ShotOutcome::Sunk(kind) = outcome {
            self.mark_sunk(kind, None);
        }
        Ok(agreed)
    }

    /// Record that `kind` went down, revealing `cells` when they are known.
    pub fn mark_sunk(&mut self, kind: ShipKind, cells: Option<&[Coord]>) {
        if !self.sunk.contains(&kind) {
            self.sunk.push(kind);
        }
        let footprint = match cells {
            Some(cells) => Grid::from_coords(cells.iter().copied()).unwrap_or_default(),
            None => self
                .ships
                .iter()
                .find(|s| s.kind() == kind)
                .map(Ship::footprint)
                .unwrap_or_default(),
        };
        self.sunk_cells = self.sunk_cells | footprint;
    }

    /// What a shooter is allowed to see of this board.
    pub fn targeting_view(&self) -> TargetingView {
        TargetingView {
            hits: self.hits,
            misses: self.misses,
            sunk: self.sunk_cells,
            remaining: self.remaining_kinds().iter().map(|k| k.length()).collect(),
        }
    }

    /// Render the board. With `reveal` unset intact ship cells are hidden.
    pub fn render(&self, reveal: bool) -> String {
        let mut out = String::from("   ");
        for x in 0..BOARD_SIZE as u8 {
            out.push(' ');
            out.push((b'A' + x) as char);
        }
        out.push('\n');
        for y in 0..BOARD_SIZE as u8 {
            out.push_str(&format!("{:2} ", y + 1));
            for x in 0..BOARD_SIZE as u8 {
                let coord = Coord::new(x, y);
                let glyph = match self.cell(coord) {
                    Cell::Hit if self.sunk_cells.contains(coord) => '#',
                    Cell::Hit => 'X',
                    Cell::Miss => 'o',
                    Cell::Ship(_) if reveal => 'S',
                    _ => '.',
                };
                out.push(' ');
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}
