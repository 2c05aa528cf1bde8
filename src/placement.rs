//! Fleet composition, the no-overlap/no-touch rule, and random placement.

use rand::Rng;
use thiserror::Error;

use crate::common::{Coord, Grid};
use crate::config::{EngineConfig, BOARD_SIZE, FLEET, NUM_SHIPS};
use crate::ship::{Orientation, Ship, ShipKind};

/// Why a fleet or a single placement is illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("fleet must contain exactly one ship of each length 5, 4, 3, 3, 2")]
    WrongComposition,
    #[error("{0} does not fit on the board")]
    OutOfBounds(ShipKind),
    #[error("{0} is not a straight run of its length")]
    Malformed(ShipKind),
    #[error("{0} overlaps another ship")]
    Overlaps(ShipKind),
    #[error("{0} touches another ship")]
    Touches(ShipKind),
}

/// Detailed fleet check. See [`validate_placement`].
pub fn check_placement(ships: &[Ship]) -> Result<(), PlacementError> {
    let mut lengths: Vec<usize> = ships.iter().map(|s| s.cells().len()).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let mut required: Vec<usize> = FLEET.iter().map(|k| k.length()).collect();
    required.sort_unstable_by(|a, b| b.cmp(a));
    if lengths != required {
        return Err(PlacementError::WrongComposition);
    }

    let mut occupied = Grid::new();
    for ship in ships {
        check_shape(ship)?;
        let footprint = ship.footprint();
        if !occupied.is_disjoint(&footprint) {
            return Err(PlacementError::Overlaps(ship.kind()));
        }
        occupied = occupied | footprint;
    }

    for (i, a) in ships.iter().enumerate() {
        let halo = a.footprint().halo();
        for b in &ships[i + 1..] {
            if !halo.is_disjoint(&b.footprint()) {
                return Err(PlacementError::Touches(b.kind()));
            }
        }
    }
    Ok(())
}

/// True iff the fleet has one ship of each required length, every cell is on
/// the board, no two ships share a cell, and no two ships are 8-adjacent.
pub fn validate_placement(ships: &[Ship]) -> bool {
    check_placement(ships).is_ok()
}

fn check_shape(ship: &Ship) -> Result<(), PlacementError> {
    let cells = ship.cells();
    if cells.iter().any(|c| !c.in_bounds()) {
        return Err(PlacementError::OutOfBounds(ship.kind()));
    }
    if cells.len() != ship.kind().length() {
        return Err(PlacementError::Malformed(ship.kind()));
    }
    let (dx, dy) = ship.orientation().step();
    let straight = cells
        .windows(2)
        .all(|w| w[0].offset(dx, dy) == Some(w[1]));
    if straight {
        Ok(())
    } else {
        Err(PlacementError::Malformed(ship.kind()))
    }
}

/// True when `ship` neither overlaps nor touches anything in `obstacles`.
pub fn fits(ship: &Ship, obstacles: &Grid) -> bool {
    obstacles.halo().is_disjoint(&ship.footprint())
}

/// Draw up to `attempts` random (orientation, origin) pairs and return the
/// first ship that satisfies the no-touch rule against `obstacles`. `None`
/// means the attempts ran out; callers reshuffle rather than give up.
pub fn random_placement<R: Rng + ?Sized>(
    rng: &mut R,
    kind: ShipKind,
    obstacles: &Grid,
    attempts: usize,
) -> Option<Ship> {
    let blocked = obstacles.halo();
    let span = (BOARD_SIZE - kind.length()) as u8;
    for _ in 0..attempts {
        let orientation = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (max_x, max_y) = match orientation {
            Orientation::Horizontal => (span, BOARD_SIZE as u8 - 1),
            Orientation::Vertical => (BOARD_SIZE as u8 - 1, span),
        };
        let origin = Coord::new(rng.random_range(0..=max_x), rng.random_range(0..=max_y));
        if let Some(ship) = Ship::new(kind.slot() as u8, kind, origin, orientation) {
            if blocked.is_disjoint(&ship.footprint()) {
                return Some(ship);
            }
        }
    }
    None
}

/// Deterministic fallback: the legal-bounds placement with the fewest
/// conflicts, overlaps weighing far more than touches. With at most 15 cells
/// already taken some row is always empty, so the result never overlaps.
fn least_conflicting(kind: ShipKind, obstacles: &Grid) -> Ship {
    let halo = obstacles.halo();
    let mut best: Option<(usize, Ship)> = None;
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        for origin in Coord::all() {
            let Some(ship) = Ship::new(kind.slot() as u8, kind, origin, orientation) else {
                continue;
            };
            let footprint = ship.footprint();
            let cost = (footprint & *obstacles).count() * 100 + (footprint & halo).count();
            if best.as_ref().map_or(true, |(c, _)| cost < *c) {
                if cost == 0 {
                    return ship;
                }
                best = Some((cost, ship));
            }
        }
    }
    match best {
        Some((_, ship)) => ship,
        // every kind fits the empty board horizontally from the origin
        None => Ship::from_cells(
            kind.slot() as u8,
            kind,
            Orientation::Horizontal,
            (0..kind.length() as u8).map(|x| Coord::new(x, 0)).collect(),
        ),
    }
}

/// A fleet under construction, one slot per ship kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    slots: [Option<Ship>; NUM_SHIPS],
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fleet from placed ships, one per kind.
    pub fn from_ships(ships: impl IntoIterator<Item = Ship>) -> Result<Self, PlacementError> {
        let mut fleet = Fleet::new();
        for ship in ships {
            let slot = ship.kind().slot();
            if fleet.slots[slot].is_some() {
                return Err(PlacementError::WrongComposition);
            }
            fleet.slots[slot] = Some(ship);
        }
        Ok(fleet)
    }

    pub fn get(&self, kind: ShipKind) -> Option<&Ship> {
        self.slots[kind.slot()].as_ref()
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.slots.iter().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Kinds not yet placed.
    pub fn missing(&self) -> Vec<ShipKind> {
        FLEET
            .iter()
            .copied()
            .filter(|k| self.slots[k.slot()].is_none())
            .collect()
    }

    /// Cells occupied by every ship except `kind`.
    pub fn occupied_except(&self, kind: ShipKind) -> Grid {
        self.ships()
            .filter(|s| s.kind() != kind)
            .fold(Grid::new(), |acc, s| acc | s.footprint())
    }

    pub fn occupied(&self) -> Grid {
        self.ships().fold(Grid::new(), |acc, s| acc | s.footprint())
    }

    pub fn remove(&mut self, kind: ShipKind) -> Option<Ship> {
        self.slots[kind.slot()].take()
    }

    /// Put `kind` at `origin`, replacing any earlier placement of that kind.
    /// The fleet is left unchanged on error.
    pub fn place_at(
        &mut self,
        kind: ShipKind,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), PlacementError> {
        let ship = Ship::new(kind.slot() as u8, kind, origin, orientation)
            .ok_or(PlacementError::OutOfBounds(kind))?;
        let others = self.occupied_except(kind);
        if !others.is_disjoint(&ship.footprint()) {
            return Err(PlacementError::Overlaps(kind));
        }
        if !fits(&ship, &others) {
            return Err(PlacementError::Touches(kind));
        }
        self.slots[kind.slot()] = Some(ship);
        Ok(())
    }

    /// Put `kind` somewhere random that respects the no-touch rule against
    /// the rest of the fleet. Falls back to the least conflicting spot when
    /// random draws are exhausted, so the ship is always placed.
    pub fn place_random<R: Rng + ?Sized>(&mut self, rng: &mut R, kind: ShipKind, attempts: usize) {
        let others = self.occupied_except(kind);
        let ship = random_placement(rng, kind, &others, attempts).unwrap_or_else(|| {
            log::warn!("random placement of {} exhausted, using best effort", kind);
            least_conflicting(kind, &others)
        });
        self.slots[kind.slot()] = Some(ship);
    }

    pub fn validate(&self) -> bool {
        self.is_complete() && validate_placement(&self.to_vec())
    }

    pub fn to_vec(&self) -> Vec<Ship> {
        self.ships().cloned().collect()
    }
}

/// Place a whole fleet at random. Each attempt re-places every ship from an
/// empty board and either succeeds entirely or is discarded. When every
/// attempt fails the fleet is completed greedily with the least conflicting
/// placements.
pub fn shuffle<R: Rng + ?Sized>(rng: &mut R, config: &EngineConfig) -> Fleet {
    'attempt: for _ in 0..config.shuffle_attempts {
        let mut fleet = Fleet::new();
        for kind in FLEET {
            let obstacles = fleet.occupied();
            match random_placement(rng, kind, &obstacles, config.placement_attempts) {
                Some(ship) => fleet.slots[kind.slot()] = Some(ship),
                None => continue 'attempt,
            }
        }
        return fleet;
    }
    log::warn!(
        "fleet shuffle failed after {} attempts, using best effort",
        config.shuffle_attempts
    );
    let mut fleet = Fleet::new();
    for kind in FLEET {
        let ship = least_conflicting(kind, &fleet.occupied());
        fleet.slots[kind.slot()] = Some(ship);
    }
    fleet
}
