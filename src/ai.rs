// Targeting heuristics shared by the computer opponents: hit memory, line
// extension, neighbour probing and the placement-count heatmap.

use serde::{Deserialize, Serialize};

use crate::{
    board::TargetingView,
    common::{Coord, Grid},
    config::BOARD_SIZE,
    ship::Orientation,
};

/// Strength of the computer opponent, fixed for the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "runtime", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// What a targeting strategy remembers between shots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiMemory {
    /// Candidate cells next to unresolved hits.
    pub hunt_targets: Vec<Coord>,
    /// Hits on the ship currently being worked, oldest first.
    pub recent_hits: Vec<Coord>,
}

impl AiMemory {
    /// Forget the current target, e.g. after it sinks.
    pub fn clear(&mut self) {
        self.hunt_targets.clear();
        self.recent_hits.clear();
    }

    /// Queue the untargeted orthogonal neighbours of `hit`.
    pub fn enqueue_neighbors(&mut self, hit: Coord, view: &TargetingView) {
        for n in hit.neighbors4() {
            if !view.is_targeted(n) && !self.hunt_targets.contains(&n) {
                self.hunt_targets.push(n);
            }
        }
    }
}

/// Cell weights indexed `[y][x]`.
pub type Heatmap = [[u32; BOARD_SIZE]; BOARD_SIZE];

/// Count, for every cell, how many legal placements of the remaining ships
/// cover it. A placement window is legal when it stays on the board and
/// contains no miss and no cell of an already sunk ship; known hits are
/// allowed. Every window contributes exactly one to each of its cells.
pub fn heatmap(view: &TargetingView) -> Heatmap {
    let mut matrix = [[0u32; BOARD_SIZE]; BOARD_SIZE];
    let blocked = view.misses | view.sunk;

    for &len in view.remaining.iter() {
        if len == 0 || len > BOARD_SIZE {
            continue;
        }
        for orient in [Orientation::Horizontal, Orientation::Vertical] {
            let (dx, dy) = orient.step();
            let (max_x, max_y) = match orient {
                Orientation::Horizontal => (BOARD_SIZE - len + 1, BOARD_SIZE),
                Orientation::Vertical => (BOARD_SIZE, BOARD_SIZE - len + 1),
            };
            for y in 0..max_y {
                for x in 0..max_x {
                    let window = (0..len).map(|k| {
                        Coord::new((x + dx as usize * k) as u8, (y + dy as usize * k) as u8)
                    });
                    if window.clone().any(|c| blocked.contains(c)) {
                        continue;
                    }
                    for c in window {
                        matrix[c.y as usize][c.x as usize] += 1;
                    }
                }
            }
        }
    }
    matrix
}

/// Untargeted cells carrying the highest weight. Falls back to every
/// untargeted cell when no window covers any of them.
pub fn hottest_cells(matrix: &Heatmap, view: &TargetingView) -> Vec<Coord> {
    let open = view.untargeted();
    let best = open
        .iter()
        .map(|c| matrix[c.y as usize][c.x as usize])
        .max()
        .unwrap_or(0);
    if best == 0 {
        return open;
    }
    open.into_iter()
        .filter(|c| matrix[c.y as usize][c.x as usize] == best)
        .collect()
}

/// Cells that extend the line through the last two hits, one beyond each
/// end. The step is the offset between the two hits, so a line walks over
/// earlier hits and stops at misses, sunk cells and the board edge.
pub fn line_candidates(recent_hits: &[Coord], view: &TargetingView) -> Vec<Coord> {
    let [.., a, b] = recent_hits else {
        return Vec::new();
    };
    let (a, b) = (*a, *b);
    if a == b || (a.x != b.x && a.y != b.y) {
        return Vec::new();
    }
    let dx = b.x as i16 - a.x as i16;
    let dy = b.y as i16 - a.y as i16;

    let mut out = Vec::new();
    for (start, sx, sy) in [(b, dx, dy), (a, -dx, -dy)] {
        let mut cursor = start.offset(sx, sy);
        while let Some(cell) = cursor {
            if !view.is_targeted(cell) {
                out.push(cell);
                break;
            }
            if !view.unresolved_hits().contains(cell) {
                break;
            }
            cursor = cell.offset(sx, sy);
        }
    }
    out
}

/// Untargeted orthogonal neighbours of every hit not yet part of a sunk ship.
pub fn neighbor_candidates(view: &TargetingView) -> Vec<Coord> {
    let mut seen = Grid::new();
    let mut out = Vec::new();
    for hit in view.unresolved_hits().iter() {
        for n in hit.neighbors4() {
            if !view.is_targeted(n) && !seen.contains(n) {
                let _ = seen.set(n);
                out.push(n);
            }
        }
    }
    out
}

/// Untargeted cells on the `(x + y) % 2 == 0` colour of the checkerboard.
pub fn checkerboard_cells(view: &TargetingView) -> Vec<Coord> {
    view.untargeted()
        .into_iter()
        .filter(|c| (c.x + c.y) % 2 == 0)
        .collect()
}
