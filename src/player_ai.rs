//! The three computer opponents and the controller that paces their shots.

use core::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;

use crate::{
    ai::{self, AiMemory, Difficulty},
    board::TargetingView,
    clock::TimerHandle,
    common::{Coord, ShotOutcome},
    config::EngineConfig,
    player::Targeting,
};

fn pick<R: Rng + ?Sized>(rng: &mut R, cells: &[Coord]) -> Option<Coord> {
    if cells.is_empty() {
        None
    } else {
        Some(cells[rng.random_range(0..cells.len())])
    }
}

/// Easy: uniform over untargeted cells.
#[derive(Debug, Default)]
pub struct RandomTargeting;

impl Targeting for RandomTargeting {
    fn select_target(&mut self, rng: &mut SmallRng, view: &TargetingView) -> Option<Coord> {
        pick(rng, &view.untargeted())
    }
}

/// Medium: probe around hits from a queue, otherwise sweep the checkerboard.
#[derive(Debug, Default)]
pub struct HuntTargeting {
    memory: AiMemory,
}

impl HuntTargeting {
    pub fn memory(&self) -> &AiMemory {
        &self.memory
    }
}

impl Targeting for HuntTargeting {
    fn select_target(&mut self, rng: &mut SmallRng, view: &TargetingView) -> Option<Coord> {
        self.memory.hunt_targets.retain(|&c| !view.is_targeted(c));
        if !self.memory.hunt_targets.is_empty() {
            let idx = rng.random_range(0..self.memory.hunt_targets.len());
            return Some(self.memory.hunt_targets.swap_remove(idx));
        }
        pick(rng, &ai::checkerboard_cells(view)).or_else(|| pick(rng, &view.untargeted()))
    }

    fn observe(&mut self, coord: Coord, outcome: ShotOutcome, view: &TargetingView) {
        match outcome {
            ShotOutcome::Hit => {
                self.memory.recent_hits.push(coord);
                self.memory.enqueue_neighbors(coord, view);
            }
            ShotOutcome::Sunk(_) => self.memory.clear(),
            ShotOutcome::Miss => {}
        }
    }
}

/// Hard: finish located ships along their line, then probe neighbours of
/// stray hits, then fire at the hottest cell of a fresh heatmap.
#[derive(Debug, Default)]
pub struct HeatmapTargeting {
    memory: AiMemory,
}

impl HeatmapTargeting {
    pub fn memory(&self) -> &AiMemory {
        &self.memory
    }

    /// Cells the line-extension stage would pick from right now.
    pub fn line_candidates(&self, view: &TargetingView) -> Vec<Coord> {
        ai::line_candidates(&self.memory.recent_hits, view)
    }
}

impl Targeting for HeatmapTargeting {
    fn select_target(&mut self, rng: &mut SmallRng, view: &TargetingView) -> Option<Coord> {
        let line = self.line_candidates(view);
        if let Some(target) = pick(rng, &line) {
            return Some(target);
        }
        if let Some(target) = pick(rng, &ai::neighbor_candidates(view)) {
            return Some(target);
        }
        let matrix = ai::heatmap(view);
        pick(rng, &ai::hottest_cells(&matrix, view))
    }

    fn observe(&mut self, coord: Coord, outcome: ShotOutcome, _view: &TargetingView) {
        match outcome {
            ShotOutcome::Hit => self.memory.recent_hits.push(coord),
            ShotOutcome::Sunk(_) => self.memory.clear(),
            ShotOutcome::Miss => {}
        }
    }
}

/// Build the strategy for `difficulty`.
pub fn targeting_for(difficulty: Difficulty) -> Box<dyn Targeting> {
    match difficulty {
        Difficulty::Easy => Box::new(RandomTargeting),
        Difficulty::Medium => Box::new(HuntTargeting::default()),
        Difficulty::Hard => Box::new(HeatmapTargeting::default()),
    }
}

/// A computer-controlled side: its fixed strategy and the handle of the
/// delayed shot it is waiting on, if any.
pub struct AiPlayer {
    difficulty: Difficulty,
    strategy: Box<dyn Targeting>,
    pending: Option<TimerHandle>,
}

impl AiPlayer {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            strategy: targeting_for(difficulty),
            pending: None,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub(crate) fn set_strategy(&mut self, strategy: Box<dyn Targeting>) {
        self.strategy = strategy;
    }

    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, handle: Option<TimerHandle>) {
        self.pending = handle;
    }

    pub(crate) fn take_pending(&mut self) -> Option<TimerHandle> {
        self.pending.take()
    }

    pub fn select_target(&mut self, rng: &mut SmallRng, view: &TargetingView) -> Option<Coord> {
        self.strategy.select_target(rng, view)
    }

    pub fn observe(&mut self, coord: Coord, outcome: ShotOutcome, view: &TargetingView) {
        self.strategy.observe(coord, outcome, view);
    }

    /// Randomised think time within the configured bounds.
    pub fn think_time<R: Rng + ?Sized>(rng: &mut R, config: &EngineConfig) -> Duration {
        let ms = if config.ai_delay_max_ms > config.ai_delay_min_ms {
            rng.random_range(config.ai_delay_min_ms..=config.ai_delay_max_ms)
        } else {
            config.ai_delay_min_ms
        };
        Duration::from_millis(ms)
    }
}
