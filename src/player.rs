use rand::rngs::SmallRng;

use crate::{board::TargetingView, common::Coord, common::ShotOutcome};

/// Interface implemented by the targeting strategies.
///
/// A strategy only ever sees the public [`TargetingView`] of the board it is
/// attacking, never the hidden fleet.
pub trait Targeting: Send {
    /// Choose the next cell to fire at. `None` means every cell has already
    /// been targeted.
    fn select_target(&mut self, rng: &mut SmallRng, view: &TargetingView) -> Option<Coord>;

    /// Inform the strategy of the result of its last shot. `view` already
    /// includes that shot.
    fn observe(&mut self, _coord: Coord, _outcome: ShotOutcome, _view: &TargetingView) {}
}
