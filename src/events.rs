use serde::{Deserialize, Serialize};

use crate::common::{Coord, ShotOutcome, Side, Timestamp};
use crate::session::SessionStatus;
use crate::stats::GameSummary;

/// Notifications emitted by a session for whoever presents it. Events are
/// queued in order and drained by the caller after each command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    StateChanged {
        status: SessionStatus,
    },
    TurnChanged {
        side: Side,
        started_at: Timestamp,
    },
    FleetChanged {
        side: Side,
    },
    ShotResolved {
        shooter: Side,
        coord: Coord,
        outcome: ShotOutcome,
    },
    GameEnded {
        summary: GameSummary,
    },
    ConnectionChanged {
        connected: bool,
    },
    RemoteError {
        message: String,
    },
}
