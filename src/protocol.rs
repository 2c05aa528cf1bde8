//! Message contract with the real-time session authority.
//!
//! Inbound records are JSON objects tagged by `type`. Fields the engine does
//! not know are ignored, and unknown event types decode to
//! [`RemoteEvent::Unknown`] so newer servers do not break older clients.

use serde::{Deserialize, Serialize};

use crate::common::{Coord, ShotOutcome, Timestamp};
use crate::session::{PlayerId, SessionStatus};
use crate::ship::{Orientation, Ship, ShipKind};

/// Result field of a `shot_fired` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireShotResult {
    Hit,
    Miss,
    Sunk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatePayload {
    pub session_id: String,
    pub status: SessionStatus,
    /// Seat order: first entry is [`Side::First`](crate::Side::First).
    #[serde(default)]
    pub players: Vec<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub turn_started_at: Option<Timestamp>,
    pub game_started_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
    SessionState(SessionStatePayload),
    PlayerJoined {
        session_id: String,
        player_id: PlayerId,
    },
    BoardSubmitted {
        session_id: String,
        player_id: PlayerId,
    },
    GameStarted {
        session_id: String,
        current_turn: PlayerId,
        turn_started_at: Timestamp,
        game_started_at: Timestamp,
    },
    ShotFired {
        session_id: String,
        shooter: PlayerId,
        x: u8,
        y: u8,
        result: WireShotResult,
        ship: Option<ShipKind>,
        next_turn: Option<PlayerId>,
        turn_started_at: Option<Timestamp>,
    },
    TurnTimeout {
        session_id: String,
        player_id: PlayerId,
        next_turn: PlayerId,
        turn_started_at: Timestamp,
    },
    GameEndProcessing {
        session_id: String,
    },
    GameEndCompleted {
        session_id: String,
        winner: Option<PlayerId>,
        reason: Option<String>,
    },
    ShipSunk {
        session_id: String,
        /// Owner of the ship that went down.
        player_id: PlayerId,
        ship: ShipKind,
        cells: Option<Vec<Coord>>,
    },
    Error {
        message: String,
        code: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl RemoteEvent {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Session the event belongs to, if it names one.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            RemoteEvent::SessionState(p) => Some(&p.session_id),
            RemoteEvent::PlayerJoined { session_id, .. }
            | RemoteEvent::BoardSubmitted { session_id, .. }
            | RemoteEvent::GameStarted { session_id, .. }
            | RemoteEvent::ShotFired { session_id, .. }
            | RemoteEvent::TurnTimeout { session_id, .. }
            | RemoteEvent::GameEndProcessing { session_id }
            | RemoteEvent::GameEndCompleted { session_id, .. }
            | RemoteEvent::ShipSunk { session_id, .. } => Some(session_id),
            RemoteEvent::Error { .. } | RemoteEvent::Unknown => None,
        }
    }
}

/// Convert a wire result into an outcome. A sunk result without a ship name
/// falls back to a plain hit.
pub fn outcome_from_wire(result: WireShotResult, ship: Option<ShipKind>) -> ShotOutcome {
    match (result, ship) {
        (WireShotResult::Miss, _) => ShotOutcome::Miss,
        (WireShotResult::Hit, _) => ShotOutcome::Hit,
        (WireShotResult::Sunk, Some(kind)) => ShotOutcome::Sunk(kind),
        (WireShotResult::Sunk, None) => ShotOutcome::Hit,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub ship: ShipKind,
    pub x: u8,
    pub y: u8,
    pub orientation: Orientation,
}

impl From<&Ship> for ShipPlacement {
    fn from(ship: &Ship) -> Self {
        let origin = ship.origin();
        ShipPlacement {
            ship: ship.kind(),
            x: origin.x,
            y: origin.y,
            orientation: ship.orientation(),
        }
    }
}

/// Requests the engine asks the transport to deliver to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    SubmitBoard {
        session_id: String,
        player_id: PlayerId,
        ships: Vec<ShipPlacement>,
    },
    FireShot {
        session_id: String,
        player_id: PlayerId,
        x: u8,
        y: u8,
    },
    Forfeit {
        session_id: String,
        player_id: PlayerId,
        reason: String,
    },
}

impl OutboundMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
