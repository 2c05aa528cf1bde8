//! Session lifecycle and turn ownership.
//!
//! ```text
//! Created -> Waiting -> Setup -> Active -> Completed
//! ```
//!
//! `Completed` is terminal. Forfeits and authoritative game-over events may
//! complete a session from any earlier state; every other transition is
//! strictly forward by one step.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::{Rejection, Side, Timestamp};

/// Opaque player identity supplied by the caller.
pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Waiting,
    Setup,
    Active,
    Completed,
}

impl SessionStatus {
    fn rank(self) -> u8 {
        match self {
            SessionStatus::Created => 0,
            SessionStatus::Waiting => 1,
            SessionStatus::Setup => 2,
            SessionStatus::Active => 3,
            SessionStatus::Completed => 4,
        }
    }
}

/// Session record: identities, lifecycle status and turn clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    players: [Option<PlayerId>; 2],
    status: SessionStatus,
    current_turn: Option<Side>,
    turn_started_at: Option<Timestamp>,
    game_started_at: Option<Timestamp>,
    submitted: [bool; 2],
}

impl Session {
    /// A new session owned by `host`, who takes [`Side::First`].
    pub fn new(session_id: impl Into<String>, host: impl Into<PlayerId>) -> Self {
        Self {
            session_id: session_id.into(),
            players: [Some(host.into()), None],
            status: SessionStatus::Created,
            current_turn: None,
            turn_started_at: None,
            game_started_at: None,
            submitted: [false; 2],
        }
    }

    /// A session with no seats filled yet, as known to a remote participant
    /// before the authority's first `session_state`.
    pub fn unseated(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            players: [None, None],
            status: SessionStatus::Created,
            current_turn: None,
            turn_started_at: None,
            game_started_at: None,
            submitted: [false; 2],
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_turn(&self) -> Option<Side> {
        self.current_turn
    }

    pub fn turn_started_at(&self) -> Option<Timestamp> {
        self.turn_started_at
    }

    pub fn game_started_at(&self) -> Option<Timestamp> {
        self.game_started_at
    }

    pub fn player(&self, side: Side) -> Option<&str> {
        self.players[side.index()].as_deref()
    }

    /// Which side `player` sits on.
    pub fn side_of(&self, player: &str) -> Option<Side> {
        [Side::First, Side::Second]
            .into_iter()
            .find(|&side| self.player(side) == Some(player))
    }

    pub fn has_submitted(&self, side: Side) -> bool {
        self.submitted[side.index()]
    }

    fn advance(&mut self, from: SessionStatus, to: SessionStatus) -> Result<(), Rejection> {
        if self.status != from {
            return Err(Rejection::InvalidTransition {
                from: self.status,
                to,
            });
        }
        log::info!("session {}: {:?} -> {:?}", self.session_id, from, to);
        self.status = to;
        Ok(())
    }

    /// Created -> Waiting: the second player joins.
    pub fn join(&mut self, guest: impl Into<PlayerId>) -> Result<(), Rejection> {
        self.advance(SessionStatus::Created, SessionStatus::Waiting)?;
        self.players[1] = Some(guest.into());
        Ok(())
    }

    /// Waiting -> Setup: both sides start placing ships.
    pub fn begin_setup(&mut self) -> Result<(), Rejection> {
        self.advance(SessionStatus::Waiting, SessionStatus::Setup)
    }

    /// Mark `side`'s fleet as submitted. Returns `true` once both are in.
    pub fn submit_fleet(&mut self, side: Side) -> Result<bool, Rejection> {
        if self.status != SessionStatus::Setup {
            return Err(Rejection::WrongStatus(self.status));
        }
        if self.submitted[side.index()] {
            return Err(Rejection::AlreadySubmitted);
        }
        self.submitted[side.index()] = true;
        Ok(self.submitted.iter().all(|&s| s))
    }

    /// Setup -> Active: both fleets are in; `first` takes the opening turn.
    pub fn activate(&mut self, first: Side, now: Timestamp) -> Result<(), Rejection> {
        if !self.submitted.iter().all(|&s| s) {
            return Err(Rejection::WrongStatus(self.status));
        }
        self.advance(SessionStatus::Setup, SessionStatus::Active)?;
        self.current_turn = Some(first);
        self.turn_started_at = Some(now);
        self.game_started_at = Some(now);
        Ok(())
    }

    /// Start a new turn for `side` at `now`. Returns `true` if ownership
    /// changed.
    pub fn start_turn(&mut self, side: Side, now: Timestamp) -> Result<bool, Rejection> {
        if self.status != SessionStatus::Active {
            return Err(Rejection::WrongStatus(self.status));
        }
        let changed = self.current_turn != Some(side);
        self.current_turn = Some(side);
        self.turn_started_at = Some(now);
        Ok(changed)
    }

    /// Any non-terminal state -> Completed.
    pub fn complete(&mut self) -> Result<(), Rejection> {
        if self.status == SessionStatus::Completed {
            return Err(Rejection::InvalidTransition {
                from: self.status,
                to: SessionStatus::Completed,
            });
        }
        log::info!("session {}: {:?} -> Completed", self.session_id, self.status);
        self.status = SessionStatus::Completed;
        self.current_turn = None;
        Ok(())
    }

    /// Overwrite lifecycle fields with values from the remote authority.
    /// A status never moves backwards.
    pub(crate) fn overwrite(
        &mut self,
        status: SessionStatus,
        current_turn: Option<Side>,
        turn_started_at: Option<Timestamp>,
        game_started_at: Option<Timestamp>,
    ) {
        if status.rank() >= self.status.rank() {
            if status != self.status {
                log::info!(
                    "session {}: {:?} -> {:?} (authoritative)",
                    self.session_id,
                    self.status,
                    status
                );
            }
            self.status = status;
        }
        if self.status == SessionStatus::Completed {
            self.current_turn = None;
            return;
        }
        if current_turn.is_some() {
            self.current_turn = current_turn;
        }
        self.turn_started_at = turn_started_at.or(self.turn_started_at);
        self.game_started_at = game_started_at.or(self.game_started_at);
    }

    pub(crate) fn set_player(&mut self, side: Side, player: impl Into<PlayerId>) {
        self.players[side.index()] = Some(player.into());
    }

    pub(crate) fn mark_submitted(&mut self, side: Side) {
        self.submitted[side.index()] = true;
    }

    /// Time left in the current turn, derived from `turn_started_at`.
    pub fn turn_remaining(&self, now: Timestamp, limit: Duration) -> Option<Duration> {
        let started = self.turn_started_at?;
        if self.status != SessionStatus::Active {
            return None;
        }
        let elapsed = Duration::from_millis(now.saturating_sub(started));
        Some(limit.saturating_sub(elapsed))
    }

    /// Time since the game went active.
    pub fn game_elapsed(&self, now: Timestamp) -> Option<Duration> {
        self.game_started_at
            .map(|started| Duration::from_millis(now.saturating_sub(started)))
    }

    /// Time left before the game-duration limit.
    pub fn game_remaining(&self, now: Timestamp, limit: Duration) -> Option<Duration> {
        self.game_elapsed(now).map(|e| limit.saturating_sub(e))
    }
}
