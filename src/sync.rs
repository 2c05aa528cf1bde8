//! Applies records from the remote session authority to a [`GameSession`].
//!
//! The authority owns status, turn ownership and the end of the game. Its
//! records overwrite local state; anything local that disagrees is logged
//! and replaced. Records for another session, or that name unknown players,
//! are dropped.

use crate::{
    clock::Clock,
    common::{Coord, ShotOutcome, Side, Timestamp},
    events::GameEvent,
    game::{ConnectionState, GameSession, Mode},
    protocol::{outcome_from_wire, RemoteEvent, SessionStatePayload, WireShotResult},
    session::SessionStatus,
    stats::{detect_outcome, EndReason, GameOutcome},
};

impl<C: Clock> GameSession<C> {
    /// Apply one record from the authority. Returns `false` when the record
    /// was ignored.
    pub fn apply_remote(&mut self, event: RemoteEvent) -> bool {
        if !matches!(self.mode, Mode::Remote { .. }) {
            log::warn!("remote record in a local game ignored");
            return false;
        }
        if let Some(id) = event.session_id() {
            if id != self.session.session_id {
                log::debug!("record for session {} ignored", id);
                return false;
            }
        }
        log::trace!("remote: {:?}", event);

        match event {
            RemoteEvent::SessionState(payload) => {
                self.apply_session_state(payload);
                true
            }
            RemoteEvent::PlayerJoined { player_id, .. } => self.player_joined(player_id),
            RemoteEvent::BoardSubmitted { player_id, .. } => match self.session.side_of(&player_id) {
                Some(side) => {
                    self.session.mark_submitted(side);
                    true
                }
                None => self.unknown_player("board_submitted", &player_id),
            },
            RemoteEvent::GameStarted {
                current_turn,
                turn_started_at,
                game_started_at,
                ..
            } => {
                let Some(side) = self.session.side_of(&current_turn) else {
                    return self.unknown_player("game_started", &current_turn);
                };
                let before = self.session.status();
                self.session.overwrite(
                    SessionStatus::Active,
                    Some(side),
                    Some(turn_started_at),
                    Some(game_started_at),
                );
                self.announce_status(before);
                if self.session.status() != SessionStatus::Active {
                    return false;
                }
                self.push_event(GameEvent::TurnChanged {
                    side,
                    started_at: turn_started_at,
                });
                true
            }
            RemoteEvent::ShotFired {
                shooter,
                x,
                y,
                result,
                ship,
                next_turn,
                turn_started_at,
                ..
            } => {
                let Some(shooter) = self.session.side_of(&shooter) else {
                    return self.unknown_player("shot_fired", &shooter);
                };
                let coord = Coord::new(x, y);
                if !coord.in_bounds() {
                    log::warn!("shot_fired at ({}, {}) is off the board", x, y);
                    return false;
                }
                let sunk = result == WireShotResult::Sunk;
                let applied = self.shot_fired(shooter, coord, outcome_from_wire(result, ship), sunk);
                if let Some(next) = next_turn {
                    match self.session.side_of(&next) {
                        Some(side) => {
                            let started = turn_started_at.unwrap_or_else(|| self.clock.now());
                            self.authoritative_turn(side, started);
                        }
                        None => {
                            self.unknown_player("shot_fired next_turn", &next);
                        }
                    }
                }
                applied
            }
            RemoteEvent::TurnTimeout {
                player_id,
                next_turn,
                turn_started_at,
                ..
            } => {
                log::info!("turn of {} timed out", player_id);
                match self.session.side_of(&next_turn) {
                    Some(side) => {
                        self.authoritative_turn(side, turn_started_at);
                        true
                    }
                    None => self.unknown_player("turn_timeout", &next_turn),
                }
            }
            RemoteEvent::GameEndProcessing { .. } => {
                log::info!("session {}: game end processing", self.session.session_id);
                self.ending = true;
                true
            }
            RemoteEvent::GameEndCompleted { winner, reason, .. } => {
                let outcome = match winner {
                    Some(player) => match self.session.side_of(&player) {
                        Some(side) => GameOutcome::Winner(side),
                        None => return self.unknown_player("game_end_completed", &player),
                    },
                    None => GameOutcome::Draw,
                };
                let reason = EndReason::Authoritative(reason.unwrap_or_else(|| "completed".into()));
                self.authoritative_end(outcome, reason);
                true
            }
            RemoteEvent::ShipSunk {
                player_id,
                ship,
                cells,
                ..
            } => {
                let Some(owner) = self.session.side_of(&player_id) else {
                    return self.unknown_player("ship_sunk", &player_id);
                };
                let board = &mut self.boards[owner.index()];
                if board.is_frozen() {
                    return false;
                }
                board.mark_sunk(ship, cells.as_deref());
                true
            }
            RemoteEvent::Error { message, code } => {
                log::warn!("authority error {:?}: {}", code, message);
                // a refused shot is never confirmed
                self.reconcile_pending();
                self.push_event(GameEvent::RemoteError { message });
                true
            }
            RemoteEvent::Unknown => {
                log::debug!("unknown remote record ignored");
                false
            }
        }
    }

    /// The transport dropped. Shots are refused until it is restored.
    pub fn connection_lost(&mut self) {
        if self.connection == ConnectionState::Disconnected {
            return;
        }
        log::warn!("session {}: connection lost", self.session.session_id);
        self.connection = ConnectionState::Disconnected;
        self.push_event(GameEvent::ConnectionChanged { connected: false });
    }

    /// The transport is back. Nothing is resent; the authority follows up
    /// with a fresh `session_state`.
    pub fn connection_restored(&mut self) {
        if self.connection == ConnectionState::Connected {
            return;
        }
        log::info!("session {}: connection restored", self.session.session_id);
        self.connection = ConnectionState::Connected;
        self.push_event(GameEvent::ConnectionChanged { connected: true });
    }

    fn unknown_player(&self, record: &str, player: &str) -> bool {
        log::warn!("{} names unknown player {:?}, ignored", record, player);
        false
    }

    fn announce_status(&mut self, before: SessionStatus) {
        let status = self.session.status();
        if status != before {
            self.push_event(GameEvent::StateChanged { status });
        }
    }

    fn apply_session_state(&mut self, payload: SessionStatePayload) {
        let local = self.local_side();
        for (side, player) in [Side::First, Side::Second].into_iter().zip(payload.players) {
            if side == local && self.session.player(local) != Some(player.as_str()) {
                log::warn!("authority seats {:?} on {:?}, keeping local identity", player, side);
                continue;
            }
            self.session.set_player(side, player);
        }
        let turn = payload
            .current_turn
            .as_deref()
            .and_then(|p| self.session.side_of(p));
        let before_status = self.session.status();
        let before_turn = self.session.current_turn();
        self.session.overwrite(
            payload.status,
            turn,
            payload.turn_started_at,
            payload.game_started_at,
        );
        self.announce_status(before_status);
        self.reconcile_pending();

        if self.session.status() == SessionStatus::Completed {
            if self.summary.is_none() {
                let outcome = detect_outcome(self.boards[0].all_sunk(), self.boards[1].all_sunk())
                    .unwrap_or(GameOutcome::Draw);
                self.pending_shots.clear();
                self.seal(outcome, EndReason::Authoritative("session_state".into()));
            }
            return;
        }
        if let (Some(side), Some(started)) = (self.session.current_turn(), self.session.turn_started_at()) {
            if Some(side) != before_turn {
                self.push_event(GameEvent::TurnChanged {
                    side,
                    started_at: started,
                });
            }
        }
    }

    fn player_joined(&mut self, player: String) -> bool {
        if self.session.side_of(&player).is_some() {
            return true;
        }
        let seat = [Side::First, Side::Second]
            .into_iter()
            .find(|&side| self.session.player(side).is_none());
        let Some(seat) = seat else {
            log::warn!("player {:?} joined a full session", player);
            return false;
        };
        self.session.set_player(seat, player);
        let before = self.session.status();
        if before == SessionStatus::Created {
            self.session
                .overwrite(SessionStatus::Waiting, None, None, None);
            self.announce_status(before);
        }
        true
    }

    /// Drop optimistic shots the authority has not applied. Its state is
    /// complete, so a pending cell it does not show as targeted was refused
    /// or lost.
    fn reconcile_pending(&mut self) {
        let defender = &self.boards[self.mode.local_side().opponent().index()];
        let before = self.pending_shots.len();
        self.pending_shots.retain(|&c| defender.is_targeted(c));
        if self.pending_shots.len() != before {
            log::info!(
                "session {}: dropped {} unconfirmed shot(s)",
                self.session.session_id,
                before - self.pending_shots.len()
            );
        }
    }

    /// Record a confirmed shot. A cell already marked on the board means a
    /// duplicate delivery, which changes nothing. `sunk` counts a sink the
    /// authority reported without naming the ship.
    fn shot_fired(&mut self, shooter: Side, coord: Coord, outcome: ShotOutcome, sunk: bool) -> bool {
        let defender = shooter.opponent();
        if self.boards[defender.index()].is_targeted(coord) {
            log::debug!("duplicate shot_fired at {} ignored", coord);
            return false;
        }
        if shooter == self.local_side() {
            self.pending_shots.retain(|&c| c != coord);
        }
        match self.boards[defender.index()].apply_reported(coord, outcome) {
            Ok(true) => {}
            Ok(false) => log::warn!(
                "authority reports {:?} at {}, local board disagreed",
                outcome,
                coord
            ),
            Err(e) => {
                log::warn!("shot_fired at {} not applied: {}", coord, e);
                return false;
            }
        }

        let now = self.clock.now();
        let started: Timestamp = self.session.turn_started_at().unwrap_or(now);
        self.stats[shooter.index()].record_shot(
            outcome.is_hit(),
            sunk || matches!(outcome, ShotOutcome::Sunk(_)),
            now.saturating_sub(started),
        );
        self.push_event(GameEvent::ShotResolved {
            shooter,
            coord,
            outcome,
        });
        true
    }

    fn authoritative_turn(&mut self, side: Side, started_at: Timestamp) {
        if self.session.status() == SessionStatus::Completed {
            return;
        }
        let before = self.session.current_turn();
        self.session
            .overwrite(self.session.status(), Some(side), Some(started_at), None);
        if before != Some(side) {
            self.push_event(GameEvent::TurnChanged { side, started_at });
        }
    }

    /// Complete the game as the authority decided. Replaces any summary
    /// recorded locally, for example after a local forfeit.
    fn authoritative_end(&mut self, outcome: GameOutcome, reason: EndReason) {
        self.ending = false;
        if let Some(existing) = &self.summary {
            if existing.outcome == outcome && existing.reason == reason {
                return;
            }
        }
        if self.session.status() != SessionStatus::Completed {
            self.session
                .overwrite(SessionStatus::Completed, None, None, None);
        }
        self.seal(outcome, reason);
    }
}
