//! The session context: every command, timer firing and remote event goes
//! through one [`GameSession`], which applies it as a single atomic step and
//! queues the resulting [`GameEvent`]s.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::{
    ai::Difficulty,
    board::Board,
    clock::{Clock, SystemClock, Timer, TimerHandle},
    common::{Coord, Rejection, ShotOutcome, Side, Timestamp},
    config::EngineConfig,
    events::GameEvent,
    placement::{self, Fleet},
    player::Targeting,
    player_ai::AiPlayer,
    protocol::{OutboundMessage, ShipPlacement},
    session::{PlayerId, Session, SessionStatus},
    ship::{Orientation, ShipKind},
    stats::{detect_outcome, EndReason, GameOutcome, GameSummary, PlayerStats},
};

/// Player id given to the computer opponent.
pub const AI_PLAYER_ID: &str = "computer";

/// How the opposing side is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Local game against the engine. The human plays `local`; a hit lets
    /// the shooter fire again, a miss passes the turn.
    Ai { difficulty: Difficulty, local: Side },
    /// Human opponent behind a remote authority, which resolves every shot
    /// and names the next turn owner explicitly.
    Remote { local: Side },
}

impl Mode {
    pub fn local_side(&self) -> Side {
        match *self {
            Mode::Ai { local, .. } | Mode::Remote { local } => local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// One game, from setup to frozen summary.
pub struct GameSession<C: Clock = SystemClock> {
    pub(crate) session: Session,
    pub(crate) mode: Mode,
    pub(crate) config: EngineConfig,
    pub(crate) boards: [Board; 2],
    pub(crate) stats: [PlayerStats; 2],
    pub(crate) ai: Option<AiPlayer>,
    pub(crate) clock: C,
    pub(crate) rng: SmallRng,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) outbox: Vec<OutboundMessage>,
    pub(crate) pending_shots: Vec<Coord>,
    pub(crate) connection: ConnectionState,
    pub(crate) ending: bool,
    pub(crate) torn_down: bool,
    pub(crate) summary: Option<GameSummary>,
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

impl<C: Clock> GameSession<C> {
    fn with_parts(session: Session, mode: Mode, config: EngineConfig, clock: C, seed: Option<u64>) -> Self {
        Self {
            session,
            mode,
            config,
            boards: [Board::new(), Board::new()],
            stats: [PlayerStats::default(); 2],
            ai: None,
            clock,
            rng: make_rng(seed),
            events: Vec::new(),
            outbox: Vec::new(),
            pending_shots: Vec::new(),
            connection: ConnectionState::Connected,
            ending: false,
            torn_down: false,
            summary: None,
        }
    }

    /// Start a local game against the computer. The human sits on
    /// [`Side::First`]; the computer's fleet is placed and submitted at once,
    /// leaving the session in `Setup` until the human submits.
    pub fn vs_ai(
        session_id: impl Into<String>,
        player: impl Into<PlayerId>,
        config: EngineConfig,
        clock: C,
        seed: Option<u64>,
    ) -> Self {
        let difficulty = config.difficulty;
        let mode = Mode::Ai {
            difficulty,
            local: Side::First,
        };
        let session = Session::new(session_id, player);
        let mut game = Self::with_parts(session, mode, config, clock, seed);
        game.ai = Some(AiPlayer::new(difficulty));
        if let Err(err) = game.seat_computer(Side::Second) {
            log::error!("AI session setup failed: {}", err);
        }
        game.push_event(GameEvent::StateChanged {
            status: game.session.status(),
        });
        log::info!(
            "session {}: vs AI ({:?}) ready for placement",
            game.session.session_id,
            difficulty
        );
        game
    }

    /// Seat the computer on `side`, move to `Setup`, and submit a random
    /// fleet for it.
    fn seat_computer(&mut self, side: Side) -> Result<(), Rejection> {
        self.session.join(AI_PLAYER_ID)?;
        self.session.begin_setup()?;
        let fleet = placement::shuffle(&mut self.rng, &self.config);
        self.boards[side.index()].set_fleet(&fleet)?;
        self.session.submit_fleet(side)?;
        Ok(())
    }

    /// Join a remote session as `player` on `local`. Status and turn fields
    /// are driven by [`GameSession::apply_remote`].
    pub fn remote(
        session_id: impl Into<String>,
        player: impl Into<PlayerId>,
        local: Side,
        config: EngineConfig,
        clock: C,
        seed: Option<u64>,
    ) -> Self {
        let mut session = Session::unseated(session_id);
        session.set_player(local, player);
        Self::with_parts(session, Mode::Remote { local }, config, clock, seed)
    }

    // ----- views -----

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn local_side(&self) -> Side {
        self.mode.local_side()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self, side: Side) -> &Board {
        &self.boards[side.index()]
    }

    pub fn stats(&self, side: Side) -> &PlayerStats {
        &self.stats[side.index()]
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    pub fn ai(&self) -> Option<&AiPlayer> {
        self.ai.as_ref()
    }

    /// Swap the computer opponent's targeting strategy, keeping its
    /// difficulty label and any pending shot.
    pub fn set_ai_strategy(&mut self, strategy: Box<dyn Targeting>) {
        if let Some(ai) = self.ai.as_mut() {
            ai.set_strategy(strategy);
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Shots sent to the authority and not yet confirmed.
    pub fn pending_shots(&self) -> &[Coord] {
        &self.pending_shots
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_outbox(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn turn_remaining(&self) -> Option<core::time::Duration> {
        if !matches!(self.mode, Mode::Remote { .. }) {
            return None;
        }
        let limit = core::time::Duration::from_secs(self.config.turn_limit_secs);
        self.session.turn_remaining(self.clock.now(), limit)
    }

    pub fn game_elapsed(&self) -> Option<core::time::Duration> {
        self.session.game_elapsed(self.clock.now())
    }

    pub fn game_remaining(&self) -> Option<core::time::Duration> {
        let limit = core::time::Duration::from_secs(self.config.game_limit_secs);
        self.session.game_remaining(self.clock.now(), limit)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        log::debug!("event: {:?}", event);
        self.events.push(event);
    }

    fn rejected<T>(&self, what: &str, err: Rejection) -> Result<T, Rejection> {
        log::debug!("session {}: {} rejected: {}", self.session.session_id, what, err);
        Err(err)
    }

    // ----- setup commands -----

    fn check_setup(&self) -> Result<Side, Rejection> {
        if self.torn_down {
            return Err(Rejection::TornDown);
        }
        let side = self.local_side();
        if self.session.status() != SessionStatus::Setup
            && !(matches!(self.mode, Mode::Remote { .. })
                && matches!(
                    self.session.status(),
                    SessionStatus::Created | SessionStatus::Waiting
                ))
        {
            return Err(Rejection::WrongStatus(self.session.status()));
        }
        if self.session.has_submitted(side) {
            return Err(Rejection::AlreadySubmitted);
        }
        Ok(side)
    }

    fn local_fleet(&self, side: Side) -> Result<Fleet, Rejection> {
        Fleet::from_ships(self.boards[side.index()].ships().iter().cloned())
            .map_err(|_| Rejection::IllegalPlacement)
    }

    fn store_fleet(&mut self, side: Side, fleet: &Fleet) -> Result<(), Rejection> {
        self.boards[side.index()].set_fleet(fleet)?;
        self.push_event(GameEvent::FleetChanged { side });
        Ok(())
    }

    /// Place `kind` on a random legal spot of the local board, replacing
    /// its earlier placement.
    pub fn place_ship(&mut self, kind: ShipKind) -> Result<(), Rejection> {
        let side = match self.check_setup() {
            Ok(side) => side,
            Err(e) => return self.rejected("place_ship", e),
        };
        let mut fleet = self.local_fleet(side)?;
        fleet.place_random(&mut self.rng, kind, self.config.placement_attempts);
        self.store_fleet(side, &fleet)
    }

    /// Place `kind` at `origin` facing `orientation`.
    pub fn place_ship_at(
        &mut self,
        kind: ShipKind,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), Rejection> {
        let side = match self.check_setup() {
            Ok(side) => side,
            Err(e) => return self.rejected("place_ship_at", e),
        };
        let mut fleet = self.local_fleet(side)?;
        if let Err(e) = fleet.place_at(kind, origin, orientation) {
            log::debug!("placement of {} at {} refused: {}", kind, origin, e);
            return self.rejected("place_ship_at", Rejection::IllegalPlacement);
        }
        self.store_fleet(side, &fleet)
    }

    /// Replace the whole local fleet with a fresh random layout.
    pub fn shuffle_fleet(&mut self) -> Result<(), Rejection> {
        let side = match self.check_setup() {
            Ok(side) => side,
            Err(e) => return self.rejected("shuffle_fleet", e),
        };
        let fleet = placement::shuffle(&mut self.rng, &self.config);
        self.store_fleet(side, &fleet)
    }

    /// Lock in the local fleet. Against the computer this starts the game.
    pub fn submit_fleet(&mut self) -> Result<(), Rejection> {
        let side = match self.check_setup() {
            Ok(side) => side,
            Err(e) => return self.rejected("submit_fleet", e),
        };
        if self.session.status() != SessionStatus::Setup {
            return self.rejected("submit_fleet", Rejection::WrongStatus(self.session.status()));
        }
        let fleet = self.local_fleet(side)?;
        if !fleet.validate() {
            return self.rejected("submit_fleet", Rejection::InvalidFleet);
        }
        let both_in = self.session.submit_fleet(side)?;

        match self.mode {
            Mode::Ai { .. } => {
                if both_in {
                    let first = if self.config.ai_first {
                        side.opponent()
                    } else {
                        side
                    };
                    let now = self.clock.now();
                    self.session.activate(first, now)?;
                    self.push_event(GameEvent::StateChanged {
                        status: SessionStatus::Active,
                    });
                    self.push_event(GameEvent::TurnChanged {
                        side: first,
                        started_at: now,
                    });
                    self.schedule_ai_if_due();
                }
            }
            Mode::Remote { .. } => {
                let player_id = self.session.player(side).unwrap_or_default().to_string();
                self.outbox.push(OutboundMessage::SubmitBoard {
                    session_id: self.session.session_id.clone(),
                    player_id,
                    ships: fleet.ships().map(ShipPlacement::from).collect(),
                });
            }
        }
        Ok(())
    }

    // ----- play commands -----

    fn check_fire(&self, shooter: Side, coord: Coord) -> Result<(), Rejection> {
        if self.torn_down {
            return Err(Rejection::TornDown);
        }
        if self.session.status() != SessionStatus::Active {
            return Err(Rejection::WrongStatus(self.session.status()));
        }
        if self.ending {
            return Err(Rejection::EndPending);
        }
        if self.session.current_turn() != Some(shooter) {
            return Err(Rejection::NotYourTurn);
        }
        if !coord.in_bounds() {
            return Err(Rejection::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }
        if self.boards[shooter.opponent().index()].is_targeted(coord)
            || self.pending_shots.contains(&coord)
        {
            return Err(Rejection::AlreadyTargeted(coord));
        }
        Ok(())
    }

    /// Whether the local player could fire at `coord` right now.
    pub fn can_fire(&self, coord: Coord) -> bool {
        self.check_fire(self.local_side(), coord).is_ok()
    }

    /// Fire the local player's shot at `(x, y)`. Against the computer the
    /// outcome is returned at once; in a remote session the shot is sent to
    /// the authority and `None` is returned until `shot_fired` confirms it.
    pub fn fire_shot(&mut self, x: u8, y: u8) -> Result<Option<ShotOutcome>, Rejection> {
        let coord = Coord::new(x, y);
        let side = self.local_side();
        if let Err(e) = self.check_fire(side, coord) {
            return self.rejected("fire_shot", e);
        }
        match self.mode {
            Mode::Ai { .. } => self.resolve_shot(side, coord).map(Some),
            Mode::Remote { .. } => {
                if self.connection == ConnectionState::Disconnected {
                    return self.rejected("fire_shot", Rejection::Disconnected);
                }
                self.pending_shots.push(coord);
                let player_id = self.session.player(side).unwrap_or_default().to_string();
                self.outbox.push(OutboundMessage::FireShot {
                    session_id: self.session.session_id.clone(),
                    player_id,
                    x,
                    y,
                });
                Ok(None)
            }
        }
    }

    /// Concede the game. Allowed at any point before completion.
    pub fn forfeit(&mut self, reason: impl Into<String>) -> Result<(), Rejection> {
        if self.session.status() == SessionStatus::Completed {
            return self.rejected("forfeit", Rejection::WrongStatus(SessionStatus::Completed));
        }
        let reason = reason.into();
        let side = self.local_side();
        if let Mode::Remote { .. } = self.mode {
            let player_id = self.session.player(side).unwrap_or_default().to_string();
            self.outbox.push(OutboundMessage::Forfeit {
                session_id: self.session.session_id.clone(),
                player_id,
                reason: reason.clone(),
            });
        }
        self.finish(GameOutcome::Winner(side.opponent()), EndReason::Forfeit(reason));
        Ok(())
    }

    /// Stop all pending work. Timers that fire afterwards are ignored.
    pub fn teardown(&mut self) {
        self.cancel_ai_timer();
        self.torn_down = true;
        log::info!("session {}: torn down", self.session.session_id);
    }

    // ----- shot resolution -----

    /// Apply one shot by `shooter`: resolve it against the defender's board,
    /// update the shooter's stats, check for the end of the game, and hand the
    /// turn on per the AI-mode policy.
    pub(crate) fn resolve_shot(&mut self, shooter: Side, coord: Coord) -> Result<ShotOutcome, Rejection> {
        self.check_fire(shooter, coord)?;
        let defender = shooter.opponent();
        let outcome = self.boards[defender.index()].fire(coord)?;

        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.session.turn_started_at().unwrap_or(now));
        self.stats[shooter.index()].record_shot(
            outcome.is_hit(),
            matches!(outcome, ShotOutcome::Sunk(_)),
            elapsed,
        );
        log::debug!("{:?} fires at {}: {:?}", shooter, coord, outcome);
        self.push_event(GameEvent::ShotResolved {
            shooter,
            coord,
            outcome,
        });

        if let Some(result) = detect_outcome(self.boards[0].all_sunk(), self.boards[1].all_sunk()) {
            self.finish(result, EndReason::FleetDestroyed);
            return Ok(outcome);
        }

        let next = if outcome.is_hit() { shooter } else { defender };
        self.begin_turn(next, now)?;
        if self.boards[next.opponent().index()].targeting_view().untargeted().is_empty() {
            self.finish(GameOutcome::Draw, EndReason::Stalemate);
        }
        Ok(outcome)
    }

    fn begin_turn(&mut self, next: Side, now: Timestamp) -> Result<(), Rejection> {
        let changed = self.session.start_turn(next, now)?;
        if changed {
            self.cancel_ai_timer();
            self.push_event(GameEvent::TurnChanged {
                side: next,
                started_at: now,
            });
        }
        self.schedule_ai_if_due();
        Ok(())
    }

    // ----- computer opponent pacing -----

    fn ai_side(&self) -> Option<Side> {
        match self.mode {
            Mode::Ai { local, .. } => Some(local.opponent()),
            Mode::Remote { .. } => None,
        }
    }

    fn schedule_ai_if_due(&mut self) {
        let Some(ai_side) = self.ai_side() else {
            return;
        };
        if self.torn_down
            || self.session.status() != SessionStatus::Active
            || self.session.current_turn() != Some(ai_side)
        {
            return;
        }
        self.cancel_ai_timer();
        let delay = AiPlayer::think_time(&mut self.rng, &self.config);
        let handle = self.clock.schedule(delay, Timer::AiShot { side: ai_side });
        if let Some(ai) = self.ai.as_mut() {
            ai.set_pending(Some(handle));
        }
        log::debug!("AI shot scheduled in {:?}", delay);
    }

    fn cancel_ai_timer(&mut self) {
        if let Some(handle) = self.ai.as_mut().and_then(AiPlayer::take_pending) {
            self.clock.cancel(handle);
        }
    }

    /// Run every timer that has come due.
    pub fn tick(&mut self) {
        for (handle, timer) in self.clock.take_due() {
            self.on_timer(handle, timer);
        }
    }

    /// Handle one fired timer. Stale or cancelled handles are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle, timer: Timer) {
        match timer {
            Timer::AiShot { side } => {
                let Some(ai) = self.ai.as_mut() else {
                    return;
                };
                if ai.pending() != Some(handle) {
                    log::debug!("ignoring stale AI timer {:?}", handle);
                    return;
                }
                ai.set_pending(None);
                if self.torn_down
                    || self.session.status() != SessionStatus::Active
                    || self.session.current_turn() != Some(side)
                {
                    return;
                }
                self.take_ai_shot(side);
            }
        }
    }

    fn take_ai_shot(&mut self, side: Side) {
        let defender = side.opponent();
        let view = self.boards[defender.index()].targeting_view();
        let target = match self.ai.as_mut() {
            Some(ai) => ai.select_target(&mut self.rng, &view),
            None => return,
        };
        let Some(coord) = target else {
            self.finish(GameOutcome::Draw, EndReason::Stalemate);
            return;
        };
        match self.resolve_shot(side, coord) {
            Ok(outcome) => {
                let view = self.boards[defender.index()].targeting_view();
                if let Some(ai) = self.ai.as_mut() {
                    ai.observe(coord, outcome, &view);
                }
            }
            Err(e) => log::warn!("AI shot at {} refused: {}", coord, e),
        }
    }

    // ----- end of game -----

    /// Complete the session with `outcome`, freeze both boards and snapshot
    /// the stats. Does nothing if already complete.
    pub(crate) fn finish(&mut self, outcome: GameOutcome, reason: EndReason) {
        if self.session.status() == SessionStatus::Completed && self.summary.is_some() {
            return;
        }
        self.cancel_ai_timer();
        if self.session.status() != SessionStatus::Completed {
            // only fails when already complete
            let _ = self.session.complete();
        }
        self.seal(outcome, reason);
    }

    /// Freeze the boards and record the summary, replacing any earlier one.
    pub(crate) fn seal(&mut self, outcome: GameOutcome, reason: EndReason) {
        for board in self.boards.iter_mut() {
            board.freeze();
        }
        self.pending_shots.clear();
        let now = self.clock.now();
        let duration_ms = self
            .session
            .game_started_at()
            .map_or(0, |start| now.saturating_sub(start));
        let summary = GameSummary {
            outcome,
            reason,
            stats: self.stats,
            ended_at: now,
            duration_ms,
        };
        log::info!(
            "session {}: game over, {:?} ({:?})",
            self.session.session_id,
            summary.outcome,
            summary.reason
        );
        self.summary = Some(summary.clone());
        self.push_event(GameEvent::StateChanged {
            status: SessionStatus::Completed,
        });
        self.push_event(GameEvent::GameEnded { summary });
    }
}

impl GameSession<SystemClock> {
    /// Local game on wall-clock time.
    pub fn new_vs_ai(player: impl Into<PlayerId>, config: EngineConfig, seed: Option<u64>) -> Self {
        let session_id = format!("local-{}", SystemClock::new().now());
        Self::vs_ai(session_id, player, config, SystemClock::new(), seed)
    }
}
