#![cfg(feature = "runtime")]

//! Tokio driver for a [`GameSession`] on wall-clock time.
//!
//! One task owns the session. Commands, authority records and timer firings
//! are taken one at a time in a `select!` loop, so every update is applied
//! atomically; resulting events are streamed to the presenter.

use std::future::pending;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::{
    clock::{Clock, SystemClock},
    common::{Coord, Rejection, ShotOutcome},
    events::GameEvent,
    game::GameSession,
    protocol::RemoteEvent,
    ship::{Orientation, ShipKind},
    stats::GameSummary,
    transport::Transport,
};

/// Requests a presenter can make of a running session.
pub enum Command {
    PlaceShip(ShipKind),
    PlaceShipAt {
        kind: ShipKind,
        origin: Coord,
        orientation: Orientation,
    },
    ShuffleFleet,
    SubmitFleet,
    FireShot { x: u8, y: u8 },
    Forfeit(String),
    /// Attach a fresh channel to the authority after the old one failed.
    /// Nothing queued while offline is resent.
    Reconnect(Box<dyn Transport>),
}

type Reply = Result<Option<ShotOutcome>, Rejection>;

/// Cloneable sender for [`Command`]s.
#[derive(Clone)]
pub struct RunnerHandle {
    commands: mpsc::Sender<(Command, oneshot::Sender<Reply>)>,
}

impl RunnerHandle {
    /// Send `command` and wait for the session's answer. The outer error
    /// means the runner has stopped.
    pub async fn send(&self, command: Command) -> anyhow::Result<Reply> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send((command, tx))
            .await
            .map_err(|_| anyhow::anyhow!("session runner stopped"))?;
        Ok(rx.await?)
    }
}

pub struct SessionRunner {
    game: GameSession<SystemClock>,
    transport: Option<Box<dyn Transport>>,
    commands: mpsc::Receiver<(Command, oneshot::Sender<Reply>)>,
    events: mpsc::Sender<GameEvent>,
}

async fn next_remote(transport: &mut Option<Box<dyn Transport>>) -> anyhow::Result<RemoteEvent> {
    match transport {
        Some(t) => t.recv().await,
        None => pending().await,
    }
}

async fn wait_for(delay: Option<Duration>) {
    match delay {
        Some(d) => sleep(d).await,
        None => pending().await,
    }
}

impl SessionRunner {
    /// Spawn a runner for `game`. Pass a transport for remote sessions.
    pub fn spawn(
        game: GameSession<SystemClock>,
        transport: Option<Box<dyn Transport>>,
    ) -> (
        RunnerHandle,
        mpsc::Receiver<GameEvent>,
        JoinHandle<anyhow::Result<Option<GameSummary>>>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let runner = SessionRunner {
            game,
            transport,
            commands: cmd_rx,
            events: event_tx,
        };
        let handle = tokio::spawn(runner.run());
        (RunnerHandle { commands: cmd_tx }, event_rx, handle)
    }

    /// Drive the session until it completes or every command sender is
    /// dropped. Returns the final summary, if the game reached one.
    pub async fn run(mut self) -> anyhow::Result<Option<GameSummary>> {
        self.flush().await;
        while self.game.summary().is_none() {
            let delay = self.game.clock().next_deadline().map(|deadline| {
                Duration::from_millis(deadline.saturating_sub(self.game.clock().now()))
            });
            tokio::select! {
                _ = wait_for(delay) => self.game.tick(),
                request = self.commands.recv() => match request {
                    Some((command, reply)) => {
                        let result = self.apply(command);
                        // events caused by a command are queued before its reply
                        self.flush().await;
                        let _ = reply.send(result);
                    }
                    None => {
                        log::info!("all command senders dropped, stopping");
                        break;
                    }
                },
                record = next_remote(&mut self.transport) => match record {
                    Ok(event) => {
                        self.game.apply_remote(event);
                    }
                    Err(e) => {
                        log::warn!("transport failed: {}", e);
                        self.transport = None;
                        self.game.connection_lost();
                    }
                },
            }
            self.flush().await;
        }
        self.game.teardown();
        self.flush().await;
        Ok(self.game.summary().cloned())
    }

    fn apply(&mut self, command: Command) -> Reply {
        match command {
            Command::PlaceShip(kind) => self.game.place_ship(kind).map(|_| None),
            Command::PlaceShipAt {
                kind,
                origin,
                orientation,
            } => self
                .game
                .place_ship_at(kind, origin, orientation)
                .map(|_| None),
            Command::ShuffleFleet => self.game.shuffle_fleet().map(|_| None),
            Command::SubmitFleet => self.game.submit_fleet().map(|_| None),
            Command::FireShot { x, y } => self.game.fire_shot(x, y),
            Command::Forfeit(reason) => self.game.forfeit(reason).map(|_| None),
            Command::Reconnect(transport) => {
                self.transport = Some(transport);
                self.game.connection_restored();
                Ok(None)
            }
        }
    }

    /// Push queued events to the presenter and queued requests to the
    /// authority.
    async fn flush(&mut self) {
        for event in self.game.drain_events() {
            if self.events.send(event).await.is_err() {
                log::debug!("event receiver dropped");
                break;
            }
        }
        let outbox = self.game.drain_outbox();
        let Some(transport) = self.transport.as_mut() else {
            if !outbox.is_empty() {
                log::warn!("{} outbound message(s) dropped while offline", outbox.len());
            }
            return;
        };
        for msg in outbox {
            if let Err(e) = transport.send(msg).await {
                log::warn!("send failed: {}", e);
                self.transport = None;
                self.game.connection_lost();
                break;
            }
        }
    }
}
