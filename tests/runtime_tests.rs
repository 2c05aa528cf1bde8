#![cfg(feature = "runtime")]

use std::time::Duration;

use naval_duel::{
    Command, EndReason, EngineConfig, GameEvent, GameSession, InMemoryTransport, OutboundMessage,
    Rejection, RemoteEvent, SessionRunner, SessionStatus, Side, SystemClock,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn wait_for(
    events: &mut mpsc::Receiver<GameEvent>,
    pred: impl Fn(&GameEvent) -> bool,
) -> GameEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("runner stopped");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

fn quick_config() -> EngineConfig {
    EngineConfig {
        ai_delay_min_ms: 0,
        ai_delay_max_ms: 5,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_runner_local_game_forfeit() -> anyhow::Result<()> {
    let game = GameSession::new_vs_ai("alice", quick_config(), Some(4));
    let (handle, mut events, task) = SessionRunner::spawn(game, None);

    assert_eq!(handle.send(Command::ShuffleFleet).await?, Ok(None));
    assert_eq!(handle.send(Command::SubmitFleet).await?, Ok(None));
    wait_for(&mut events, |e| {
        *e == GameEvent::StateChanged {
            status: SessionStatus::Active,
        }
    })
    .await;

    handle.send(Command::Forfeit("done".into())).await??;
    let summary = task.await??.expect("summary");
    assert_eq!(summary.winner(), Some(Side::Second));
    assert_eq!(summary.reason, EndReason::Forfeit("done".into()));
    Ok(())
}

#[tokio::test]
async fn test_runner_ai_answers_a_miss() -> anyhow::Result<()> {
    let game = GameSession::new_vs_ai("alice", quick_config(), Some(6));
    let (handle, mut events, _task) = SessionRunner::spawn(game, None);
    handle.send(Command::ShuffleFleet).await??;
    handle.send(Command::SubmitFleet).await??;

    // fire until a miss hands the turn over
    'outer: for y in 0..10u8 {
        for x in 0..10u8 {
            let outcome = handle.send(Command::FireShot { x, y }).await??;
            if outcome == Some(naval_duel::ShotOutcome::Miss) {
                break 'outer;
            }
        }
    }
    wait_for(&mut events, |e| {
        matches!(
            e,
            GameEvent::ShotResolved {
                shooter: Side::Second,
                ..
            }
        )
    })
    .await;
    Ok(())
}

#[tokio::test]
async fn test_runner_remote_session() -> anyhow::Result<()> {
    let (client, mut authority) = InMemoryTransport::pair();
    let game = GameSession::remote("r1", "alice", Side::First, quick_config(), SystemClock::new(), Some(2));
    let (handle, mut events, task) = SessionRunner::spawn(game, Some(Box::new(client)));

    authority.send_raw(
        r#"{"type":"session_state","session_id":"r1","status":"setup","players":["alice","bob"],"current_turn":null}"#,
    )?;
    wait_for(&mut events, |e| {
        *e == GameEvent::StateChanged {
            status: SessionStatus::Setup,
        }
    })
    .await;

    handle.send(Command::ShuffleFleet).await??;
    handle.send(Command::SubmitFleet).await??;
    let submitted = authority.recv_message().await.expect("client gone")?;
    assert!(matches!(submitted, OutboundMessage::SubmitBoard { ref ships, .. } if ships.len() == 5));

    authority.send_event(&RemoteEvent::GameStarted {
        session_id: "r1".into(),
        current_turn: "alice".into(),
        turn_started_at: 0,
        game_started_at: 0,
    })?;
    wait_for(&mut events, |e| matches!(e, GameEvent::TurnChanged { side: Side::First, .. })).await;

    assert_eq!(handle.send(Command::FireShot { x: 3, y: 7 }).await?, Ok(None));
    let fired = authority.recv_message().await.expect("client gone")?;
    assert_eq!(
        fired,
        OutboundMessage::FireShot {
            session_id: "r1".into(),
            player_id: "alice".into(),
            x: 3,
            y: 7,
        }
    );

    authority.send_raw(
        r#"{"type":"shot_fired","session_id":"r1","shooter":"alice","x":3,"y":7,"result":"miss","next_turn":"bob","turn_started_at":10}"#,
    )?;
    authority.send_raw("not json at all")?;
    authority.send_raw(
        r#"{"type":"game_end_completed","session_id":"r1","winner":"alice","reason":"opponent_left"}"#,
    )?;

    let summary = task.await??.expect("summary");
    assert_eq!(summary.winner(), Some(Side::First));
    assert_eq!(summary.stats_for(Side::First).shots, 1);
    Ok(())
}

#[tokio::test]
async fn test_runner_transport_loss() -> anyhow::Result<()> {
    let (client, authority) = InMemoryTransport::pair();
    let game = GameSession::remote("r1", "alice", Side::First, quick_config(), SystemClock::new(), None);
    let (handle, mut events, task) = SessionRunner::spawn(game, Some(Box::new(client)));

    drop(authority);
    wait_for(&mut events, |e| *e == GameEvent::ConnectionChanged { connected: false }).await;
    assert_eq!(
        handle.send(Command::SubmitFleet).await?,
        Err(Rejection::WrongStatus(SessionStatus::Created))
    );

    drop(handle);
    assert!(task.await??.is_none());
    Ok(())
}

#[tokio::test]
async fn test_runner_reconnects_after_transport_loss() -> anyhow::Result<()> {
    let (client, authority) = InMemoryTransport::pair();
    let game = GameSession::remote("r1", "alice", Side::First, quick_config(), SystemClock::new(), Some(3));
    let (handle, mut events, task) = SessionRunner::spawn(game, Some(Box::new(client)));

    drop(authority);
    wait_for(&mut events, |e| *e == GameEvent::ConnectionChanged { connected: false }).await;

    let (client, mut authority) = InMemoryTransport::pair();
    assert_eq!(handle.send(Command::Reconnect(Box::new(client))).await?, Ok(None));
    wait_for(&mut events, |e| *e == GameEvent::ConnectionChanged { connected: true }).await;

    authority.send_raw(
        r#"{"type":"session_state","session_id":"r1","status":"setup","players":["alice","bob"],"current_turn":null}"#,
    )?;
    wait_for(&mut events, |e| {
        *e == GameEvent::StateChanged {
            status: SessionStatus::Setup,
        }
    })
    .await;

    handle.send(Command::ShuffleFleet).await??;
    handle.send(Command::SubmitFleet).await??;
    let submitted = authority.recv_message().await.expect("client gone")?;
    assert!(matches!(submitted, OutboundMessage::SubmitBoard { ref player_id, .. } if player_id == "alice"));

    drop(handle);
    assert!(task.await??.is_none());
    Ok(())
}
