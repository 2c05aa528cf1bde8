use naval_duel::{
    protocol::{SessionStatePayload, WireShotResult},
    Cell, ConnectionState, Coord, EndReason, EngineConfig, GameEvent, GameOutcome, GameSession,
    OutboundMessage, Rejection, RemoteEvent, SessionStatus, ShipKind, Side, VirtualClock,
};

fn remote_game() -> GameSession<VirtualClock> {
    GameSession::remote(
        "r1",
        "alice",
        Side::First,
        EngineConfig::default(),
        VirtualClock::new(1_000),
        Some(8),
    )
}

fn state(status: SessionStatus, turn: Option<&str>) -> RemoteEvent {
    RemoteEvent::SessionState(SessionStatePayload {
        session_id: "r1".into(),
        status,
        players: vec!["alice".into(), "bob".into()],
        current_turn: turn.map(Into::into),
        turn_started_at: turn.map(|_| 2_000),
        game_started_at: turn.map(|_| 2_000),
    })
}

fn shot(shooter: &str, x: u8, y: u8, result: WireShotResult, next: Option<&str>) -> RemoteEvent {
    RemoteEvent::ShotFired {
        session_id: "r1".into(),
        shooter: shooter.into(),
        x,
        y,
        result,
        ship: None,
        next_turn: next.map(Into::into),
        turn_started_at: next.map(|_| 3_000),
    }
}

/// Remote game in `Active` with alice (local) to move.
fn active_game() -> GameSession<VirtualClock> {
    let mut game = remote_game();
    assert!(game.apply_remote(state(SessionStatus::Setup, None)));
    game.shuffle_fleet().unwrap();
    game.submit_fleet().unwrap();
    game.apply_remote(RemoteEvent::BoardSubmitted {
        session_id: "r1".into(),
        player_id: "bob".into(),
    });
    game.apply_remote(RemoteEvent::GameStarted {
        session_id: "r1".into(),
        current_turn: "alice".into(),
        turn_started_at: 2_000,
        game_started_at: 2_000,
    });
    game.drain_events();
    game.drain_outbox();
    game
}

#[test]
fn test_session_state_json_with_extra_fields() {
    let mut game = remote_game();
    let json = r#"{"type":"session_state","session_id":"r1","status":"waiting",
        "players":["alice","bob"],"current_turn":null,"lobby":{"stake":5},"version":3}"#;
    let event = RemoteEvent::from_json(json).unwrap();
    assert!(game.apply_remote(event));
    assert_eq!(game.status(), SessionStatus::Waiting);
    assert_eq!(game.session().side_of("bob"), Some(Side::Second));
    assert!(game.drain_events().contains(&GameEvent::StateChanged {
        status: SessionStatus::Waiting
    }));
}

#[test]
fn test_unknown_record_type_ignored() {
    let mut game = remote_game();
    let event = RemoteEvent::from_json(r#"{"type":"chat_message","text":"gl hf"}"#).unwrap();
    assert_eq!(event, RemoteEvent::Unknown);
    assert!(!game.apply_remote(event));
    assert_eq!(game.status(), SessionStatus::Created);
}

#[test]
fn test_player_joined_fills_empty_seat() {
    let mut game = remote_game();
    assert!(game.apply_remote(RemoteEvent::PlayerJoined {
        session_id: "r1".into(),
        player_id: "bob".into(),
    }));
    assert_eq!(game.session().player(Side::Second), Some("bob"));
    assert_eq!(game.status(), SessionStatus::Waiting);
}

#[test]
fn test_other_session_ignored() {
    let mut game = remote_game();
    let mut event = state(SessionStatus::Setup, None);
    if let RemoteEvent::SessionState(payload) = &mut event {
        payload.session_id = "other".into();
    }
    assert!(!game.apply_remote(event));
    assert_eq!(game.status(), SessionStatus::Created);
}

#[test]
fn test_submit_sends_board() {
    let mut game = remote_game();
    game.apply_remote(state(SessionStatus::Setup, None));
    game.shuffle_fleet().unwrap();
    game.submit_fleet().unwrap();
    assert_eq!(game.status(), SessionStatus::Setup);
    match game.drain_outbox().as_slice() {
        [OutboundMessage::SubmitBoard {
            session_id,
            player_id,
            ships,
        }] => {
            assert_eq!(session_id, "r1");
            assert_eq!(player_id, "alice");
            assert_eq!(ships.len(), 5);
        }
        other => panic!("unexpected outbox {:?}", other),
    }
    assert_eq!(game.submit_fleet(), Err(Rejection::AlreadySubmitted));
}

#[test]
fn test_game_started_hands_turn() {
    let game = active_game();
    assert_eq!(game.status(), SessionStatus::Active);
    assert_eq!(game.session().current_turn(), Some(Side::First));
    assert_eq!(game.session().game_started_at(), Some(2_000));
}

#[test]
fn test_optimistic_shot_confirmed_once() {
    let mut game = active_game();
    assert_eq!(game.fire_shot(4, 4), Ok(None));
    assert_eq!(game.pending_shots(), &[Coord::new(4, 4)]);
    assert_eq!(
        game.drain_outbox(),
        vec![OutboundMessage::FireShot {
            session_id: "r1".into(),
            player_id: "alice".into(),
            x: 4,
            y: 4,
        }]
    );
    assert_eq!(
        game.fire_shot(4, 4),
        Err(Rejection::AlreadyTargeted(Coord::new(4, 4)))
    );

    let confirm = shot("alice", 4, 4, WireShotResult::Hit, Some("alice"));
    assert!(game.apply_remote(confirm.clone()));
    assert!(game.pending_shots().is_empty());
    assert_eq!(game.board(Side::Second).cell(Coord::new(4, 4)), Cell::Hit);
    assert_eq!(game.stats(Side::First).hits, 1);

    // redelivery changes nothing
    assert!(!game.apply_remote(confirm));
    assert_eq!(game.stats(Side::First).shots, 1);
}

#[test]
fn test_next_turn_comes_from_authority() {
    let mut game = active_game();
    // a hit that the authority hands to the opponent anyway
    game.apply_remote(shot("alice", 0, 0, WireShotResult::Hit, Some("bob")));
    assert_eq!(game.session().current_turn(), Some(Side::Second));
    assert_eq!(game.session().turn_started_at(), Some(3_000));
    assert!(game.drain_events().contains(&GameEvent::TurnChanged {
        side: Side::Second,
        started_at: 3_000
    }));

    // without a next_turn field the owner stays put
    game.apply_remote(shot("bob", 9, 9, WireShotResult::Miss, None));
    assert_eq!(game.session().current_turn(), Some(Side::Second));
    assert_eq!(game.fire_shot(1, 1), Err(Rejection::NotYourTurn));
}

#[test]
fn test_opponent_shot_lands_on_local_fleet() {
    let mut game = active_game();
    let target = game.board(Side::First).ships()[0].cells()[0];
    game.apply_remote(shot("bob", target.x, target.y, WireShotResult::Hit, Some("bob")));
    assert_eq!(game.board(Side::First).cell(target), Cell::Hit);
    assert_eq!(game.stats(Side::Second).shots, 1);
}

#[test]
fn test_authority_wins_disagreement() {
    let mut game = active_game();
    let empty = Coord::all()
        .find(|&c| game.board(Side::First).cell(c) == Cell::Empty)
        .unwrap();
    game.apply_remote(shot("bob", empty.x, empty.y, WireShotResult::Hit, Some("bob")));
    assert_eq!(game.board(Side::First).cell(empty), Cell::Hit);
}

#[test]
fn test_turn_timeout_passes_turn() {
    let mut game = active_game();
    assert!(game.apply_remote(RemoteEvent::TurnTimeout {
        session_id: "r1".into(),
        player_id: "alice".into(),
        next_turn: "bob".into(),
        turn_started_at: 32_000,
    }));
    assert_eq!(game.session().current_turn(), Some(Side::Second));
    assert_eq!(game.session().turn_started_at(), Some(32_000));
}

#[test]
fn test_status_never_moves_backwards() {
    let mut game = active_game();
    game.apply_remote(state(SessionStatus::Setup, Some("bob")));
    assert_eq!(game.status(), SessionStatus::Active);
    assert_eq!(game.session().current_turn(), Some(Side::Second));
}

#[test]
fn test_ship_sunk_reveals_cells() {
    let mut game = active_game();
    let cells = vec![Coord::new(0, 0), Coord::new(1, 0)];
    game.apply_remote(shot("alice", 0, 0, WireShotResult::Hit, Some("alice")));
    game.apply_remote(RemoteEvent::ShotFired {
        session_id: "r1".into(),
        shooter: "alice".into(),
        x: 1,
        y: 0,
        result: WireShotResult::Sunk,
        ship: Some(ShipKind::Destroyer),
        next_turn: Some("alice".into()),
        turn_started_at: Some(4_000),
    });
    assert!(game.apply_remote(RemoteEvent::ShipSunk {
        session_id: "r1".into(),
        player_id: "bob".into(),
        ship: ShipKind::Destroyer,
        cells: Some(cells),
    }));
    let view = game.board(Side::Second).targeting_view();
    assert!(view.unresolved_hits().is_empty());
    assert_eq!(view.remaining, vec![5, 4, 3, 3]);
    assert_eq!(game.stats(Side::First).ships_sunk, 1);
}

#[test]
fn test_end_processing_blocks_shots() {
    let mut game = active_game();
    game.apply_remote(RemoteEvent::GameEndProcessing {
        session_id: "r1".into(),
    });
    assert_eq!(game.fire_shot(0, 0), Err(Rejection::EndPending));
    assert_eq!(game.status(), SessionStatus::Active);
}

#[test]
fn test_only_authority_completes_remote_game() {
    let mut game = active_game();
    let json = r#"{"type":"game_end_completed","session_id":"r1","winner":"bob",
        "reason":"fleet_destroyed","payout":"0.5"}"#;
    assert!(game.apply_remote(RemoteEvent::from_json(json).unwrap()));
    assert_eq!(game.status(), SessionStatus::Completed);
    let summary = game.summary().unwrap();
    assert_eq!(summary.outcome, GameOutcome::Winner(Side::Second));
    assert_eq!(
        summary.reason,
        EndReason::Authoritative("fleet_destroyed".into())
    );
    assert!(game.board(Side::First).is_frozen());
    assert_eq!(
        game.fire_shot(0, 0),
        Err(Rejection::WrongStatus(SessionStatus::Completed))
    );
}

#[test]
fn test_authoritative_end_replaces_local_forfeit() {
    let mut game = active_game();
    game.forfeit("left the table").unwrap();
    assert!(matches!(
        game.drain_outbox().as_slice(),
        [OutboundMessage::Forfeit { .. }]
    ));
    assert_eq!(
        game.summary().unwrap().reason,
        EndReason::Forfeit("left the table".into())
    );

    game.apply_remote(RemoteEvent::GameEndCompleted {
        session_id: "r1".into(),
        winner: None,
        reason: Some("abandoned".into()),
    });
    let summary = game.summary().unwrap();
    assert_eq!(summary.outcome, GameOutcome::Draw);
    assert_eq!(summary.reason, EndReason::Authoritative("abandoned".into()));
}

#[test]
fn test_connection_loss_blocks_shots_without_resend() {
    let mut game = active_game();
    game.fire_shot(2, 2).unwrap();
    game.drain_outbox();

    game.connection_lost();
    assert_eq!(game.connection(), ConnectionState::Disconnected);
    assert_eq!(game.fire_shot(3, 3), Err(Rejection::Disconnected));
    assert!(game.drain_events().contains(&GameEvent::ConnectionChanged { connected: false }));

    game.connection_restored();
    assert_eq!(game.connection(), ConnectionState::Connected);
    assert!(game.drain_outbox().is_empty());
    assert_eq!(game.pending_shots(), &[Coord::new(2, 2)]);
}

#[test]
fn test_error_record_surfaces_event() {
    let mut game = remote_game();
    let event =
        RemoteEvent::from_json(r#"{"type":"error","message":"not your turn","code":"E_TURN"}"#)
            .unwrap();
    assert!(game.apply_remote(event));
    assert!(game.drain_events().contains(&GameEvent::RemoteError {
        message: "not your turn".into()
    }));
}

#[test]
fn test_local_game_ignores_remote_records() {
    let mut game =
        GameSession::vs_ai("g1", "alice", EngineConfig::default(), VirtualClock::new(0), Some(1));
    assert!(!game.apply_remote(state(SessionStatus::Completed, None)));
    assert_eq!(game.status(), SessionStatus::Setup);
}

#[test]
fn test_refused_shot_can_be_fired_again() {
    let mut game = active_game();
    game.fire_shot(4, 4).unwrap();
    game.drain_outbox();

    assert!(game.apply_remote(RemoteEvent::Error {
        message: "shot rejected".into(),
        code: None,
    }));
    assert!(game.apply_remote(state(SessionStatus::Active, Some("alice"))));
    assert!(game.pending_shots().is_empty());
    assert_eq!(game.board(Side::Second).cell(Coord::new(4, 4)), Cell::Empty);

    assert_eq!(game.fire_shot(4, 4), Ok(None));
    assert_eq!(game.pending_shots(), &[Coord::new(4, 4)]);
}

#[test]
fn test_session_state_keeps_confirmed_shots() {
    let mut game = active_game();
    game.fire_shot(1, 1).unwrap();
    game.apply_remote(shot("alice", 1, 1, WireShotResult::Miss, Some("bob")));
    game.apply_remote(state(SessionStatus::Active, Some("bob")));
    assert!(game.pending_shots().is_empty());
    assert_eq!(game.board(Side::Second).cell(Coord::new(1, 1)), Cell::Miss);
    assert_eq!(game.stats(Side::First).shots, 1);
}

#[test]
fn test_unnamed_sink_still_counts() {
    let mut game = active_game();
    game.apply_remote(shot("alice", 0, 0, WireShotResult::Hit, Some("alice")));
    game.apply_remote(shot("alice", 1, 0, WireShotResult::Sunk, Some("alice")));
    assert_eq!(game.stats(Side::First).ships_sunk, 1);
    assert_eq!(game.stats(Side::First).hits, 2);

    game.apply_remote(RemoteEvent::ShipSunk {
        session_id: "r1".into(),
        player_id: "bob".into(),
        ship: ShipKind::Destroyer,
        cells: Some(vec![Coord::new(0, 0), Coord::new(1, 0)]),
    });
    let view = game.board(Side::Second).targeting_view();
    assert!(view.unresolved_hits().is_empty());
    assert_eq!(game.stats(Side::First).ships_sunk, 1);
}
