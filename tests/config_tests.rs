use naval_duel::{Difficulty, EngineConfig};

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.placement_attempts, 1000);
    assert_eq!((config.ai_delay_min_ms, config.ai_delay_max_ms), (1000, 3000));
    assert_eq!(config.difficulty, Difficulty::Medium);
    assert!(!config.ai_first);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = EngineConfig::from_toml_str(
        r#"
        difficulty = "hard"
        ai_delay_min_ms = 200
        ai_delay_max_ms = 400
        "#,
    )
    .unwrap();
    assert_eq!(config.difficulty, Difficulty::Hard);
    assert_eq!(config.ai_delay_min_ms, 200);
    assert_eq!(config.shuffle_attempts, 64);
    assert_eq!(config.turn_limit_secs, 30);
}

#[test]
fn test_inverted_delay_rejected() {
    let err = EngineConfig::from_toml_str("ai_delay_min_ms = 5000").unwrap_err();
    assert!(err.to_string().contains("ai_delay_min_ms"));
}

#[test]
fn test_zero_attempts_rejected() {
    assert!(EngineConfig::from_toml_str("placement_attempts = 0").is_err());
}

#[test]
fn test_unknown_difficulty_rejected() {
    assert!(EngineConfig::from_toml_str(r#"difficulty = "nightmare""#).is_err());
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("naval-duel-{}.toml", std::process::id()));
    std::fs::write(&path, "ai_first = true\ngame_limit_secs = 600\n").unwrap();
    let config = EngineConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(config.ai_first);
    assert_eq!(config.game_limit_secs, 600);
    assert!(EngineConfig::load(&path).is_err());
}
