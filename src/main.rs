use std::path::PathBuf;

use clap::{Parser, Subcommand};
use naval_duel::{
    init_logging, targeting_for, Board, Clock, Command, Coord, Difficulty, EngineConfig,
    GameEvent, GameSession, GameSummary, SessionRunner, ShotOutcome, Side, Targeting,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Duration};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Engine settings in TOML; flags given here override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    difficulty: Option<Difficulty>,
    #[arg(long, global = true, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the computer in the terminal.
    Play,
    /// Let an autopilot play the computer and print the summary as JSON.
    Simulate {
        /// Strategy used by the autopilot on the first seat.
        #[arg(long, value_enum, default_value_t = Difficulty::Hard)]
        autopilot: Difficulty,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(s) = cli.seed {
        println!("Using fixed seed: {} (game will be reproducible)", s);
    }

    match cli.command {
        Commands::Play => play(config, cli.seed).await,
        Commands::Simulate { autopilot } => {
            let summary = simulate(config, cli.seed, autopilot).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn report(events: Vec<GameEvent>) {
    for event in events {
        match event {
            GameEvent::ShotResolved {
                shooter: Side::Second,
                coord,
                outcome,
            } => println!("Computer fires at {}: {}", coord, describe(outcome)),
            GameEvent::GameEnded { summary } => print_summary(&summary),
            _ => {}
        }
    }
}

fn describe(outcome: ShotOutcome) -> String {
    match outcome {
        ShotOutcome::Miss => "miss".into(),
        ShotOutcome::Hit => "hit".into(),
        ShotOutcome::Sunk(kind) => format!("sunk the {}", kind),
    }
}

fn print_summary(summary: &GameSummary) {
    match summary.winner() {
        Some(Side::First) => println!("You win! ({:?})", summary.reason),
        Some(Side::Second) => println!("The computer wins. ({:?})", summary.reason),
        None => println!("Draw. ({:?})", summary.reason),
    }
    let mine = summary.stats_for(Side::First);
    println!(
        "Shots: {}  Hits: {}  Accuracy: {}%  Ships sunk: {}",
        mine.shots, mine.hits, mine.accuracy, mine.ships_sunk
    );
}

async fn play(config: EngineConfig, seed: Option<u64>) -> anyhow::Result<()> {
    let mut game = GameSession::new_vs_ai("player", config, seed);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    game.shuffle_fleet()?;
    loop {
        println!("Your fleet:\n{}", game.board(Side::First));
        println!("Type 'shuffle' for another layout or 'go' to start.");
        match lines.next_line().await?.as_deref().map(str::trim) {
            Some("go") => break,
            Some("shuffle") => game.shuffle_fleet()?,
            Some(_) => continue,
            None => return Ok(()),
        }
    }
    game.submit_fleet()?;
    report(game.drain_events());

    while game.summary().is_none() {
        if game.session().current_turn() == Some(Side::First) {
            println!("Enemy waters:\n{}", game.board(Side::Second).render(false));
            println!("Your shot (e.g. B5, or 'quit'):");
            let Some(line) = lines.next_line().await? else {
                game.forfeit("input closed")?;
                break;
            };
            if line.trim() == "quit" {
                game.forfeit("quit")?;
            } else {
                match Coord::parse(&line) {
                    Some(coord) => match game.fire_shot(coord.x, coord.y) {
                        Ok(Some(outcome)) => println!("{}: {}", coord, describe(outcome)),
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    },
                    None => println!("Could not read {:?} as a cell.", line.trim()),
                }
            }
        } else {
            if let Some(deadline) = game.clock().next_deadline() {
                let wait = deadline.saturating_sub(game.clock().now());
                sleep(Duration::from_millis(wait)).await;
            }
            game.tick();
        }
        report(game.drain_events());
    }
    Ok(())
}

/// Autopilot on the first seat through a [`SessionRunner`]. What it knows of
/// the computer's board comes only from the event stream.
async fn simulate(
    mut config: EngineConfig,
    seed: Option<u64>,
    autopilot: Difficulty,
) -> anyhow::Result<GameSummary> {
    config.ai_delay_min_ms = 0;
    config.ai_delay_max_ms = 0;
    let game = GameSession::new_vs_ai("autopilot", config, seed);
    let (handle, mut events, task) = SessionRunner::spawn(game, None);

    let mut rng = match seed {
        Some(s) => SmallRng::seed_from_u64(s.wrapping_add(1)),
        None => SmallRng::from_rng(&mut rand::rng()),
    };
    let mut strategy = targeting_for(autopilot);
    let mut enemy = Board::new();

    handle.send(Command::ShuffleFleet).await??;
    handle.send(Command::SubmitFleet).await??;

    let mut my_turn = false;
    let mut summary = None;
    loop {
        while let Ok(event) = events.try_recv() {
            observe(event, &mut my_turn, &mut enemy, strategy.as_mut(), &mut summary)?;
        }
        if summary.is_some() {
            break;
        }
        if !my_turn {
            match events.recv().await {
                Some(event) => observe(event, &mut my_turn, &mut enemy, strategy.as_mut(), &mut summary)?,
                None => break,
            }
            continue;
        }
        let command = match strategy.select_target(&mut rng, &enemy.targeting_view()) {
            Some(target) => Command::FireShot {
                x: target.x,
                y: target.y,
            },
            None => Command::Forfeit("no targets left".into()),
        };
        if let Err(e) = handle.send(command).await? {
            log::warn!("autopilot command refused: {}", e);
            handle.send(Command::Forfeit(e.to_string())).await??;
        }
    }
    drop(handle);
    let finished = task.await??;
    summary
        .or(finished)
        .ok_or_else(|| anyhow::anyhow!("session stopped without a result"))
}

fn observe(
    event: GameEvent,
    my_turn: &mut bool,
    enemy: &mut Board,
    strategy: &mut dyn Targeting,
    summary: &mut Option<GameSummary>,
) -> anyhow::Result<()> {
    match event {
        GameEvent::TurnChanged { side, .. } => *my_turn = side == Side::First,
        GameEvent::ShotResolved {
            shooter: Side::First,
            coord,
            outcome,
        } => {
            enemy.apply_reported(coord, outcome)?;
            strategy.observe(coord, outcome, &enemy.targeting_view());
        }
        GameEvent::GameEnded { summary: s } => *summary = Some(s),
        _ => {}
    }
    Ok(())
}
