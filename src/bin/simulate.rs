use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use giant_chase_server::config::SessionConfig;
use giant_chase_server::engine::GameSession;
use giant_chase_server::error::ConfigError;
use giant_chase_server::types::{EndReason, Phase, Winner};
use rand::Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs headless all-AI chase games and reports outcomes")]
struct Cli {
    #[arg(long, default_value_t = 20)]
    games: u32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    board_size: Option<i32>,
    #[arg(long)]
    play_time: Option<u32>,
    #[arg(long)]
    participants: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: u32,
    seed: u64,
    winner: Winner,
    #[serde(rename = "endReason")]
    end_reason: Option<EndReason>,
    #[serde(rename = "playedSecs")]
    played_secs: u32,
    caught: usize,
    runners: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RunSummary {
    games: u32,
    #[serde(rename = "giantWins")]
    giant_wins: u32,
    #[serde(rename = "playerWins")]
    player_wins: u32,
    #[serde(rename = "averagePlayedSecs")]
    average_played_secs: f64,
    #[serde(rename = "averageCaughtRatio")]
    average_caught_ratio: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(board_size) = cli.board_size {
        config.board_size = board_size;
    }
    if let Some(play_time) = cli.play_time {
        config.game_play_time = play_time;
    }
    if let Some(participants) = cli.participants {
        config.max_participants = participants;
    }
    // Nobody is coming to the lobby.
    config.lobby_waiting_time = 1;
    config.validate()?;

    let base_seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let mut summary = RunSummary::default();
    let mut played_total = 0u64;
    let mut caught_ratio_total = 0.0;

    for game in 0..cli.games {
        let seed = base_seed.wrapping_add(u64::from(game));
        let line = run_game(&config, game, seed)?;
        println!("{}", serde_json::to_string(&line)?);

        summary.games += 1;
        match line.winner {
            Winner::Giant => summary.giant_wins += 1,
            Winner::Players => summary.player_wins += 1,
            Winner::None => {}
        }
        played_total += u64::from(line.played_secs);
        if line.runners > 0 {
            caught_ratio_total += line.caught as f64 / line.runners as f64;
        }
    }

    if summary.games > 0 {
        summary.average_played_secs = played_total as f64 / f64::from(summary.games);
        summary.average_caught_ratio = caught_ratio_total / f64::from(summary.games);
    }
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn run_game(config: &SessionConfig, game: u32, seed: u64) -> Result<GameResultLine, ConfigError> {
    let mut session = GameSession::new(config.clone(), seed)?.with_ai_only();
    let mut played_secs = 0;
    while session.phase() != Phase::Ended {
        let was_playing = session.phase() == Phase::Playing;
        session.tick();
        if was_playing {
            played_secs += 1;
        }
    }

    let registry = session.registry();
    Ok(GameResultLine {
        game,
        seed,
        winner: session.winner(),
        end_reason: session.end_reason(),
        played_secs,
        caught: registry.iter().filter(|player| player.is_caught()).count(),
        // Roles are cleared at the end; everyone but the giant was a runner.
        runners: registry.len().saturating_sub(1),
    })
}
