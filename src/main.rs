//! Dugout shell entrypoint: opens the database, seeds an empty season and
//! reports the standings and the session to resume.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dugout::{
    config::AppConfig,
    dao::{
        current_season,
        models::{DEFAULT_EMOJI, TeamRecord},
    },
    services::seeding::{bootstrap_if_empty, open_game_database},
    state::{GameState, ListenerError, SessionSnapshot},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    info!(language = config.settings.language(), "settings ready");

    let database = open_game_database(&config.storage)
        .await
        .context("opening game database")?;

    let season = current_season();
    let report = bootstrap_if_empty(&database, season)
        .await
        .context("bootstrapping team data")?;
    if !report.already_populated {
        info!(season, created = report.created, "seeded empty season");
    }

    let mut game = GameState::from_database(&database);
    game.add_listener(|snapshot: &SessionSnapshot| -> Result<(), ListenerError> {
        info!(version = snapshot.version, "session changed");
        Ok(())
    });
    game.initialize().await;

    let standings = database.records().list_standings(None, None, season).await;
    print_standings(season, &standings);
    print_session(&game, season).await;

    database.close().await;
    Ok(())
}

fn print_standings(season: i32, standings: &[TeamRecord]) {
    println!("Standings {season}");
    for (rank, team) in standings.iter().enumerate() {
        let pct = team
            .win_percentage
            .map_or_else(|| "-".to_string(), |pct| format!("{pct:.3}"));
        println!(
            "{:>2}. {} {:<28} {:>3}-{:<3} {:>5}  {} {}",
            rank + 1,
            team.emoji.as_deref().unwrap_or(DEFAULT_EMOJI),
            team.display_name(),
            team.wins,
            team.losses,
            pct,
            team.league,
            team.division,
        );
    }
}

async fn print_session(game: &GameState, season: i32) {
    if !game.has_active_game() {
        println!("No saved game. Start from the {} screen.", game.current_screen());
        return;
    }

    let team = game
        .player_team_data(season)
        .await
        .and_then(|team| team.record)
        .map_or_else(|| "unknown team".to_string(), |record| record.display_name());
    println!("Resuming {team} on the {} screen.", game.current_screen());
}

/// Log to stderr so stdout carries only the standings and session report.
/// `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
