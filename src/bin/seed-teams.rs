//! Load every team document into the `teams` table for the current season.
//!
//! Usage: `seed-teams [--reset]`, with `DB_PATH` and `DATA_DIR` overrides.
//! Profile documents are left as they are.

use std::env;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dugout::{
    config::StorageConfig,
    dao::current_season,
    services::seeding::{open_game_database, seed_records},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let reset = env::args().skip(1).any(|arg| arg == "--reset");
    let storage = StorageConfig::from_env();
    let season = current_season();
    info!(
        db_path = %storage.db_path,
        data_dir = %storage.data_dir.display(),
        season,
        reset,
        "seeding team records"
    );

    let database = open_game_database(&storage)
        .await
        .context("opening game database")?;
    let result = seed_records(&database, season, reset).await;
    database.close().await;
    let report = result.context("seeding team records")?;

    println!(
        "Done. Inserted/updated: {}. Teams before: {}, after: {}.",
        report.upserted, report.before, report.after
    );
    Ok(())
}

fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
