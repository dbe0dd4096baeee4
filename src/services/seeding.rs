//! Filling the team stores from the documents under `<data_dir>/teams`.

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::StorageConfig,
    dao::database::GameDatabase,
    error::ServiceResult,
    services::{team_loader::load_all_from_directory, team_view::TeamCatalog},
};

/// Inclusive-exclusive range of sample wins and losses handed out on bootstrap.
const SAMPLE_GAMES: std::ops::Range<u32> = 30..80;

/// Outcome of [`bootstrap_if_empty`].
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    /// Season that was checked.
    pub season: i32,
    /// The season already had standings, so nothing was loaded.
    pub already_populated: bool,
    /// Documents successfully normalized.
    pub loaded: usize,
    /// Teams whose record and profile were both written.
    pub created: usize,
}

/// Outcome of [`seed_records`].
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// Season that was seeded.
    pub season: i32,
    /// Rows removed by `--reset`.
    pub removed: u64,
    /// Standings rows before seeding.
    pub before: usize,
    /// Standings rows after seeding.
    pub after: usize,
    /// Documents normalized from disk.
    pub loaded: usize,
    /// Records inserted or replaced.
    pub upserted: usize,
}

/// Open the database named by `storage`, creating the schema if needed.
pub async fn open_game_database(storage: &StorageConfig) -> ServiceResult<GameDatabase> {
    let database = GameDatabase::open(&storage.db_path, storage.data_dir.clone()).await?;
    info!(
        db_path = %storage.db_path,
        data_dir = %storage.data_dir.display(),
        "game database opened"
    );
    Ok(database)
}

/// Populate an empty season from the team documents.
///
/// When the season already has standings this is a no-op. Otherwise every
/// document is written back as a complete team (record + stamped profile)
/// and given a sample win/loss record.
pub async fn bootstrap_if_empty(database: &GameDatabase, season: i32) -> ServiceResult<BootstrapReport> {
    let catalog = TeamCatalog::from_database(database);
    let mut report = BootstrapReport {
        season,
        ..BootstrapReport::default()
    };

    if !catalog.records().list_standings(None, None, season).await.is_empty() {
        report.already_populated = true;
        return Ok(report);
    }

    let teams = load_all_from_directory(database.data_dir(), season).await?;
    report.loaded = teams.len();
    info!(season, count = teams.len(), "bootstrapping empty season from team documents");

    for team in teams {
        let outcome = catalog
            .create_complete_team(&team.record, team.profile.to_document())
            .await;
        if !outcome.success {
            continue;
        }
        report.created += 1;

        let (wins, losses) = sample_record();
        if catalog
            .records()
            .update_win_loss(team.record.id, wins, losses, season)
            .await
            == 0
        {
            warn!(team_id = team.record.id, season, "sample record was not applied");
        }
    }

    info!(season, created = report.created, "bootstrap finished");
    Ok(report)
}

/// Upsert one record per team document, leaving profile files untouched.
///
/// With `reset` the season's rows are deleted first, which also clears
/// their win/loss counts.
pub async fn seed_records(database: &GameDatabase, season: i32, reset: bool) -> ServiceResult<SeedReport> {
    let records = database.records();
    let mut report = SeedReport {
        season,
        ..SeedReport::default()
    };

    if reset {
        report.removed = records.delete_season(season).await;
        info!(season, removed = report.removed, "cleared season before seeding");
    }

    report.before = records.list_standings(None, None, season).await.len();

    let teams = load_all_from_directory(database.data_dir(), season).await?;
    report.loaded = teams.len();

    for team in &teams {
        if records.upsert_record(&team.record).await > 0 {
            report.upserted += 1;
        }
    }

    report.after = records.list_standings(None, None, season).await.len();
    info!(
        season,
        upserted = report.upserted,
        before = report.before,
        after = report.after,
        "seeded team records"
    );
    Ok(report)
}

fn sample_record() -> (u32, u32) {
    let mut rng = rand::rng();
    (rng.random_range(SAMPLE_GAMES), rng.random_range(SAMPLE_GAMES))
}
