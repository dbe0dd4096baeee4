//! Opening the SQLite database and bundling the stores built on top of it.

use std::{path::PathBuf, str::FromStr};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::info;

use crate::dao::{
    game_saves::SqliteGameSaveStore,
    storage::{StorageError, StorageResult},
    team_profiles::TeamProfileStore,
    team_records::TeamRecordStore,
};

/// Shared handle to the SQLite pool.
pub type Db = SqlitePool;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS teams (
        id INTEGER NOT NULL,
        name TEXT NOT NULL,
        city TEXT NOT NULL,
        league TEXT NOT NULL,
        division TEXT NOT NULL,
        season INTEGER NOT NULL,
        wins INTEGER NOT NULL DEFAULT 0,
        losses INTEGER NOT NULL DEFAULT 0,
        emoji TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(id, season)
    )",
    "CREATE TABLE IF NOT EXISTS game_saves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        save_name TEXT NOT NULL,
        player_team_id INTEGER,
        current_screen TEXT NOT NULL DEFAULT 'menu',
        game_data TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
        is_active INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_teams_season ON teams(season)",
    "CREATE INDEX IF NOT EXISTS idx_teams_league_division ON teams(league, division)",
    "CREATE INDEX IF NOT EXISTS idx_game_saves_active ON game_saves(is_active)",
];

/// Open (creating if needed) the database file at `path` and ensure the schema exists.
pub async fn open(path: &str) -> StorageResult<Db> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let db = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|source| StorageError::sql("open database file", source))?;

    ensure_schema(&db).await?;
    info!(path, "database ready");
    Ok(db)
}

/// Open a private in-memory database.
///
/// The pool is pinned to one connection that never expires, otherwise every
/// new connection would see its own empty database.
pub async fn open_in_memory() -> StorageResult<Db> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|source| StorageError::sql("parse in-memory url", source))?;
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|source| StorageError::sql("open in-memory database", source))?;

    ensure_schema(&db).await?;
    Ok(db)
}

async fn ensure_schema(db: &Db) -> StorageResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(db)
            .await
            .map_err(|source| StorageError::sql("create schema", source))?;
    }
    Ok(())
}

/// Every store of the game, built over one pool and one data directory.
///
/// Constructed once at startup and handed to the seeding code and to the
/// game state facade.
#[derive(Clone)]
pub struct GameDatabase {
    db: Db,
    records: TeamRecordStore,
    profiles: TeamProfileStore,
    saves: SqliteGameSaveStore,
    data_dir: PathBuf,
}

impl GameDatabase {
    /// Bundle the stores over an already opened pool.
    pub fn new(db: Db, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            records: TeamRecordStore::new(db.clone()),
            profiles: TeamProfileStore::new(&data_dir),
            saves: SqliteGameSaveStore::new(db.clone()),
            db,
            data_dir,
        }
    }

    /// Open the database file and bundle the stores.
    pub async fn open(db_path: &str, data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let db = open(db_path).await?;
        Ok(Self::new(db, data_dir))
    }

    /// Raw pool handle.
    pub fn pool(&self) -> &Db {
        &self.db
    }

    /// Relational team records.
    pub fn records(&self) -> &TeamRecordStore {
        &self.records
    }

    /// Team profile documents.
    pub fn profiles(&self) -> &TeamProfileStore {
        &self.profiles
    }

    /// Game saves.
    pub fn saves(&self) -> &SqliteGameSaveStore {
        &self.saves
    }

    /// Directory holding the `teams` document folder.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.db.close().await;
    }
}
