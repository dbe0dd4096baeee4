use sqlx::{QueryBuilder, Sqlite};
use tracing::warn;

use crate::dao::{
    database::Db,
    models::{NewTeamRecord, TeamRecord},
    storage::{StorageError, StorageResult},
};

const SELECT_RECORD: &str = "
    SELECT id, name, city, league, division, season, wins, losses, emoji,
           CAST(wins AS REAL) / NULLIF(wins + losses, 0) AS win_percentage
    FROM teams";

/// Data access object for the `teams` table.
#[derive(Clone)]
pub struct TeamRecordStore {
    db: Db,
}

impl TeamRecordStore {
    /// Build the store over an open pool.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert or fully replace the (id, season) row, resetting wins and losses to 0.
    ///
    /// Returns the number of rows written, 0 when the write failed.
    pub async fn upsert_record(&self, record: &NewTeamRecord) -> u64 {
        self.try_upsert(record).await.unwrap_or_else(|err| {
            warn!(team_id = record.id, season = record.season, error = %err, "failed to upsert team record");
            0
        })
    }

    /// Set absolute win/loss counts. Returns 0 when no (id, season) row exists.
    pub async fn update_win_loss(&self, id: i64, wins: u32, losses: u32, season: i32) -> u64 {
        let result = sqlx::query(
            "UPDATE teams SET wins = $1, losses = $2
            WHERE id = $3 AND season = $4",
        )
        .bind(wins)
        .bind(losses)
        .bind(id)
        .bind(season)
        .execute(&self.db)
        .await
        .map_err(|source| StorageError::sql("update win/loss", source));

        changes_or_log(result, id, season, "failed to update win/loss record")
    }

    /// Change the display glyph of a season row.
    pub async fn update_emoji(&self, id: i64, emoji: &str, season: i32) -> u64 {
        let result = sqlx::query(
            "UPDATE teams SET emoji = $1
            WHERE id = $2 AND season = $3",
        )
        .bind(emoji)
        .bind(id)
        .bind(season)
        .execute(&self.db)
        .await
        .map_err(|source| StorageError::sql("update emoji", source));

        changes_or_log(result, id, season, "failed to update team emoji")
    }

    /// Fetch one season row with its win percentage.
    pub async fn get_record(&self, id: i64, season: i32) -> Option<TeamRecord> {
        let query = format!("{SELECT_RECORD} WHERE id = $1 AND season = $2");
        sqlx::query_as::<_, TeamRecord>(&query)
            .bind(id)
            .bind(season)
            .fetch_optional(&self.db)
            .await
            .unwrap_or_else(|err| {
                warn!(team_id = id, season, error = %err, "failed to read team record");
                None
            })
    }

    /// Season standings, optionally narrowed to a league and/or division.
    ///
    /// Ordered by win percentage then raw wins, both descending. Teams that
    /// have not played have no percentage and sort last.
    pub async fn list_standings(
        &self,
        league: Option<&str>,
        division: Option<&str>,
        season: i32,
    ) -> Vec<TeamRecord> {
        self.try_list_standings(league, division, season)
            .await
            .unwrap_or_else(|err| {
                warn!(season, league, division, error = %err, "failed to list standings");
                Vec::new()
            })
    }

    /// Delete every row of a season. Used before reseeding.
    pub async fn delete_season(&self, season: i32) -> u64 {
        match sqlx::query("DELETE FROM teams WHERE season = $1")
            .bind(season)
            .execute(&self.db)
            .await
        {
            Ok(result) => result.rows_affected(),
            Err(err) => {
                warn!(season, error = %err, "failed to reset season records");
                0
            }
        }
    }

    async fn try_upsert(&self, record: &NewTeamRecord) -> StorageResult<u64> {
        let result = sqlx::query(
            "INSERT OR REPLACE INTO teams (id, name, city, league, division, season, wins, losses, emoji)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7)",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.city)
        .bind(&record.league)
        .bind(&record.division)
        .bind(record.season)
        .bind(&record.emoji)
        .execute(&self.db)
        .await
        .map_err(|source| StorageError::sql("upsert team record", source))?;

        Ok(result.rows_affected())
    }

    async fn try_list_standings(
        &self,
        league: Option<&str>,
        division: Option<&str>,
        season: i32,
    ) -> StorageResult<Vec<TeamRecord>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_RECORD);
        query.push(" WHERE season = ").push_bind(season);
        if let Some(league) = league {
            query.push(" AND league = ").push_bind(league);
        }
        if let Some(division) = division {
            query.push(" AND division = ").push_bind(division);
        }
        query.push(" ORDER BY win_percentage DESC, wins DESC");

        query
            .build_query_as::<TeamRecord>()
            .fetch_all(&self.db)
            .await
            .map_err(|source| StorageError::sql("list standings", source))
    }
}

fn changes_or_log(
    result: StorageResult<sqlx::sqlite::SqliteQueryResult>,
    id: i64,
    season: i32,
    message: &'static str,
) -> u64 {
    match result {
        Ok(result) => result.rows_affected(),
        Err(err) => {
            warn!(team_id = id, season, error = %err, "{message}");
            0
        }
    }
}
