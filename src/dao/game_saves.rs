use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dao::{
    current_season,
    database::Db,
    models::{ENTRY_SCREEN, GameData, GameSave},
    now_rfc3339,
    storage::{StorageError, StorageResult},
};

/// Persistence seam for the single active game save.
///
/// Implementations absorb their own failures: a failed write reads as
/// `None` / `0`, exactly like "nothing to do".
pub trait GameSaveStore: Send + Sync {
    /// Deactivate every save, then insert a new active one.
    fn create_active_save(
        &self,
        player_team_id: i64,
        save_name: String,
    ) -> BoxFuture<'static, Option<GameSave>>;
    /// The save flagged active, if any.
    fn get_active_save(&self) -> BoxFuture<'static, Option<GameSave>>;
    /// Move the active save to `screen` and shallow-merge `updates` into its data.
    fn update_active_save(
        &self,
        screen: String,
        updates: Map<String, Value>,
    ) -> BoxFuture<'static, Option<GameSave>>;
    /// Remove the active save, returning the number of rows deleted.
    fn delete_active_save(&self) -> BoxFuture<'static, u64>;
}

#[derive(sqlx::FromRow)]
struct GameSaveRow {
    id: i64,
    save_name: String,
    player_team_id: Option<i64>,
    current_screen: String,
    game_data: Option<String>,
    is_active: bool,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<GameSaveRow> for GameSave {
    fn from(row: GameSaveRow) -> Self {
        let game_data = match row.game_data.as_deref() {
            None | Some("") => GameData::default(),
            Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)
                .map(GameData::from)
                .unwrap_or_else(|err| {
                    warn!(save_id = row.id, error = %err, "malformed game_data; using an empty payload");
                    GameData::default()
                }),
        };

        Self {
            id: row.id,
            save_name: row.save_name,
            player_team_id: row.player_team_id,
            current_screen: row.current_screen,
            game_data,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SQLite-backed [`GameSaveStore`] over the `game_saves` table.
#[derive(Clone)]
pub struct SqliteGameSaveStore {
    db: Db,
}

impl SqliteGameSaveStore {
    /// Build the store over an open pool.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Clear `is_active` everywhere, then insert the new active row.
    ///
    /// Both statements run in one transaction so a failed insert leaves the
    /// previous save active.
    pub async fn create(&self, player_team_id: i64, save_name: &str) -> Option<GameSave> {
        match self.try_create(player_team_id, save_name).await {
            Ok(save) => {
                info!(save_id = save.id, player_team_id, "created active game save");
                Some(save)
            }
            Err(err) => {
                warn!(player_team_id, error = %err, "failed to create game save");
                None
            }
        }
    }

    /// Fetch the active save with its payload decoded.
    pub async fn active(&self) -> Option<GameSave> {
        self.try_active().await.unwrap_or_else(|err| {
            warn!(error = %err, "failed to read active game save");
            None
        })
    }

    /// Merge `updates` into the active payload, stamp `lastUpdated`, and
    /// write the new screen and payload in a single UPDATE.
    pub async fn update(&self, screen: &str, updates: Map<String, Value>) -> Option<GameSave> {
        let Some(mut save) = self.active().await else {
            debug!(screen, "no active save to update");
            return None;
        };

        save.game_data.merge(updates);
        save.game_data
            .insert("lastUpdated", Value::String(now_rfc3339()));

        match self.try_update(save.id, screen, &save.game_data).await {
            Ok(0) => None,
            Ok(_) => self.try_by_id(save.id).await.unwrap_or_else(|err| {
                warn!(save_id = save.id, error = %err, "failed to reload updated game save");
                None
            }),
            Err(err) => {
                warn!(save_id = save.id, screen, error = %err, "failed to update game save");
                None
            }
        }
    }

    /// Delete the active row. Returns 0 or 1.
    pub async fn delete_active(&self) -> u64 {
        match sqlx::query("DELETE FROM game_saves WHERE is_active = 1")
            .execute(&self.db)
            .await
        {
            Ok(result) => result.rows_affected(),
            Err(err) => {
                warn!(error = %err, "failed to delete active game save");
                0
            }
        }
    }

    async fn try_create(&self, player_team_id: i64, save_name: &str) -> StorageResult<GameSave> {
        let game_data = GameData::initial(player_team_id, current_season(), &now_rfc3339());
        let payload = encode(&game_data)?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|source| StorageError::sql("begin save transaction", source))?;

        sqlx::query("UPDATE game_saves SET is_active = 0")
            .execute(&mut *tx)
            .await
            .map_err(|source| StorageError::sql("deactivate saves", source))?;

        let id = sqlx::query(
            "INSERT INTO game_saves (save_name, player_team_id, current_screen, game_data, is_active)
            VALUES ($1, $2, $3, $4, 1)",
        )
        .bind(save_name)
        .bind(player_team_id)
        .bind(ENTRY_SCREEN)
        .bind(payload)
        .execute(&mut *tx)
        .await
        .map_err(|source| StorageError::sql("insert game save", source))?
        .last_insert_rowid();

        tx.commit()
            .await
            .map_err(|source| StorageError::sql("commit save transaction", source))?;

        match self.try_by_id(id).await? {
            Some(save) => Ok(save),
            None => Ok(GameSave {
                id,
                save_name: save_name.to_string(),
                player_team_id: Some(player_team_id),
                current_screen: ENTRY_SCREEN.to_string(),
                game_data,
                is_active: true,
                created_at: None,
                updated_at: None,
            }),
        }
    }

    async fn try_active(&self) -> StorageResult<Option<GameSave>> {
        sqlx::query_as::<_, GameSaveRow>("SELECT * FROM game_saves WHERE is_active = 1 LIMIT 1")
            .fetch_optional(&self.db)
            .await
            .map(|row| row.map(Into::into))
            .map_err(|source| StorageError::sql("select active save", source))
    }

    async fn try_by_id(&self, id: i64) -> StorageResult<Option<GameSave>> {
        sqlx::query_as::<_, GameSaveRow>("SELECT * FROM game_saves WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map(|row| row.map(Into::into))
            .map_err(|source| StorageError::sql("select save by id", source))
    }

    async fn try_update(&self, id: i64, screen: &str, data: &GameData) -> StorageResult<u64> {
        let payload = encode(data)?;
        let result = sqlx::query(
            "UPDATE game_saves
            SET current_screen = $1, game_data = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND is_active = 1",
        )
        .bind(screen)
        .bind(payload)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(|source| StorageError::sql("update game save", source))?;

        Ok(result.rows_affected())
    }
}

fn encode(data: &GameData) -> StorageResult<String> {
    serde_json::to_string(data).map_err(|source| StorageError::json("game_data", source))
}

impl GameSaveStore for SqliteGameSaveStore {
    fn create_active_save(
        &self,
        player_team_id: i64,
        save_name: String,
    ) -> BoxFuture<'static, Option<GameSave>> {
        let store = self.clone();
        Box::pin(async move { store.create(player_team_id, &save_name).await })
    }

    fn get_active_save(&self) -> BoxFuture<'static, Option<GameSave>> {
        let store = self.clone();
        Box::pin(async move { store.active().await })
    }

    fn update_active_save(
        &self,
        screen: String,
        updates: Map<String, Value>,
    ) -> BoxFuture<'static, Option<GameSave>> {
        let store = self.clone();
        Box::pin(async move { store.update(&screen, updates).await })
    }

    fn delete_active_save(&self) -> BoxFuture<'static, u64> {
        let store = self.clone();
        Box::pin(async move { store.delete_active().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::database::open_in_memory;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    async fn store() -> SqliteGameSaveStore {
        SqliteGameSaveStore::new(open_in_memory().await.unwrap())
    }

    async fn active_rows(store: &SqliteGameSaveStore) -> Vec<i64> {
        sqlx::query_scalar("SELECT id FROM game_saves WHERE is_active = 1")
            .fetch_all(&store.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_starts_on_entry_screen_with_initial_payload() {
        let store = store().await;
        let save = store.create(12, "Season One").await.unwrap();

        assert!(save.is_active);
        assert_eq!(save.save_name, "Season One");
        assert_eq!(save.player_team_id, Some(12));
        assert_eq!(save.current_screen, ENTRY_SCREEN);
        assert_eq!(save.game_data.get("currentDay"), Some(&json!(1)));
        assert_eq!(save.game_data.get("playerTeamId"), Some(&json!(12)));
        assert_eq!(
            save.game_data.get("season"),
            Some(&json!(current_season()))
        );
    }

    #[tokio::test]
    async fn second_create_deactivates_the_first() {
        let store = store().await;
        let first = store.create(1, "first").await.unwrap();
        let second = store.create(2, "second").await.unwrap();

        assert_eq!(active_rows(&store).await, vec![second.id]);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_saves")
            .fetch_one(&store.db)
            .await
            .unwrap();
        assert_eq!(total, 2);

        let active = store.active().await.unwrap();
        assert_eq!(active.id, second.id);
        assert_ne!(active.id, first.id);
    }

    #[tokio::test]
    async fn updates_merge_into_game_data() {
        let store = store().await;
        store.create(3, "save").await.unwrap();

        store.update("teams", object(json!({"a": 1}))).await.unwrap();
        let updated = store.update("standings", object(json!({"b": 2}))).await.unwrap();

        assert_eq!(updated.current_screen, "standings");
        assert_eq!(updated.game_data.get("a"), Some(&json!(1)));
        assert_eq!(updated.game_data.get("b"), Some(&json!(2)));
        assert_eq!(updated.game_data.get("currentDay"), Some(&json!(1)));
        assert!(updated.game_data.get("lastUpdated").is_some());
    }

    #[tokio::test]
    async fn update_without_active_save_is_a_no_op() {
        let store = store().await;
        assert!(store.update("menu", Map::new()).await.is_none());
    }

    #[tokio::test]
    async fn delete_removes_only_the_active_row() {
        let store = store().await;
        store.create(1, "old").await.unwrap();
        store.create(2, "current").await.unwrap();

        assert_eq!(store.delete_active().await, 1);
        assert!(store.active().await.is_none());
        assert_eq!(store.delete_active().await, 0);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_saves")
            .fetch_one(&store.db)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn malformed_payload_reads_as_empty() {
        let store = store().await;
        let save = store.create(4, "broken").await.unwrap();
        sqlx::query("UPDATE game_saves SET game_data = 'not json' WHERE id = $1")
            .bind(save.id)
            .execute(&store.db)
            .await
            .unwrap();

        let active = store.active().await.unwrap();
        assert!(active.game_data.is_empty());
    }

    #[tokio::test]
    async fn trait_object_delegates_to_sqlite_store() {
        let store: Box<dyn GameSaveStore> = Box::new(store().await);
        let created = store.create_active_save(8, "boxed".into()).await.unwrap();
        let fetched = store.get_active_save().await.unwrap();
        assert_eq!(created.id, fetched.id);
        assert_eq!(store.delete_active_save().await, 1);
    }
}
