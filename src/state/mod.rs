//! Game session facade: the single active save plus its observers.

pub mod listeners;
pub mod session;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    dao::{
        database::GameDatabase,
        game_saves::GameSaveStore,
        models::{GameData, GameSave},
    },
    services::team_view::{CompleteTeamData, TeamCatalog},
};

pub use self::listeners::{GameStateListener, ListenerError, ListenerId, ListenerRegistry};
pub use self::session::{
    InvalidTransition, SessionEvent, SessionMachine, SessionSnapshot, SessionState,
};

/// Save label used when the caller does not name the save.
pub const DEFAULT_SAVE_NAME: &str = "Default Save";
/// Screen reported when no save is active.
pub const FALLBACK_SCREEN: &str = "menu";

/// Owner of the live game session.
///
/// Transitions take `&mut self` and write through to the save store before
/// the in-memory state changes, so the state always mirrors the last
/// successful write.
pub struct GameState {
    store: Arc<dyn GameSaveStore>,
    teams: TeamCatalog,
    machine: SessionMachine,
    listeners: ListenerRegistry,
}

impl GameState {
    /// Build a facade over a save store and the team catalog. Starts with no save.
    pub fn new(store: Arc<dyn GameSaveStore>, teams: TeamCatalog) -> Self {
        Self {
            store,
            teams,
            machine: SessionMachine::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Build a facade over the stores of an opened database.
    pub fn from_database(database: &GameDatabase) -> Self {
        Self::new(
            Arc::new(database.saves().clone()),
            TeamCatalog::from_database(database),
        )
    }

    /// Load the active save from the store and notify listeners.
    pub async fn initialize(&mut self) -> Option<&GameSave> {
        let save = self.store.get_active_save().await;
        match &save {
            Some(save) => info!(save_id = save.id, screen = %save.current_screen, "resuming active save"),
            None => info!("no active save found"),
        }
        self.transition(SessionEvent::Restored(save));
        self.state().active_save()
    }

    /// Start a new game for `player_team_id`.
    ///
    /// The store deactivates the previous save (it is kept, not deleted).
    /// On a failed write the session is left untouched and `None` is returned.
    pub async fn create_new_game(
        &mut self,
        player_team_id: i64,
        save_name: Option<&str>,
    ) -> Option<&GameSave> {
        let save_name = save_name.unwrap_or(DEFAULT_SAVE_NAME).to_string();
        let Some(save) = self
            .store
            .create_active_save(player_team_id, save_name)
            .await
        else {
            warn!(player_team_id, "new game was not created");
            return None;
        };

        self.transition(SessionEvent::GameCreated(save));
        self.state().active_save()
    }

    /// Move the active save to `screen`, shallow-merging `updates` into its data.
    ///
    /// Returns `false` without touching the store when no save is active, or
    /// when the write did not go through.
    pub async fn set_current_screen(&mut self, screen: &str, updates: Map<String, Value>) -> bool {
        if !self.has_active_game() {
            debug!(screen, "ignoring screen change without an active save");
            return false;
        }

        match self
            .store
            .update_active_save(screen.to_string(), updates)
            .await
        {
            Some(save) => self.transition(SessionEvent::ScreenChanged(save)),
            None => {
                warn!(screen, "screen change was not persisted");
                false
            }
        }
    }

    /// Delete the active save. The session ends even if nothing was deleted.
    pub async fn delete_game(&mut self) -> u64 {
        let removed = self.store.delete_active_save().await;
        info!(removed, "active save deleted");
        self.transition(SessionEvent::GameDeleted);
        removed
    }

    /// Register a state listener; returns a handle for [`Self::remove_listener`].
    pub fn add_listener(&mut self, listener: impl GameStateListener + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    /// Unregister a listener. Returns `false` for an unknown handle.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    /// Current state with its version.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// Whether a save is active.
    pub fn has_active_game(&self) -> bool {
        self.state().active_save().is_some()
    }

    /// Screen the UI should show, [`FALLBACK_SCREEN`] without a save.
    pub fn current_screen(&self) -> &str {
        self.state()
            .active_save()
            .map_or(FALLBACK_SCREEN, |save| save.current_screen.as_str())
    }

    /// Team the player controls.
    pub fn player_team_id(&self) -> Option<i64> {
        self.state().active_save().and_then(|save| save.player_team_id)
    }

    /// Progress payload of the active save, empty without one.
    pub fn game_data(&self) -> GameData {
        self.state()
            .active_save()
            .map(|save| save.game_data.clone())
            .unwrap_or_default()
    }

    /// Combined record + profile view of the player's team for `season`.
    pub async fn player_team_data(&self, season: i32) -> Option<CompleteTeamData> {
        let team_id = self.player_team_id()?;
        self.teams.get_complete_team_data(team_id, season).await
    }

    fn transition(&mut self, event: SessionEvent) -> bool {
        match self.machine.apply(event) {
            Ok(snapshot) => {
                self.listeners.notify(&snapshot);
                true
            }
            Err(err) => {
                warn!(error = %err, "rejected session transition");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use serde_json::json;

    use super::*;
    use crate::dao::{
        database::open_in_memory,
        models::ENTRY_SCREEN,
        team_profiles::TeamProfileStore,
        team_records::TeamRecordStore,
    };

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    async fn facade(dir: &tempfile::TempDir) -> GameState {
        let database = GameDatabase::new(open_in_memory().await.unwrap(), dir.path());
        GameState::from_database(&database)
    }

    /// Store whose writes always fail.
    struct FailingStore;

    impl GameSaveStore for FailingStore {
        fn create_active_save(&self, _: i64, _: String) -> BoxFuture<'static, Option<GameSave>> {
            Box::pin(async { None })
        }
        fn get_active_save(&self) -> BoxFuture<'static, Option<GameSave>> {
            Box::pin(async { None })
        }
        fn update_active_save(
            &self,
            _: String,
            _: Map<String, Value>,
        ) -> BoxFuture<'static, Option<GameSave>> {
            Box::pin(async { None })
        }
        fn delete_active_save(&self) -> BoxFuture<'static, u64> {
            Box::pin(async { 0 })
        }
    }

    #[tokio::test]
    async fn starts_without_a_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = facade(&dir).await;

        assert!(state.initialize().await.is_none());
        assert!(!state.has_active_game());
        assert_eq!(state.current_screen(), FALLBACK_SCREEN);
        assert_eq!(state.player_team_id(), None);
        assert!(state.game_data().is_empty());
        assert!(state.player_team_data(2025).await.is_none());
    }

    #[tokio::test]
    async fn create_then_change_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = facade(&dir).await;

        let save = state.create_new_game(7, None).await.unwrap();
        assert_eq!(save.save_name, DEFAULT_SAVE_NAME);
        assert_eq!(state.current_screen(), ENTRY_SCREEN);
        assert_eq!(state.player_team_id(), Some(7));

        assert!(
            state
                .set_current_screen("standings", object(json!({"currentDay": 4})))
                .await
        );
        assert_eq!(state.current_screen(), "standings");
        assert_eq!(state.game_data().get("currentDay"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn screen_change_without_game_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = facade(&dir).await;
        assert!(!state.set_current_screen("teams", Map::new()).await);
        assert_eq!(state.snapshot().version, 0);
    }

    #[tokio::test]
    async fn initialize_resumes_a_persisted_save() {
        let dir = tempfile::tempdir().unwrap();
        let database = GameDatabase::new(open_in_memory().await.unwrap(), dir.path());

        let mut first = GameState::from_database(&database);
        first.create_new_game(3, Some("Boston Red Sox Manager")).await;
        first.set_current_screen("teams", Map::new()).await;

        let mut second = GameState::from_database(&database);
        let resumed = second.initialize().await.unwrap();
        assert_eq!(resumed.save_name, "Boston Red Sox Manager");
        assert_eq!(second.current_screen(), "teams");
    }

    #[tokio::test]
    async fn delete_ends_the_session_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = facade(&dir).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.add_listener(move |snapshot: &SessionSnapshot| -> Result<(), ListenerError> {
            sink.lock().unwrap().push(snapshot.state.active_save().is_some());
            Ok(())
        });

        state.create_new_game(1, None).await;
        assert_eq!(state.delete_game().await, 1);
        assert!(!state.has_active_game());
        assert_eq!(state.delete_game().await, 0);

        assert_eq!(*seen.lock().unwrap(), vec![true, false, false]);
    }

    #[tokio::test]
    async fn removed_listener_is_not_called() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = facade(&dir).await;
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let id = state.add_listener(move |_: &SessionSnapshot| -> Result<(), ListenerError> {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        state.create_new_game(1, None).await;
        assert!(state.remove_listener(id));
        state.delete_game().await;

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_writes_leave_the_session_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_in_memory().await.unwrap();
        let teams = TeamCatalog::new(TeamRecordStore::new(db), TeamProfileStore::new(dir.path()));
        let mut state = GameState::new(Arc::new(FailingStore), teams);

        assert!(state.create_new_game(1, None).await.is_none());
        assert!(!state.has_active_game());
        assert_eq!(state.snapshot().version, 0);
    }

    #[tokio::test]
    async fn player_team_data_joins_both_halves() {
        let dir = tempfile::tempdir().unwrap();
        let database = GameDatabase::new(open_in_memory().await.unwrap(), dir.path());
        database
            .profiles()
            .save_profile(5, &object(json!({"fullName": "Houston Astros"})))
            .await;

        let mut state = GameState::from_database(&database);
        state.create_new_game(5, None).await;

        let team = state.player_team_data(2025).await.unwrap();
        assert!(team.has_profile);
        assert!(!team.has_record);
    }
}
