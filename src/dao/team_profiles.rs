use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, warn};

use crate::dao::{
    models::{ProfileDocument, merge_shallow},
    storage::{StorageError, StorageResult},
};

/// Subdirectory of the data directory that holds team documents.
pub const TEAMS_DIR: &str = "teams";

/// Document store keeping one `<id>.json` file per team.
#[derive(Debug, Clone)]
pub struct TeamProfileStore {
    teams_dir: PathBuf,
}

impl TeamProfileStore {
    /// Build a store rooted at `<data_dir>/teams`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            teams_dir: data_dir.as_ref().join(TEAMS_DIR),
        }
    }

    /// Directory the documents live in.
    pub fn teams_dir(&self) -> &Path {
        &self.teams_dir
    }

    fn path_for(&self, id: i64) -> PathBuf {
        self.teams_dir.join(format!("{id}.json"))
    }

    /// Read a team's profile.
    ///
    /// Absent when the file does not exist. A malformed file is logged and
    /// also reported as absent.
    pub async fn get_profile(&self, id: i64) -> Option<ProfileDocument> {
        match self.try_read(id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(team_id = id, error = %err, "failed to read team profile");
                None
            }
        }
    }

    /// Write the full document for a team, creating the directory if needed.
    pub async fn save_profile(&self, id: i64, profile: &ProfileDocument) -> bool {
        match self.try_write(id, profile).await {
            Ok(()) => true,
            Err(err) => {
                warn!(team_id = id, error = %err, "failed to save team profile");
                false
            }
        }
    }

    /// Shallow-merge `updates` over the stored profile and write it back.
    ///
    /// Only top-level keys are merged: an updated `stadium` replaces the old
    /// `stadium` object entirely. Returns `false` without writing anything
    /// when the team has no profile yet.
    pub async fn update_profile(&self, id: i64, updates: Map<String, Value>) -> bool {
        let Some(mut profile) = self.get_profile(id).await else {
            debug!(team_id = id, "no profile to update");
            return false;
        };

        merge_shallow(&mut profile, updates);
        self.save_profile(id, &profile).await
    }

    async fn try_read(&self, id: i64) -> StorageResult<Option<ProfileDocument>> {
        let path = self.path_for(id);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io(path, err)),
        };

        serde_json::from_str::<ProfileDocument>(&contents)
            .map(Some)
            .map_err(|source| StorageError::json(path.display().to_string(), source))
    }

    async fn try_write(&self, id: i64, profile: &ProfileDocument) -> StorageResult<()> {
        fs::create_dir_all(&self.teams_dir)
            .await
            .map_err(|source| StorageError::io(&self.teams_dir, source))?;

        let path = self.path_for(id);
        let body = serde_json::to_string_pretty(profile)
            .map_err(|source| StorageError::json(path.display().to_string(), source))?;
        fs::write(&path, body)
            .await
            .map_err(|source| StorageError::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_profile_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamProfileStore::new(dir.path());
        assert!(store.get_profile(42).await.is_none());
    }

    #[tokio::test]
    async fn save_creates_directory_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamProfileStore::new(dir.path().join("nested"));
        let profile = object(json!({"fullName": "Boston Red Sox", "founded": 1901}));

        assert!(store.save_profile(1, &profile).await);
        assert!(store.teams_dir().join("1.json").exists());
        assert_eq!(store.get_profile(1).await, Some(profile));
    }

    #[tokio::test]
    async fn malformed_profile_is_reported_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamProfileStore::new(dir.path());
        std::fs::create_dir_all(store.teams_dir()).unwrap();
        std::fs::write(store.teams_dir().join("5.json"), "{ not json").unwrap();

        assert!(store.get_profile(5).await.is_none());
    }

    #[tokio::test]
    async fn update_replaces_top_level_keys_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamProfileStore::new(dir.path());
        let profile = object(json!({
            "fullName": "Boston Red Sox",
            "stadium": {"name": "Fenway Park", "capacity": 37755}
        }));
        store.save_profile(1, &profile).await;

        assert!(
            store
                .update_profile(1, object(json!({"stadium": {"name": "X"}})))
                .await
        );

        let updated = store.get_profile(1).await.unwrap();
        assert_eq!(updated["stadium"], json!({"name": "X"}));
        assert_eq!(updated["fullName"], json!("Boston Red Sox"));
    }

    #[tokio::test]
    async fn update_without_profile_does_not_create_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = TeamProfileStore::new(dir.path());

        assert!(!store.update_profile(3, object(json!({"founded": 1900}))).await);
        assert!(store.get_profile(3).await.is_none());
    }

    #[tokio::test]
    async fn save_reports_failure_when_directory_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEAMS_DIR), "occupied").unwrap();
        let store = TeamProfileStore::new(dir.path());

        assert!(!store.save_profile(1, &Map::new()).await);
    }
}
