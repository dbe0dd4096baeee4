//! Combined record + profile view of a team.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dao::{
    database::GameDatabase,
    models::{NewTeamRecord, ProfileDocument, TeamRecord, some_or_empty_object},
    now_rfc3339,
    team_profiles::TeamProfileStore,
    team_records::TeamRecordStore,
};

/// Both halves of a team, with flags telling which ones exist.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTeamData {
    /// Season row, serialized as `{}` when missing.
    #[serde(serialize_with = "some_or_empty_object")]
    pub record: Option<TeamRecord>,
    /// Profile document, empty when missing.
    pub profile: ProfileDocument,
    /// Whether the season row exists.
    pub has_record: bool,
    /// Whether the profile document exists.
    pub has_profile: bool,
}

/// Result of writing both halves of a team.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamOutcome {
    /// Rows written to `teams`.
    pub record_changes: u64,
    /// Whether the profile document was written.
    pub profile_saved: bool,
    /// Both writes went through.
    pub success: bool,
}

/// Read/write access to teams across the relational and document stores.
#[derive(Clone)]
pub struct TeamCatalog {
    records: TeamRecordStore,
    profiles: TeamProfileStore,
}

impl TeamCatalog {
    /// Build the catalog over the two stores.
    pub fn new(records: TeamRecordStore, profiles: TeamProfileStore) -> Self {
        Self { records, profiles }
    }

    /// Build the catalog from an opened database bundle.
    pub fn from_database(database: &GameDatabase) -> Self {
        Self::new(database.records().clone(), database.profiles().clone())
    }

    /// Record half.
    pub fn records(&self) -> &TeamRecordStore {
        &self.records
    }

    /// Profile half.
    pub fn profiles(&self) -> &TeamProfileStore {
        &self.profiles
    }

    /// Join a team's season row with its profile.
    ///
    /// `None` only when neither half exists.
    pub async fn get_complete_team_data(&self, id: i64, season: i32) -> Option<CompleteTeamData> {
        let record = self.records.get_record(id, season).await;
        let profile = self.profiles.get_profile(id).await;

        if record.is_none() && profile.is_none() {
            debug!(team_id = id, season, "team has neither record nor profile");
            return None;
        }

        Some(CompleteTeamData {
            has_record: record.is_some(),
            has_profile: profile.is_some(),
            record,
            profile: profile.unwrap_or_default(),
        })
    }

    /// Write the season row and the profile document of a team.
    ///
    /// The stored profile starts with `teamId` (always the record id) and
    /// ends with `createdAt`. The two writes are independent: a failed
    /// profile write does not roll back the record.
    pub async fn create_complete_team(
        &self,
        record: &NewTeamRecord,
        profile: ProfileDocument,
    ) -> CreateTeamOutcome {
        let record_changes = self.records.upsert_record(record).await;

        let mut document = Map::with_capacity(profile.len() + 2);
        document.insert("teamId".into(), Value::from(record.id));
        document.extend(
            profile
                .into_iter()
                .filter(|(key, _)| key != "teamId" && key != "createdAt"),
        );
        document.insert("createdAt".into(), Value::String(now_rfc3339()));

        let profile_saved = self.profiles.save_profile(record.id, &document).await;
        let success = record_changes > 0 && profile_saved;

        if success {
            info!(team_id = record.id, season = record.season, "created complete team");
        } else {
            warn!(
                team_id = record.id,
                record_changes, profile_saved, "team was only partially written"
            );
        }

        CreateTeamOutcome {
            record_changes,
            profile_saved,
            success,
        }
    }
}
