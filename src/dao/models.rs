use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use serde_with::skip_serializing_none;

/// Fallback glyph for teams missing from the emoji table.
pub const DEFAULT_EMOJI: &str = "⚾";
/// Screen a freshly created save starts on.
pub const ENTRY_SCREEN: &str = "game";
/// Version stamped into every new `game_data` payload.
pub const GAME_DATA_VERSION: u32 = 1;

/// JSON object persisted as a team profile document.
pub type ProfileDocument = Map<String, Value>;

/// Team identity for one season, as written by seeding and the loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTeamRecord {
    /// Team identifier shared with the profile document.
    pub id: i64,
    /// Club name without the city (e.g. "Red Sox").
    pub name: String,
    /// Home city (e.g. "Boston").
    pub city: String,
    /// League the team plays in.
    pub league: String,
    /// Division inside the league.
    pub division: String,
    /// Season year this row belongs to.
    pub season: i32,
    /// Display glyph.
    pub emoji: String,
}

/// Season row of the `teams` table with its computed win percentage.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct TeamRecord {
    /// Team identifier.
    pub id: i64,
    /// Club name without the city.
    pub name: String,
    /// Home city.
    pub city: String,
    /// League the team plays in.
    pub league: String,
    /// Division inside the league.
    pub division: String,
    /// Season year.
    pub season: i32,
    /// Games won this season.
    pub wins: u32,
    /// Games lost this season.
    pub losses: u32,
    /// Display glyph.
    pub emoji: Option<String>,
    /// `wins / (wins + losses)`, absent before the first game.
    pub win_percentage: Option<f64>,
}

impl TeamRecord {
    /// "City Name" label used by menus.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.city, self.name)
    }
}

/// Open JSON payload stored in `game_saves.game_data`.
///
/// Kept loosely typed so new progress fields can be added without a schema
/// change. Updates are shallow: a top-level key in the update replaces the
/// stored value wholesale, nested objects included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GameData(Map<String, Value>);

impl GameData {
    /// Payload written when a new game starts.
    pub fn initial(player_team_id: i64, season: i32, started_at: &str) -> Self {
        let value = json!({
            "version": GAME_DATA_VERSION,
            "playerTeamId": player_team_id,
            "season": season,
            "gameStarted": started_at,
            "currentDay": 1,
            "gameProgress": {
                "tutorialCompleted": false,
                "seasonsPlayed": 0
            }
        });
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Overwrite top-level keys with the ones from `updates`.
    pub fn merge(&mut self, updates: Map<String, Value>) {
        merge_shallow(&mut self.0, updates);
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a single top-level key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Whether the payload carries no keys at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for GameData {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// A row of `game_saves` with its `game_data` column decoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSave {
    /// Auto-increment save id.
    pub id: i64,
    /// Free-text save label.
    pub save_name: String,
    /// Team the player controls.
    pub player_team_id: Option<i64>,
    /// Screen token the UI should resume on.
    pub current_screen: String,
    /// Progress payload.
    pub game_data: GameData,
    /// Whether this is the live session.
    pub is_active: bool,
    /// Creation timestamp as written by SQLite.
    pub created_at: Option<String>,
    /// Last write timestamp as written by SQLite.
    pub updated_at: Option<String>,
}

/// Shallow merge: every top-level key in `updates` replaces the target's value.
pub fn merge_shallow(target: &mut Map<String, Value>, updates: Map<String, Value>) {
    for (key, value) in updates {
        target.insert(key, value);
    }
}

/// Serialize `None` as an empty JSON object instead of `null`.
pub(crate) fn some_or_empty_object<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: serde::Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => Map::new().serialize(serializer),
    }
}
