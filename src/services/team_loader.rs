//! Turning raw team documents into canonical record + profile pairs.
//!
//! Team files come in two shapes. The canonical one uses `stadium`,
//! `management` and `fanbase` with camelCase fields; the alternate one uses
//! `home_field`, `front_office` and `social` with snake_case fields. Each
//! profile section is read in two passes (canonical first, alternate second)
//! into a [`Section`], and every section has a full default so consumers
//! never see a missing key.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, DeserializeOwned},
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    dao::{
        current_season,
        models::{NewTeamRecord, ProfileDocument},
        team_profiles::TEAMS_DIR,
    },
    services::team_emojis::team_emoji,
};

const FALLBACK_ID: i64 = 1;
const UNKNOWN: &str = "Unknown";
const UNKNOWN_CITY: &str = "Unknown City";
const UNKNOWN_TEAM: &str = "Unknown Team";
const UNKNOWN_STADIUM: &str = "Unknown Stadium";
const UNKNOWN_HANDLE: &str = "@unknown";
const DEFAULT_CAPACITY: u32 = 30_000;
const DEFAULT_DIMENSIONS: Dimensions = Dimensions {
    left_field: 330,
    center_field: 400,
    right_field: 330,
};

/// Failures of the directory loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The `teams` directory itself could not be listed.
    #[error("failed to read team directory `{path}`")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// One document could not be read.
    #[error("failed to read team document `{path}`")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// One document is not valid JSON or not a JSON object.
    #[error("failed to parse team document `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Canonical record + profile pair produced from one raw document.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTeam {
    /// Relational half, ready for the record store.
    pub record: NewTeamRecord,
    /// Document half, ready for the profile store.
    pub profile: TeamProfile,
}

/// Canonical team profile document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    /// "City Name" as printed on the masthead.
    pub full_name: String,
    /// Founding year.
    pub founded: i32,
    /// Free-form color palette (`primary`, `secondary`, `accent`).
    pub colors: Value,
    /// Home ballpark.
    pub stadium: Stadium,
    /// Championships, retired numbers and rivalries.
    pub history: Value,
    /// Front office.
    pub management: Management,
    /// Spring training and academy details.
    pub facilities: Value,
    /// Fan-facing data.
    pub fanbase: Fanbase,
}

impl TeamProfile {
    /// The profile as a JSON object for the document store.
    pub fn to_document(&self) -> ProfileDocument {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Home ballpark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stadium {
    /// Ballpark name.
    pub name: String,
    /// Seats.
    pub capacity: u32,
    /// Year the park opened.
    pub opened: i32,
    /// Fence distances.
    pub dimensions: Dimensions,
    /// Notable features ("Green Monster", ...).
    pub features: Vec<String>,
}

/// Outfield fence distances in feet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    /// Left field line.
    pub left_field: u32,
    /// Dead center.
    pub center_field: u32,
    /// Right field line.
    pub right_field: u32,
}

/// Front office.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Management {
    /// General manager.
    pub general_manager: String,
    /// Field manager.
    pub manager: String,
    /// Principal owner.
    pub owner: String,
}

/// Fan-facing data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Fanbase {
    /// Fanbase nickname or hashtag.
    pub nickname: String,
    /// Season attendance.
    #[serde(rename = "attendance2024")]
    pub attendance_2024: u64,
    /// Social handles.
    pub social_media: SocialMedia,
}

/// Social handles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialMedia {
    /// Twitter/X handle.
    pub twitter: String,
    /// Instagram handle.
    pub instagram: String,
}

/// Where a profile section came from.
#[derive(Debug)]
enum Section<C, A> {
    Canonical(C),
    Alternate(A),
    Missing,
}

impl<C, A> Section<C, A> {
    fn resolve(canonical: Option<C>, alternate: Option<A>) -> Self {
        match (canonical, alternate) {
            (Some(canonical), _) => Section::Canonical(canonical),
            (None, Some(alternate)) => Section::Alternate(alternate),
            (None, None) => Section::Missing,
        }
    }
}

/// Reads a field as absent when it is `null` or does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(T::deserialize(value).ok())
}

/// Reads a nested section only when it is a JSON object.
fn section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(T::deserialize(value).ok())
}

/// Reads a whole number from an integer, an integral float or a numeric string.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(whole_number(&value).and_then(|n| T::try_from(n).ok()))
}

/// Numbers resolve as themselves; text resolves to its digits, or 1 without any.
fn lenient_team_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(text) => {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            Some(digits.parse().unwrap_or(FALLBACK_ID))
        }
        other => whole_number(other),
    })
}

fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTeamDocument {
    #[serde(rename = "teamId", deserialize_with = "lenient_team_id")]
    team_id: Option<i64>,
    #[serde(deserialize_with = "lenient_team_id")]
    id: Option<i64>,
    #[serde(rename = "fullName", deserialize_with = "lenient")]
    full_name: Option<String>,
    #[serde(rename = "full_name", deserialize_with = "lenient")]
    full_name_snake: Option<String>,
    #[serde(deserialize_with = "lenient")]
    city: Option<String>,
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    league: Option<String>,
    #[serde(deserialize_with = "lenient")]
    division: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    founded: Option<i32>,
    #[serde(deserialize_with = "lenient_number")]
    established: Option<i32>,
    #[serde(deserialize_with = "lenient")]
    colors: Option<Map<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    colors_hex: Option<Map<String, Value>>,
    #[serde(deserialize_with = "section")]
    stadium: Option<CanonicalStadium>,
    #[serde(deserialize_with = "section")]
    home_field: Option<AlternateStadium>,
    #[serde(deserialize_with = "lenient")]
    history: Option<Map<String, Value>>,
    #[serde(deserialize_with = "section")]
    management: Option<CanonicalManagement>,
    #[serde(deserialize_with = "section")]
    front_office: Option<AlternateManagement>,
    #[serde(deserialize_with = "lenient")]
    facilities: Option<Map<String, Value>>,
    #[serde(deserialize_with = "section")]
    fanbase: Option<CanonicalFanbase>,
    #[serde(deserialize_with = "section")]
    social: Option<AlternateSocial>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDimensions {
    #[serde(
        rename = "leftField",
        alias = "left_field",
        alias = "left",
        deserialize_with = "lenient_number"
    )]
    left_field: Option<u32>,
    #[serde(
        rename = "centerField",
        alias = "center_field",
        alias = "center",
        deserialize_with = "lenient_number"
    )]
    center_field: Option<u32>,
    #[serde(
        rename = "rightField",
        alias = "right_field",
        alias = "right",
        deserialize_with = "lenient_number"
    )]
    right_field: Option<u32>,
}

impl From<RawDimensions> for Dimensions {
    fn from(raw: RawDimensions) -> Self {
        Self {
            left_field: raw.left_field.unwrap_or(DEFAULT_DIMENSIONS.left_field),
            center_field: raw.center_field.unwrap_or(DEFAULT_DIMENSIONS.center_field),
            right_field: raw.right_field.unwrap_or(DEFAULT_DIMENSIONS.right_field),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CanonicalStadium {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    capacity: Option<u32>,
    #[serde(deserialize_with = "lenient_number")]
    opened: Option<i32>,
    #[serde(deserialize_with = "section")]
    dimensions: Option<RawDimensions>,
    #[serde(deserialize_with = "lenient")]
    features: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlternateStadium {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    capacity: Option<u32>,
    #[serde(deserialize_with = "lenient_number")]
    opened: Option<i32>,
    #[serde(deserialize_with = "section")]
    dimensions_ft: Option<RawDimensions>,
    #[serde(deserialize_with = "lenient")]
    features: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CanonicalManagement {
    #[serde(deserialize_with = "lenient")]
    general_manager: Option<String>,
    #[serde(deserialize_with = "lenient")]
    manager: Option<String>,
    #[serde(deserialize_with = "lenient")]
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlternateManagement {
    #[serde(deserialize_with = "lenient")]
    general_manager: Option<String>,
    #[serde(deserialize_with = "lenient")]
    manager: Option<String>,
    #[serde(deserialize_with = "lenient")]
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CanonicalFanbase {
    #[serde(deserialize_with = "lenient")]
    nickname: Option<String>,
    #[serde(rename = "attendance2024", deserialize_with = "lenient_number")]
    attendance_2024: Option<u64>,
    #[serde(deserialize_with = "section")]
    social_media: Option<RawSocialMedia>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSocialMedia {
    #[serde(deserialize_with = "lenient")]
    twitter: Option<String>,
    #[serde(deserialize_with = "lenient")]
    instagram: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlternateSocial {
    #[serde(deserialize_with = "lenient")]
    hashtag: Option<String>,
    #[serde(deserialize_with = "lenient")]
    twitter: Option<String>,
    #[serde(deserialize_with = "lenient")]
    threads: Option<String>,
}

fn stadium(section: Section<CanonicalStadium, AlternateStadium>, season: i32) -> Stadium {
    let (name, capacity, opened, dimensions, features) = match section {
        Section::Canonical(s) => (s.name, s.capacity, s.opened, s.dimensions, s.features),
        Section::Alternate(s) => (s.name, s.capacity, s.opened, s.dimensions_ft, s.features),
        Section::Missing => (None, None, None, None, None),
    };

    Stadium {
        name: name.unwrap_or_else(|| UNKNOWN_STADIUM.into()),
        capacity: capacity.unwrap_or(DEFAULT_CAPACITY),
        opened: opened.unwrap_or(season),
        dimensions: dimensions.map(Into::into).unwrap_or(DEFAULT_DIMENSIONS),
        features: features.unwrap_or_default(),
    }
}

fn management(section: Section<CanonicalManagement, AlternateManagement>) -> Management {
    let (general_manager, manager, owner) = match section {
        Section::Canonical(m) => (m.general_manager, m.manager, m.owner),
        Section::Alternate(m) => (m.general_manager, m.manager, m.owner),
        Section::Missing => (None, None, None),
    };

    let unknown = || UNKNOWN.to_string();
    Management {
        general_manager: general_manager.unwrap_or_else(unknown),
        manager: manager.unwrap_or_else(unknown),
        owner: owner.unwrap_or_else(unknown),
    }
}

fn fanbase(section: Section<CanonicalFanbase, AlternateSocial>) -> Fanbase {
    let (nickname, attendance, twitter, instagram) = match section {
        Section::Canonical(f) => {
            let (twitter, instagram) = f
                .social_media
                .map(|s| (s.twitter, s.instagram))
                .unwrap_or((None, None));
            (f.nickname, f.attendance_2024, twitter, instagram)
        }
        Section::Alternate(s) => (s.hashtag, None, s.twitter, s.threads),
        Section::Missing => (None, None, None, None),
    };

    let handle = || UNKNOWN_HANDLE.to_string();
    Fanbase {
        nickname: nickname.unwrap_or_else(|| UNKNOWN.into()),
        attendance_2024: attendance.unwrap_or(0),
        social_media: SocialMedia {
            twitter: twitter.unwrap_or_else(handle),
            instagram: instagram.unwrap_or_else(handle),
        },
    }
}

/// Split "Boston Red Sox" into ("Boston", "Red Sox") at the first space.
fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((city, name)) => (city.to_string(), name.to_string()),
        None => (UNKNOWN_CITY.to_string(), full_name.to_string()),
    }
}

fn default_colors() -> Value {
    json!({"primary": "#000000", "secondary": "#FFFFFF", "accent": "#CCCCCC"})
}

fn default_history() -> Value {
    json!({"championships": [], "retiredNumbers": [], "rivalries": []})
}

fn default_facilities() -> Value {
    json!({
        "springTraining": {"location": UNKNOWN, "facility": UNKNOWN},
        "academy": UNKNOWN
    })
}

/// Normalize a raw document for the current season.
pub fn normalize_team_document(raw: &Value) -> Result<NormalizedTeam, serde_json::Error> {
    normalize_for_season(raw, current_season())
}

/// Normalize a raw document, stamping the record with `season`.
///
/// A field or section whose value has the wrong type is treated as absent,
/// so it falls through to the alternate shape or the default. Fails only
/// when the document itself is not a JSON object.
pub fn normalize_for_season(raw: &Value, season: i32) -> Result<NormalizedTeam, serde_json::Error> {
    if !raw.is_object() {
        return Err(de::Error::custom("team document is not a JSON object"));
    }
    let doc = RawTeamDocument::deserialize(raw)?;

    let id = doc.team_id.or(doc.id).unwrap_or(FALLBACK_ID);
    let full_name = doc
        .full_name
        .or(doc.full_name_snake)
        .unwrap_or_else(|| UNKNOWN_TEAM.into());
    let (city, name) = match (doc.city, doc.name) {
        (Some(city), Some(name)) => (city, name),
        _ => split_full_name(&full_name),
    };
    let emoji = team_emoji(&city, &name).to_string();

    let record = NewTeamRecord {
        id,
        name,
        city,
        league: doc.league.unwrap_or_else(|| UNKNOWN.into()),
        division: doc.division.unwrap_or_else(|| UNKNOWN.into()),
        season,
        emoji,
    };

    let profile = TeamProfile {
        full_name,
        founded: doc.founded.or(doc.established).unwrap_or(season),
        colors: doc
            .colors
            .or(doc.colors_hex)
            .map(Value::Object)
            .unwrap_or_else(default_colors),
        stadium: stadium(Section::resolve(doc.stadium, doc.home_field), season),
        history: doc.history.map(Value::Object).unwrap_or_else(default_history),
        management: management(Section::resolve(doc.management, doc.front_office)),
        facilities: doc
            .facilities
            .map(Value::Object)
            .unwrap_or_else(default_facilities),
        fanbase: fanbase(Section::resolve(doc.fanbase, doc.social)),
    };

    Ok(NormalizedTeam { record, profile })
}

/// Load every `*.json` document under `<data_dir>/teams`, in file name order.
///
/// A document that cannot be read or parsed is logged and skipped. A missing
/// directory is an empty batch; any other listing failure fails the batch.
pub async fn load_all_from_directory(
    data_dir: &Path,
    season: i32,
) -> Result<Vec<NormalizedTeam>, LoaderError> {
    let teams_dir = data_dir.join(TEAMS_DIR);
    let mut entries = match fs::read_dir(&teams_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(dir = %teams_dir.display(), "team directory not found; nothing to load");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(LoaderError::ReadDir {
                path: teams_dir,
                source,
            });
        }
    };

    let mut paths = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    paths.push(path);
                }
            }
            Ok(None) => break,
            Err(source) => {
                return Err(LoaderError::ReadDir {
                    path: teams_dir,
                    source,
                });
            }
        }
    }
    paths.sort();
    info!(count = paths.len(), dir = %teams_dir.display(), "loading team documents");

    let mut teams = Vec::with_capacity(paths.len());
    for path in paths {
        match load_document(&path, season).await {
            Ok(team) => {
                info!(
                    team_id = team.record.id,
                    team = %format!("{} {}", team.record.city, team.record.name),
                    "loaded team document"
                );
                teams.push(team);
            }
            Err(err) => warn!(error = %err, "skipping team document"),
        }
    }

    Ok(teams)
}

async fn load_document(path: &Path, season: i32) -> Result<NormalizedTeam, LoaderError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| LoaderError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let raw: Value = serde_json::from_str(&contents).map_err(|source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    normalize_for_season(&raw, season).map_err(|source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
