//! Application-level configuration loading: user settings and storage locations.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// Default location on disk where the game looks for the JSON settings.
const DEFAULT_CONFIG_PATH: &str = "config/settings.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DUGOUT_CONFIG_PATH";
/// Environment variable naming the SQLite file.
const DB_PATH_ENV: &str = "DB_PATH";
/// Environment variable naming the data directory.
const DATA_DIR_ENV: &str = "DATA_DIR";
const DEFAULT_DB_PATH: &str = "game.db";
const DEFAULT_DATA_DIR: &str = "./data";
/// Languages with a translation table.
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "es", "fr"];
const DEFAULT_LANGUAGE: &str = "en";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// User-facing preferences.
    pub settings: Settings,
    /// Where the database and team documents live.
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load the settings file, falling back to built-in defaults, and read
    /// storage locations from the environment.
    pub fn load() -> Self {
        Self {
            settings: Settings::load(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// Locations of the SQLite file and of the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// SQLite database file.
    pub db_path: String,
    /// Directory holding the `teams` document folder.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Read `DB_PATH` / `DATA_DIR`, ignoring empty values.
    pub fn from_env() -> Self {
        let db_path = env::var(DB_PATH_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let data_dir = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self { db_path, data_dir }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Key-path addressable settings tree (`"ui.inputMode"`).
///
/// Values read from disk are layered over the defaults one top-level section
/// at a time, so a file that only sets `ui.fullscreen` keeps the default
/// `ui.inputMode`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    tree: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        match default_settings() {
            Value::Object(tree) => Self { tree },
            _ => Self { tree: Map::new() },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
/// JSON representation of the settings file located at [`DEFAULT_CONFIG_PATH`].
struct RawSettings(Map<String, Value>);

impl From<RawSettings> for Settings {
    fn from(value: RawSettings) -> Self {
        let mut settings = Settings::default();
        for (key, value) in value.0 {
            match (settings.tree.get_mut(&key), value) {
                (Some(Value::Object(current)), Value::Object(overrides)) => {
                    current.extend(overrides);
                }
                (_, value) => {
                    settings.tree.insert(key, value);
                }
            }
        }
        settings
    }
}

impl Settings {
    /// Load settings from disk, falling back to the defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawSettings>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded settings");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse settings; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "settings file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read settings; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Look up a dotted key path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.tree.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// String value at `path`.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Boolean value at `path`.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Set the value at a dotted key path, creating intermediate objects and
    /// replacing any non-object value in the way.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(leaf) = segments.pop() else {
            return;
        };

        let mut node = &mut self.tree;
        for segment in segments {
            let entry = node
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            node = next;
        }
        node.insert(leaf.to_string(), value);
    }

    /// Configured language, or `en` when it is missing or unsupported.
    pub fn language(&self) -> &str {
        self.get_str("language")
            .filter(|code| SUPPORTED_LANGUAGES.contains(code))
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Resolve the settings path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in settings shipped with the binary.
fn default_settings() -> Value {
    json!({
        "language": DEFAULT_LANGUAGE,
        "ui": {
            "fullscreen": true,
            "exitOnCtrlC": true,
            "inputMode": "arrows"
        },
        "game": {
            "difficulty": "normal",
            "soundEnabled": true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_addressable_by_path() {
        let settings = Settings::default();
        assert_eq!(settings.language(), "en");
        assert_eq!(settings.get_str("ui.inputMode"), Some("arrows"));
        assert_eq!(settings.get_bool("game.soundEnabled"), Some(true));
        assert!(settings.get("ui.missing").is_none());
        assert!(settings.get("language.nested").is_none());
    }

    #[test]
    fn set_creates_and_replaces_nodes() {
        let mut settings = Settings::default();
        settings.set("ui.inputMode", json!("vim"));
        settings.set("audio.volume", json!(7));
        settings.set("language.region", json!("CA"));

        assert_eq!(settings.get_str("ui.inputMode"), Some("vim"));
        assert_eq!(settings.get_bool("ui.fullscreen"), Some(true));
        assert_eq!(settings.get("audio.volume"), Some(&json!(7)));
        assert_eq!(settings.get_str("language.region"), Some("CA"));
        assert_eq!(settings.language(), "en");
    }

    #[test]
    fn unsupported_language_falls_back() {
        let mut settings = Settings::default();
        settings.set("language", json!("fr"));
        assert_eq!(settings.language(), "fr");
        settings.set("language", json!("de"));
        assert_eq!(settings.language(), "en");
    }

    #[test]
    fn file_values_layer_over_defaults() {
        let raw: RawSettings =
            serde_json::from_str(r#"{"language": "es", "ui": {"fullscreen": false}}"#).unwrap();
        let settings = Settings::from(raw);

        assert_eq!(settings.language(), "es");
        assert_eq!(settings.get_bool("ui.fullscreen"), Some(false));
        assert_eq!(settings.get_str("ui.inputMode"), Some("arrows"));
        assert_eq!(settings.get_str("game.difficulty"), Some("normal"));
    }
}
