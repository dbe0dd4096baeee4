use std::path::PathBuf;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by the relational and document stores.
///
/// Store methods log these and report an absent value, `false` or a zero
/// change count instead. Only opening the database returns them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The SQLite engine rejected or failed a statement.
    #[error("database statement failed: {context}")]
    Sql {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// Reading or writing a document file failed.
    #[error("i/o failure on `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A document or JSON column could not be (de)serialized.
    #[error("malformed document `{location}`")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Wrap a failed SQL statement with a short description of what was attempted.
    pub fn sql(context: &'static str, source: sqlx::Error) -> Self {
        StorageError::Sql { context, source }
    }

    /// Wrap a filesystem failure for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON failure for the given document location.
    pub fn json(location: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Json {
            location: location.into(),
            source,
        }
    }
}
