use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// SQLite connection setup and schema creation.
pub mod database;
/// Single-active game save persistence.
pub mod game_saves;
/// Database and document model definitions.
pub mod models;
/// Error types shared by every store.
pub mod storage;
/// Per-team JSON profile documents on disk.
pub mod team_profiles;
/// Relational season records for teams.
pub mod team_records;

/// Season used when callers do not name one: the current calendar year.
pub fn current_season() -> i32 {
    OffsetDateTime::now_utc().year()
}

/// Current UTC time formatted as RFC 3339.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
