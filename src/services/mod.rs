/// Bulk loading of team documents into the stores.
pub mod seeding;
/// Static club glyph table.
pub mod team_emojis;
/// Normalization of heterogeneous team documents.
pub mod team_loader;
/// Combined record + profile team view.
pub mod team_view;
