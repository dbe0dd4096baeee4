//! Library crate for dugout, exposing the team stores, seeding and the game
//! session facade to the binaries and integration tests.

pub mod config;
pub mod dao;
pub mod error;
pub mod services;
pub mod state;
