use serde::Serialize;
use thiserror::Error;

use crate::dao::models::GameSave;

/// Whether a game session is live.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "save", rename_all = "camelCase")]
pub enum SessionState {
    /// No save is flagged active.
    NoActiveSave,
    /// The live save as last persisted.
    ActiveSave(GameSave),
}

impl SessionState {
    /// The live save, if any.
    pub fn active_save(&self) -> Option<&GameSave> {
        match self {
            SessionState::ActiveSave(save) => Some(save),
            SessionState::NoActiveSave => None,
        }
    }
}

/// Events applied to the session once the matching store write succeeded.
///
/// Every event carries the persisted result, never an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The active save was read at startup (absent when none exists).
    Restored(Option<GameSave>),
    /// A new save was created and flagged active.
    GameCreated(GameSave),
    /// The active save moved to another screen and/or gained data.
    ScreenChanged(GameSave),
    /// The active save was deleted, or deletion was attempted.
    GameDeleted,
}

/// Error returned when an event cannot be applied from the current state.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The state the session was in when the event was received.
    pub from: SessionState,
    /// The rejected event.
    pub event: SessionEvent,
}

/// Snapshot handed to listeners after each transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current state.
    #[serde(flatten)]
    pub state: SessionState,
    /// Incremented on every applied transition.
    pub version: u64,
}

/// Session state machine: `NoActiveSave` <-> `ActiveSave`.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    version: u64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            state: SessionState::NoActiveSave,
            version: 0,
        }
    }
}

impl SessionMachine {
    /// Create a machine with no active save.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Create a snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            version: self.version,
        }
    }

    /// Apply an event, returning the new snapshot.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionSnapshot, InvalidTransition> {
        self.state = self.compute_transition(event)?;
        self.version += 1;
        Ok(self.snapshot())
    }

    fn compute_transition(&self, event: SessionEvent) -> Result<SessionState, InvalidTransition> {
        let next = match (&self.state, event) {
            (_, SessionEvent::Restored(Some(save))) => SessionState::ActiveSave(save),
            (_, SessionEvent::Restored(None)) => SessionState::NoActiveSave,
            (_, SessionEvent::GameCreated(save)) => SessionState::ActiveSave(save),
            (SessionState::ActiveSave(_), SessionEvent::ScreenChanged(save)) => {
                SessionState::ActiveSave(save)
            }
            (_, SessionEvent::GameDeleted) => SessionState::NoActiveSave,
            (from, event) => {
                return Err(InvalidTransition {
                    from: from.clone(),
                    event,
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ENTRY_SCREEN, GameData};

    fn save(id: i64, screen: &str) -> GameSave {
        GameSave {
            id,
            save_name: "Default Save".into(),
            player_team_id: Some(1),
            current_screen: screen.into(),
            game_data: GameData::default(),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn initial_state_has_no_save() {
        let machine = SessionMachine::new();
        assert_eq!(machine.state(), &SessionState::NoActiveSave);
        assert_eq!(machine.snapshot().version, 0);
    }

    #[test]
    fn full_session_lifecycle() {
        let mut machine = SessionMachine::new();

        let snapshot = machine
            .apply(SessionEvent::GameCreated(save(1, ENTRY_SCREEN)))
            .unwrap();
        assert_eq!(snapshot.state, SessionState::ActiveSave(save(1, ENTRY_SCREEN)));

        let snapshot = machine
            .apply(SessionEvent::ScreenChanged(save(1, "standings")))
            .unwrap();
        assert_eq!(
            snapshot.state.active_save().map(|s| s.current_screen.as_str()),
            Some("standings")
        );

        let snapshot = machine.apply(SessionEvent::GameDeleted).unwrap();
        assert_eq!(snapshot.state, SessionState::NoActiveSave);
        assert_eq!(snapshot.version, 3);
    }

    #[test]
    fn creating_over_an_active_save_replaces_it() {
        let mut machine = SessionMachine::new();
        machine.apply(SessionEvent::GameCreated(save(1, "game"))).unwrap();
        machine.apply(SessionEvent::GameCreated(save(2, "game"))).unwrap();
        assert_eq!(machine.state().active_save().map(|s| s.id), Some(2));
    }

    #[test]
    fn restore_picks_either_state() {
        let mut machine = SessionMachine::new();
        machine
            .apply(SessionEvent::Restored(Some(save(4, "teams"))))
            .unwrap();
        assert!(machine.state().active_save().is_some());

        machine.apply(SessionEvent::Restored(None)).unwrap();
        assert_eq!(machine.state(), &SessionState::NoActiveSave);
    }

    #[test]
    fn screen_change_without_save_is_rejected() {
        let mut machine = SessionMachine::new();
        let err = machine
            .apply(SessionEvent::ScreenChanged(save(1, "menu")))
            .unwrap_err();
        assert_eq!(err.from, SessionState::NoActiveSave);
        assert_eq!(machine.snapshot().version, 0);
    }

    #[test]
    fn deleting_without_save_still_lands_in_no_save() {
        let mut machine = SessionMachine::new();
        let snapshot = machine.apply(SessionEvent::GameDeleted).unwrap();
        assert_eq!(snapshot.state, SessionState::NoActiveSave);
    }
}
