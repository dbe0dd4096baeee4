use std::panic::{AssertUnwindSafe, catch_unwind};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::state::session::SessionSnapshot;

/// Handle returned by registration, used to remove a listener later.
pub type ListenerId = Uuid;

/// Failure reported by a listener. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

/// Observer of session transitions.
pub trait GameStateListener: Send + Sync {
    /// Called synchronously with the snapshot produced by a transition.
    fn on_state_change(&self, snapshot: &SessionSnapshot) -> Result<(), ListenerError>;
}

impl<F> GameStateListener for F
where
    F: Fn(&SessionSnapshot) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_state_change(&self, snapshot: &SessionSnapshot) -> Result<(), ListenerError> {
        self(snapshot)
    }
}

/// Ordered listener list with "continue on failure" delivery.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: IndexMap<ListenerId, Box<dyn GameStateListener>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The same callback may be added more than once.
    pub fn add(&mut self, listener: Box<dyn GameStateListener>) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners.insert(id, listener);
        debug!(listener_id = %id, total = self.listeners.len(), "listener registered");
        id
    }

    /// Remove a listener, keeping the others in registration order.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `snapshot` to every listener in registration order.
    ///
    /// Errors and panics are logged and skipped. Returns how many listeners
    /// failed.
    pub fn notify(&self, snapshot: &SessionSnapshot) -> usize {
        let mut failures = 0;
        for (id, listener) in &self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_state_change(snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!(listener_id = %id, version = snapshot.version, error = %err, "state listener failed");
                }
                Err(_) => {
                    failures += 1;
                    error!(listener_id = %id, version = snapshot.version, "state listener panicked");
                }
            }
        }
        failures
    }
}
