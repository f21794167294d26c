//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default number of turns kept in the gameplay log.
pub const DEFAULT_RETENTION: usize = 100;

/// Configuration for a [`Gameplay`](crate::gameplay::Gameplay) engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameplayConfig {
    /// Maximum number of turns kept in the log (default: 100).
    ///
    /// Once exceeded, the oldest turns are dropped. Moves targeting a
    /// dropped turn can no longer be integrated; the peer that sent them
    /// needs a full-state resync.
    pub retention: usize,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
        }
    }
}

impl GameplayConfig {
    /// Create a new config with a custom retention window.
    ///
    /// Panics if `retention` is zero.
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        assert!(retention > 0, "Retention window must keep at least 1 turn");
        self.retention = retention;
        self
    }
}
