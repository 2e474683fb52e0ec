//! Room configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the broadcast room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How many of the most recent messages are kept and replayed to
    /// participants when they join.
    pub history_limit: usize,

    /// Capacity of the room actor's command channel. When it is full,
    /// callers wait (bounded channel).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            channel_size: 64,
        }
    }
}
