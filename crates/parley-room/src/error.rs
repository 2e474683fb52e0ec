//! Error types for the room layer.

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room actor has stopped, so its command channel is closed.
    #[error("room is unavailable")]
    Unavailable,
}
