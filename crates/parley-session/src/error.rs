//! Error types for the session layer.

use parley_protocol::ProtocolError;
use parley_room::RoomError;

/// Why a session ended abnormally.
///
/// A session that ends because the peer closed the connection, or
/// because it was cancelled, is not an error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The peer sent a malformed frame or the stream failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room stopped accepting commands.
    #[error(transparent)]
    Room(#[from] RoomError),
}
