//! The `Participant` trait: anything the room can deliver messages to.

use parley_protocol::Message;
use parley_transport::ConnectionId;

/// A member of the room.
///
/// The room stores participants as `Weak<dyn Participant>` handles keyed
/// by [`Participant::id`], so membership never keeps a participant alive.
/// In the server every participant is a connection session; tests use
/// simple recorders.
pub trait Participant: Send + Sync + 'static {
    /// Stable identity used as the membership key.
    fn id(&self) -> ConnectionId;

    /// Hands a message to this participant.
    ///
    /// Called from the room actor, so it must not block. Implementations
    /// queue the message and return immediately.
    fn deliver(&self, msg: &Message);
}
