//! Session types: the room's view of a connection.
//!
//! A [`Session`] is what the room holds (weakly) for each connection. It
//! owns the sending side of the connection's outbound queue and the
//! cancellation token shared by the connection's read and write loops.

use parley_protocol::Message;
use parley_room::Participant;
use parley_transport::ConnectionId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of messages waiting to be written to one peer.
    ///
    /// A peer that falls this far behind is disconnected. Default: 1024.
    pub outbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connected client, as seen by the room.
///
/// The read loop holds the only strong reference. Once it finishes, the
/// session is dropped, the outbound queue closes and the room's weak
/// handle stops upgrading.
#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    outbound: mpsc::Sender<Message>,
    cancel: CancellationToken,
}

impl Session {
    pub(crate) fn new(
        id: ConnectionId,
        outbound: mpsc::Sender<Message>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            outbound,
            cancel,
        }
    }

    /// The connection this session serves.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` once the session has been cancelled: a write
    /// failed or the outbound queue overflowed.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Participant for Session {
    fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `msg` for the write loop.
    ///
    /// Never blocks. If the queue is full the peer is not keeping up:
    /// the message is dropped and the whole session is cancelled, the
    /// same as a write error.
    fn deliver(&self, msg: &Message) {
        match self.outbound.try_send(msg.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    id = %self.id,
                    capacity = self.outbound.max_capacity(),
                    "outbound queue full, disconnecting slow peer"
                );
                self.cancel.cancel();
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!(id = %self.id, "write loop gone, dropping message");
            }
        }
    }
}
