//! Room actor: an isolated Tokio task that owns the [`Room`].
//!
//! The room's membership and history are touched by every connection.
//! Rather than sharing them behind a lock, a single task owns them and
//! the outside world talks to it through an mpsc channel. Commands are
//! applied strictly in arrival order, which is what gives each
//! participant a consistent view of the message sequence.

use std::sync::Weak;

use parley_protocol::Message;
use parley_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{Participant, Room, RoomConfig, RoomError};

/// Commands sent to the room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
enum RoomCommand {
    /// Add a participant and replay history to it.
    Join {
        participant: Weak<dyn Participant>,
        reply: oneshot::Sender<bool>,
    },

    /// Remove a participant.
    Leave {
        id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Record a message and broadcast it.
    Deliver { msg: Message },

    /// Request room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Request a copy of the history.
    GetHistory {
        reply: oneshot::Sender<Vec<Message>>,
    },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    /// Number of live participants.
    pub participant_count: usize,
    /// Number of messages currently held in history.
    pub history_len: usize,
    /// Maximum history length.
    pub history_limit: usize,
}

/// Handle to the running room actor. Used to send commands to it.
///
/// Cheap to clone: it is just an `mpsc::Sender` wrapper. Every listener
/// and every session holds one.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Adds a participant to the room.
    ///
    /// Every message in history is delivered to the participant before
    /// this returns, and before any message delivered afterwards.
    /// Returns `false` if it was already a member or has been dropped.
    pub async fn join(
        &self,
        participant: Weak<dyn Participant>,
    ) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                participant,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Removes a participant. Returns `false` if it was not a member.
    pub async fn leave(&self, id: ConnectionId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { id, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Sends a message to the room for broadcast (fire-and-forget).
    pub async fn deliver(&self, msg: Message) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Deliver { msg })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Requests a copy of the history, oldest first.
    pub async fn history(&self) -> Result<Vec<Message>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetHistory { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Tells the room to shut down. Later calls fail with
    /// [`RoomError::Unavailable`].
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The actor task state.
struct RoomActor {
    room: Room,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(
            history_limit = self.room.history_limit(),
            "room actor started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { participant, reply } => {
                    let _ = reply.send(self.room.join(participant));
                }
                RoomCommand::Leave { id, reply } => {
                    let _ = reply.send(self.room.leave(id));
                }
                RoomCommand::Deliver { msg } => {
                    self.room.deliver(msg);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::GetHistory { reply } => {
                    let _ = reply.send(self.room.history().cloned().collect());
                }
                RoomCommand::Shutdown => {
                    tracing::info!("room shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            participants = self.room.participant_count(),
            "room actor stopped"
        );
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            participant_count: self.room.participant_count(),
            history_len: self.room.history_len(),
            history_limit: self.room.history_limit(),
        }
    }
}

/// Spawns the room actor task and returns a handle to communicate with it.
///
/// `config.channel_size` controls backpressure: when the channel fills up,
/// senders wait.
pub fn spawn_room(config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let actor = RoomActor {
        room: Room::new(config),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}
