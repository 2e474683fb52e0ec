//! The per-connection read and write loops.
//!
//! ```text
//! socket ──FramedRead──→ read loop ──deliver──→ room actor
//!                                                   │
//! socket ←─FramedWrite── write loop ←─ queue ←──────┘ (Participant::deliver)
//! ```
//!
//! When the read side ends (EOF, framing error, read error) the session
//! leaves the room and drops its end of the queue. The write loop then
//! flushes whatever is still queued and stops. A write failure or a full
//! queue is different: the shared token is cancelled, both loops stop at
//! once and queued frames are discarded. Nothing is retried and no error
//! frame is sent to the peer.

use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use parley_protocol::{FrameCodec, Message};
use parley_room::{Participant, RoomHandle};
use parley_transport::{Connection, ConnectionId};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use crate::{Session, SessionConfig, SessionError};

/// Serves one connection until it closes or fails.
///
/// Joins the room (history is queued for this peer before anything
/// else), then reads frames until EOF, a framing or I/O error, or
/// cancellation. On the way out the session leaves the room and waits
/// for the write loop to flush the queue (or to give up, if the session
/// was cancelled), so the socket is closed by the time this returns.
///
/// # Errors
///
/// Returns the error that ended the read loop. A clean close by the peer
/// and cancellation (slow peer, write failure) return `Ok(())`.
pub async fn run_session<C: Connection>(
    conn: C,
    room: RoomHandle,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    let id = conn.id();
    let peer = conn.peer_addr();
    let (reader, writer) = conn.into_split();

    let (outbound_tx, outbound_rx) =
        mpsc::channel(config.outbound_capacity.max(1));
    let cancel = CancellationToken::new();
    let session = Arc::new(Session::new(id, outbound_tx, cancel.clone()));

    let writer_task = tokio::spawn(write_loop(
        id,
        FramedWrite::new(writer, FrameCodec::new()),
        outbound_rx,
        room.clone(),
        cancel.clone(),
    ));

    let participant = Arc::downgrade(&session) as Weak<dyn Participant>;
    let result = match room.join(participant).await {
        Ok(_) => {
            tracing::debug!(%id, ?peer, "session started");
            let frames = FramedRead::new(reader, FrameCodec::new());
            read_loop(id, frames, &room, &cancel).await
        }
        Err(e) => Err(e.into()),
    };

    // Leaving is idempotent; the write loop may have left already.
    if let Err(e) = room.leave(id).await {
        tracing::debug!(%id, error = %e, "leave after session end failed");
    }
    // Last sender: the write loop sees the queue close once it is drained.
    drop(session);
    if let Err(e) = writer_task.await {
        tracing::warn!(%id, error = %e, "write loop panicked");
    }

    tracing::debug!(%id, "session ended");
    result
}

/// Read state machine: header, body, hand to room, repeat.
///
/// The header/body states live in [`FrameCodec`]; this loop only sees
/// whole frames.
async fn read_loop<R>(
    id: ConnectionId,
    mut frames: FramedRead<R, FrameCodec>,
    room: &RoomHandle,
    cancel: &CancellationToken,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(%id, "session cancelled, stopping reads");
                return Ok(());
            }
            next = frames.next() => next,
        };

        match next {
            Some(Ok(msg)) => {
                tracing::trace!(
                    %id,
                    body_length = msg.body_length(),
                    "frame received"
                );
                room.deliver(msg).await?;
            }
            Some(Err(e)) => {
                if e.is_framing() {
                    tracing::debug!(
                        %id,
                        error = %e,
                        "framing error, closing connection"
                    );
                } else {
                    tracing::debug!(%id, error = %e, "read failed");
                }
                return Err(e.into());
            }
            None => {
                tracing::debug!(%id, "peer closed connection");
                return Ok(());
            }
        }
    }
}

/// Write state machine: idle until a message is queued, then writing
/// until the frame is flushed.
///
/// Runs until the queue is closed and drained. Queued messages are
/// discarded if the session is cancelled first.
async fn write_loop<W>(
    id: ConnectionId,
    mut sink: FramedWrite<W, FrameCodec>,
    mut queue: mpsc::Receiver<Message>,
    room: RoomHandle,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        // Idle
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = queue.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        // Writing
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = sink.send(msg) => result,
        };

        if let Err(e) = result {
            tracing::debug!(
                %id,
                error = %e,
                discarded = queue.len(),
                "write failed, closing connection"
            );
            if let Err(e) = room.leave(id).await {
                tracing::debug!(
                    %id,
                    error = %e,
                    "leave after write failure failed"
                );
            }
            cancel.cancel();
            break;
        }
    }

    tracing::trace!(%id, "write loop stopped");
}
