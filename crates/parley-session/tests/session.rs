//! Integration tests for connection sessions.
//!
//! Each test runs real sessions against a real room actor, but over an
//! in-memory duplex pipe instead of a socket. The client side of the
//! pipe is wrapped in a `Framed` codec so tests speak whole frames.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parley_protocol::{FrameCodec, Message, ProtocolError};
use parley_room::{RoomConfig, RoomError, RoomHandle, spawn_room};
use parley_session::{SessionConfig, SessionError, run_session};
use parley_transport::{Connection, ConnectionId};
use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

// =========================================================================
// In-memory connection
// =========================================================================

struct DuplexConnection {
    id: ConnectionId,
    stream: DuplexStream,
}

impl Connection for DuplexConnection {
    type Reader = ReadHalf<DuplexStream>;
    type Writer = WriteHalf<DuplexStream>;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn into_split(self) -> (Self::Reader, Self::Writer) {
        tokio::io::split(self.stream)
    }
}

/// Reads from a pipe but fails every write, like a peer that reset the
/// connection.
struct BrokenPipeConnection {
    id: ConnectionId,
    reader: DuplexStream,
}

struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Connection for BrokenPipeConnection {
    type Reader = DuplexStream;
    type Writer = FailingWriter;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    fn into_split(self) -> (Self::Reader, Self::Writer) {
        (self.reader, FailingWriter)
    }
}

type Client = Framed<DuplexStream, FrameCodec>;

const TIMEOUT: Duration = Duration::from_secs(2);

// =========================================================================
// Helpers
// =========================================================================

/// Starts a session for a new in-memory client and waits until it has
/// joined the room.
async fn connect(
    room: &RoomHandle,
    id: u64,
    config: SessionConfig,
    buffer: usize,
) -> (Client, JoinHandle<Result<(), SessionError>>) {
    let before = room.info().await.unwrap().participant_count;
    let (client, server) = tokio::io::duplex(buffer);
    let conn = DuplexConnection {
        id: ConnectionId::new(id),
        stream: server,
    };
    let room_for_task = room.clone();
    let task = tokio::spawn(async move {
        run_session(conn, room_for_task, &config).await
    });
    wait_for_participants(room, before + 1).await;
    (Framed::new(client, FrameCodec::new()), task)
}

async fn join(
    room: &RoomHandle,
    id: u64,
) -> (Client, JoinHandle<Result<(), SessionError>>) {
    connect(room, id, SessionConfig::default(), 4096).await
}

async fn wait_for_participants(room: &RoomHandle, expected: usize) {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            if room.info().await.unwrap().participant_count == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("room never reached {expected} participants"));
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::with_body(text)).await.unwrap();
}

async fn recv(client: &mut Client) -> String {
    let msg = tokio::time::timeout(TIMEOUT, client.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("frame should decode");
    String::from_utf8_lossy(msg.body()).into_owned()
}

async fn expect_closed(client: &mut Client) {
    let next = tokio::time::timeout(TIMEOUT, client.next())
        .await
        .expect("timed out waiting for close");
    assert!(next.is_none(), "expected EOF, got {next:?}");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_message_reaches_all_participants_including_sender() {
    let room = spawn_room(RoomConfig::default());
    let (mut x, _x_task) = join(&room, 1).await;
    let (mut y, _y_task) = join(&room, 2).await;

    send(&mut x, "hi").await;

    assert_eq!(recv(&mut y).await, "hi");
    assert_eq!(recv(&mut x).await, "hi");
}

#[tokio::test]
async fn test_late_joiner_receives_history_first() {
    let room = spawn_room(RoomConfig::default());
    let (mut x, _x_task) = join(&room, 1).await;
    send(&mut x, "hi").await;
    assert_eq!(recv(&mut x).await, "hi");

    let (mut z, _z_task) = join(&room, 3).await;
    assert_eq!(recv(&mut z).await, "hi");

    send(&mut x, "again").await;
    assert_eq!(recv(&mut z).await, "again");
}

#[tokio::test]
async fn test_order_preserved_between_two_clients() {
    let room = spawn_room(RoomConfig::default());
    let (mut a, _a_task) = join(&room, 1).await;
    let (mut b, _b_task) = join(&room, 2).await;

    for text in ["m1", "m2", "m3"] {
        send(&mut a, text).await;
    }

    for expected in ["m1", "m2", "m3"] {
        assert_eq!(recv(&mut b).await, expected);
    }
}

#[tokio::test]
async fn test_empty_body_is_relayed() {
    let room = spawn_room(RoomConfig::default());
    let (mut a, _a_task) = join(&room, 1).await;
    let (mut b, _b_task) = join(&room, 2).await;

    send(&mut a, "").await;
    assert_eq!(recv(&mut b).await, "");
}

#[tokio::test]
async fn test_framing_error_closes_only_that_connection() {
    let room = spawn_room(RoomConfig::default());
    let (mut bad, bad_task) = join(&room, 1).await;
    let (mut good, _good_task) = join(&room, 2).await;

    bad.get_mut().write_all(b"9999").await.unwrap();

    let result = tokio::time::timeout(TIMEOUT, bad_task)
        .await
        .expect("session should end")
        .unwrap();
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ProtocolError::BodyTooLong { length: 9999, .. }))
    ));
    expect_closed(&mut bad).await;
    wait_for_participants(&room, 1).await;

    send(&mut good, "still working").await;
    assert_eq!(recv(&mut good).await, "still working");
}

#[tokio::test]
async fn test_client_disconnect_leaves_room() {
    let room = spawn_room(RoomConfig::default());
    let (a, a_task) = join(&room, 1).await;
    let (mut b, _b_task) = join(&room, 2).await;

    drop(a);
    let result = tokio::time::timeout(TIMEOUT, a_task).await.unwrap().unwrap();
    assert!(result.is_ok(), "clean close is not an error: {result:?}");
    wait_for_participants(&room, 1).await;

    send(&mut b, "alone").await;
    assert_eq!(recv(&mut b).await, "alone");
}

#[tokio::test]
async fn test_truncated_frame_is_read_error() {
    let room = spawn_room(RoomConfig::default());
    let (mut a, a_task) = join(&room, 1).await;

    a.get_mut().write_all(b"  10abc").await.unwrap();
    drop(a);

    let result = tokio::time::timeout(TIMEOUT, a_task).await.unwrap().unwrap();
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ProtocolError::Io(_)))
    ));
    wait_for_participants(&room, 0).await;
}

#[tokio::test]
async fn test_half_closed_client_still_receives_queued_frames() {
    let room = spawn_room(RoomConfig::default());
    for i in 0..50 {
        room.deliver(Message::with_body(format!("m{i}")))
            .await
            .unwrap();
    }

    // A small pipe keeps most of the replay queued when the reads end.
    let (mut z, z_task) =
        connect(&room, 2, SessionConfig::default(), 16).await;
    send(&mut z, "bye").await;
    z.get_mut().shutdown().await.unwrap();

    let mut received = Vec::new();
    tokio::time::timeout(TIMEOUT, async {
        while let Some(frame) = z.next().await {
            let frame = frame.expect("frame should decode");
            received.push(String::from_utf8_lossy(frame.body()).into_owned());
        }
    })
    .await
    .expect("stream should end once the queue is flushed");

    let mut expected: Vec<String> = (0..50).map(|i| format!("m{i}")).collect();
    expected.push("bye".to_string());
    assert_eq!(received, expected);

    let result = tokio::time::timeout(TIMEOUT, z_task).await.unwrap().unwrap();
    assert!(result.is_ok(), "half-close is a clean end: {result:?}");
    wait_for_participants(&room, 0).await;
}

#[tokio::test]
async fn test_write_failure_leaves_room_and_stops_reads() {
    let room = spawn_room(RoomConfig::default());
    let (mut good, _good_task) = join(&room, 1).await;

    // The client end stays open, so only cancellation can stop the reads.
    let (_client, server) = tokio::io::duplex(64);
    let conn = BrokenPipeConnection {
        id: ConnectionId::new(2),
        reader: server,
    };
    let room_for_task = room.clone();
    let broken_task = tokio::spawn(async move {
        run_session(conn, room_for_task, &SessionConfig::default()).await
    });
    wait_for_participants(&room, 2).await;

    send(&mut good, "trigger").await;
    assert_eq!(recv(&mut good).await, "trigger");

    let result = tokio::time::timeout(TIMEOUT, broken_task)
        .await
        .expect("session should end after the failed write")
        .unwrap();
    assert!(result.is_ok(), "write failure cancels quietly: {result:?}");
    wait_for_participants(&room, 1).await;

    send(&mut good, "after").await;
    assert_eq!(recv(&mut good).await, "after");
}

#[tokio::test]
async fn test_slow_peer_is_disconnected() {
    let room = spawn_room(RoomConfig::default());
    let config = SessionConfig {
        outbound_capacity: 2,
    };
    // A tiny pipe that is never read fills up after the first frame.
    let (mut slow, slow_task) = connect(&room, 1, config, 8).await;
    let (mut fast, _fast_task) = join(&room, 2).await;

    for i in 0..20 {
        room.deliver(Message::with_body(format!("flood {i}")))
            .await
            .unwrap();
    }

    let result = tokio::time::timeout(TIMEOUT, slow_task)
        .await
        .expect("slow session should be cancelled")
        .unwrap();
    assert!(result.is_ok(), "cancellation is not an error: {result:?}");
    wait_for_participants(&room, 1).await;

    for i in 0..20 {
        assert_eq!(recv(&mut fast).await, format!("flood {i}"));
    }

    // The slow client's pipe is closed once its session is gone.
    let drained = tokio::time::timeout(TIMEOUT, async {
        while let Some(item) = slow.next().await {
            if item.is_err() {
                break;
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "slow client's stream should end");
}

#[tokio::test]
async fn test_session_fails_when_room_is_gone() {
    let room = spawn_room(RoomConfig::default());
    room.shutdown().await.unwrap();
    while !room.is_closed() {
        tokio::task::yield_now().await;
    }

    let (_client, server) = tokio::io::duplex(64);
    let conn = DuplexConnection {
        id: ConnectionId::new(1),
        stream: server,
    };
    let result = run_session(conn, room, &SessionConfig::default()).await;
    assert!(matches!(result, Err(SessionError::Room(RoomError::Unavailable))));
}
