//! Stream codec: cutting a byte stream into [`Message`] frames.
//!
//! [`FrameCodec`] implements tokio-util's `Decoder` and `Encoder`, so a
//! connection half can be wrapped in `FramedRead` / `FramedWrite` and
//! consumed as a `Stream` of messages or fed as a `Sink` of messages.
//!
//! Decoding is a two-state machine:
//!
//! ```text
//!            header ok                 body complete
//! ReadingHeader ──────→ ReadingBody ─────────────────→ ReadingHeader
//!       │                                (frame yielded)
//!       └── bad header → Err (stream ends, no resynchronization)
//! ```
//!
//! When fewer bytes are buffered than the current state needs, the codec
//! keeps its state and asks for more input.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::HEADER_LENGTH;
use crate::{Message, ProtocolError};

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Waiting for the fixed-size header.
    ReadingHeader,
    /// Header decoded; waiting for `body_length` body bytes.
    ReadingBody { body_length: usize },
}

/// Length-prefixed frame codec.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// The frame whose header is decoded but whose body is incomplete.
    pending: Option<Message>,
}

impl FrameCodec {
    /// Creates a codec positioned at the start of a frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current decode state.
    pub fn state(&self) -> ReadState {
        match &self.pending {
            Some(msg) => ReadState::ReadingBody {
                body_length: msg.body_length(),
            },
            None => ReadState::ReadingHeader,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Message>, ProtocolError> {
        let mut msg = match self.pending.take() {
            Some(msg) => msg,
            None => {
                if src.len() < HEADER_LENGTH {
                    src.reserve(HEADER_LENGTH - src.len());
                    return Ok(None);
                }
                let mut msg = Message::new();
                msg.header_mut().copy_from_slice(&src[..HEADER_LENGTH]);
                src.advance(HEADER_LENGTH);
                msg.decode_header()?;
                msg
            }
        };

        let body_length = msg.body_length();
        if src.len() < body_length {
            src.reserve(body_length - src.len());
            self.pending = Some(msg);
            return Ok(None);
        }

        msg.body_mut().copy_from_slice(&src[..body_length]);
        src.advance(body_length);
        Ok(Some(msg))
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Message>, ProtocolError> {
        match self.decode(src)? {
            Some(msg) => Ok(Some(msg)),
            None if src.is_empty() && self.pending.is_none() => Ok(None),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed inside a frame",
            )
            .into()),
        }
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(
        &mut self,
        msg: Message,
        dst: &mut BytesMut,
    ) -> Result<(), ProtocolError> {
        dst.extend_from_slice(msg.as_bytes());
        Ok(())
    }
}
