//! Wire protocol for Parley.
//!
//! This crate defines the frame format clients and the server speak:
//!
//! - **Message** ([`Message`]): one length-prefixed frame with
//!   header encode/decode.
//! - **Codec** ([`FrameCodec`]): turns a byte stream into frames and
//!   back, for use with `tokio_util::codec::{FramedRead, FramedWrite}`.
//! - **Errors** ([`ProtocolError`]): what can go wrong while framing.
//!
//! The protocol layer knows nothing about connections or rooms. It
//! only knows how to cut a stream into frames.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Session → Room
//! ```

mod codec;
mod error;
mod message;

pub use codec::{FrameCodec, ReadState};
pub use error::ProtocolError;
pub use message::{HEADER_LENGTH, MAX_BODY_LENGTH, Message};
