//! The chat message frame.
//!
//! Every message on the wire is one frame: a fixed-width ASCII header
//! carrying the body length, followed by exactly that many body bytes.
//!
//! ```text
//! +------+------------------+
//! | "  2"| h i              |
//! +------+------------------+
//!  header  body (body_length bytes)
//! ```
//!
//! The header is the decimal body length, right-justified and padded with
//! spaces to [`HEADER_LENGTH`] bytes. There is no sign, terminator or other
//! delimiter. Bodies never exceed [`MAX_BODY_LENGTH`] bytes.

use std::fmt;

use crate::ProtocolError;

/// Size of the length header in bytes.
pub const HEADER_LENGTH: usize = 4;

/// Largest body a single frame may carry.
pub const MAX_BODY_LENGTH: usize = 512;

/// One length-prefixed frame: header followed by body.
///
/// The header and body live in a single buffer so the whole frame can be
/// written to a socket in one call via [`Message::as_bytes`]. A message
/// is built fresh for each read and each send. Once handed to the room
/// it is only ever cloned, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    /// `HEADER_LENGTH` header bytes, then `body_length` body bytes.
    data: Vec<u8>,
}

impl Message {
    /// Creates an empty message whose header encodes a zero-length body.
    pub fn new() -> Self {
        let mut msg = Self {
            data: vec![b' '; HEADER_LENGTH],
        };
        msg.encode_header();
        msg
    }

    /// Creates a ready-to-send message carrying `body`.
    ///
    /// Bodies longer than [`MAX_BODY_LENGTH`] are truncated.
    pub fn with_body(body: impl AsRef<[u8]>) -> Self {
        let mut msg = Self::new();
        msg.set_body(body.as_ref());
        msg.encode_header();
        msg
    }

    /// Replaces the body, storing at most [`MAX_BODY_LENGTH`] bytes.
    ///
    /// Returns the number of bytes stored. The header is not touched;
    /// call [`encode_header`](Self::encode_header) before sending.
    pub fn set_body(&mut self, body: &[u8]) -> usize {
        let stored = body.len().min(MAX_BODY_LENGTH);
        self.data.truncate(HEADER_LENGTH);
        self.data.extend_from_slice(&body[..stored]);
        stored
    }

    /// Writes the current body length into the header field.
    ///
    /// The length is rendered right-justified and space-padded, like
    /// `printf("%4d")`.
    pub fn encode_header(&mut self) {
        let mut remaining = self.body_length();
        let header = &mut self.data[..HEADER_LENGTH];
        header.fill(b' ');
        for slot in header.iter_mut().rev() {
            // Lossless: a single decimal digit.
            *slot = b'0' + (remaining % 10) as u8;
            remaining /= 10;
            if remaining == 0 {
                break;
            }
        }
    }

    /// Parses the header field and sizes the body buffer to match.
    ///
    /// The field must be optional leading spaces followed by one or more
    /// ASCII digits. On success the body becomes a zeroed buffer of the
    /// decoded length, ready to be filled through
    /// [`body_mut`](Self::body_mut).
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::BodyTooLong`] if the value exceeds
    ///   [`MAX_BODY_LENGTH`].
    /// - [`ProtocolError::InvalidHeader`] if the field is not a plain
    ///   unsigned decimal number.
    ///
    /// In both cases the body length is reset to 0.
    pub fn decode_header(&mut self) -> Result<usize, ProtocolError> {
        match parse_header(self.header()) {
            Ok(length) => {
                self.data.resize(HEADER_LENGTH + length, 0);
                Ok(length)
            }
            Err(e) => {
                self.data.truncate(HEADER_LENGTH);
                Err(e)
            }
        }
    }

    /// The raw header field.
    pub fn header(&self) -> &[u8] {
        &self.data[..HEADER_LENGTH]
    }

    /// Mutable access to the header field, used when reading a frame.
    pub fn header_mut(&mut self) -> &mut [u8] {
        &mut self.data[..HEADER_LENGTH]
    }

    /// The message body.
    pub fn body(&self) -> &[u8] {
        &self.data[HEADER_LENGTH..]
    }

    /// Mutable access to the body. Its size is fixed by the last
    /// `set_body` or successful `decode_header`.
    pub fn body_mut(&mut self) -> &mut [u8] {
        &mut self.data[HEADER_LENGTH..]
    }

    /// Number of body bytes.
    pub fn body_length(&self) -> usize {
        self.data.len() - HEADER_LENGTH
    }

    /// Total encoded length: header plus body.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A frame always carries its header, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The complete encoded frame (header followed by body).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("body_length", &self.body_length())
            .field("body", &String::from_utf8_lossy(self.body()))
            .finish()
    }
}

fn parse_header(field: &[u8]) -> Result<usize, ProtocolError> {
    let start = field
        .iter()
        .position(|&b| b != b' ')
        .unwrap_or(field.len());
    let digits = &field[start..];

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::InvalidHeader(
            String::from_utf8_lossy(field).into_owned(),
        ));
    }

    // At most HEADER_LENGTH digits, so this cannot overflow.
    let length = digits
        .iter()
        .fold(0usize, |acc, d| acc * 10 + usize::from(d - b'0'));

    if length > MAX_BODY_LENGTH {
        return Err(ProtocolError::BodyTooLong {
            length,
            max: MAX_BODY_LENGTH,
        });
    }
    Ok(length)
}
