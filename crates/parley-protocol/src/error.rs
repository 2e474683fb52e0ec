//! Error types for the protocol layer.
//!
//! Each crate in Parley defines its own error enum. A `ProtocolError`
//! always means the byte stream could not be turned into frames: either
//! the peer sent a bad header or the underlying read failed.

/// Errors that can occur while framing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The header announced a body larger than the protocol allows.
    #[error("body length {length} exceeds maximum of {max}")]
    BodyTooLong { length: usize, max: usize },

    /// The header field is not a space-padded unsigned decimal number.
    #[error("invalid header field {0:?}")]
    InvalidHeader(String),

    /// Reading or writing the underlying stream failed.
    ///
    /// The stream codec traits require the error type to absorb
    /// `std::io::Error`, which also covers a peer closing mid-frame.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns `true` for errors caused by the peer sending a malformed
    /// frame, as opposed to transport failures.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::BodyTooLong { .. } | Self::InvalidHeader(_))
    }
}
