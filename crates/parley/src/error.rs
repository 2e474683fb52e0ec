//! Unified error type for the Parley relay.

use parley_room::RoomError;
use parley_transport::TransportError;

/// Top-level error returned when starting or stopping a relay.
///
/// Per-connection failures never reach this type: they end that
/// connection and are logged. The `#[from]` attribute on each variant
/// lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// A transport-level error (bind, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The room actor is gone.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The service was built without any address to listen on.
    #[error("no listening endpoints configured")]
    NoEndpoints,
}
