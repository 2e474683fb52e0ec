//! # Parley
//!
//! Broadcast chat relay over length-prefixed TCP frames.
//!
//! Every frame a client sends is relayed, unchanged, to every connected
//! client (the sender included). Clients that connect later first receive
//! the most recent messages, oldest first. Clients on every listening
//! port share the same room.
//!
//! The workspace is layered:
//!
//! - `parley-transport`: TCP listener and connection ids
//! - `parley-protocol`: the [`Message`] frame and its stream codec
//! - `parley-room`: membership and history, owned by a room actor
//! - `parley-session`: per-connection read and write loops
//! - `parley` (this crate): accept loops, service builder, CLI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! # async fn start() -> Result<(), ParleyError> {
//! let service = ChatService::builder()
//!     .bind("0.0.0.0:5000")
//!     .build()
//!     .await?;
//! service.run_until_ctrl_c().await
//! # }
//! ```

mod cli;
mod error;
mod server;

pub use cli::Cli;
pub use error::ParleyError;
pub use server::{ChatServer, ChatService, ChatServiceBuilder};

pub use parley_protocol::{FrameCodec, MAX_BODY_LENGTH, Message};
pub use parley_room::{RoomConfig, RoomHandle};
pub use parley_session::SessionConfig;

pub mod prelude {
    pub use crate::{
        ChatServer, ChatService, ChatServiceBuilder, FrameCodec, Message,
        ParleyError, RoomConfig, RoomHandle, SessionConfig,
    };
    pub use parley_transport::{Connection, ConnectionId, Transport};
}
