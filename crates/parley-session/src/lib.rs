//! Connection sessions for Parley.
//!
//! A session is the server side of one client connection. It runs two
//! independent state machines:
//!
//! 1. **Read**: decode frames from the socket and hand each one to the
//!    room.
//! 2. **Write**: drain the session's outbound queue back onto the socket.
//!
//! The room reaches a session through the [`Participant`] capability,
//! which only pushes onto the outbound queue.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)   ← accepts connections, calls run_session
//!     ↕
//! Session (this crate)  ← frames in, frames out, one connection
//!     ↕
//! Room + Protocol (below)  ← broadcast registry, frame codec
//! ```
//!
//! [`Participant`]: parley_room::Participant

mod error;
mod runner;
mod session;

pub use error::SessionError;
pub use runner::run_session;
pub use session::{Session, SessionConfig};
