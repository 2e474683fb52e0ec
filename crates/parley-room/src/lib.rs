//! Broadcast room for Parley.
//!
//! One room is shared by every connection on the server. It keeps the
//! set of current participants and a bounded history of recent messages,
//! and fans each delivered message out to every participant.
//!
//! # Key types
//!
//! - [`Participant`]: the single-method capability the room delivers to
//! - [`Room`]: the membership registry and history (plain data, no I/O)
//! - [`RoomHandle`]: send commands to the room actor that owns a `Room`
//! - [`RoomConfig`]: history size and channel capacity
//!
//! All mutations go through the actor, one command at a time, so join,
//! leave and deliver never race no matter which runtime thread the
//! calling connection task happens to run on.

mod actor;
mod config;
mod error;
mod participant;
mod room;

pub use actor::{RoomHandle, RoomInfo, spawn_room};
pub use config::RoomConfig;
pub use error::RoomError;
pub use participant::Participant;
pub use room::Room;
