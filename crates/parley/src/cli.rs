//! Command-line interface for the `parley` binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use parley_room::RoomConfig;
use parley_session::SessionConfig;

use crate::ChatServiceBuilder;

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    version,
    about = "Broadcast chat relay: every message goes to every client"
)]
pub struct Cli {
    /// Ports to listen on. Clients on any port share one room.
    #[arg(required = true, value_name = "PORT")]
    pub ports: Vec<u16>,

    /// Address every port is bound on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Number of recent messages replayed to clients when they join.
    #[arg(long, default_value_t = 100)]
    pub history: usize,

    /// Messages queued for one client before it is disconnected as too
    /// slow.
    #[arg(long, default_value_t = 1024)]
    pub queue_capacity: usize,
}

impl Cli {
    /// Socket addresses to bind, one per port.
    pub fn bind_addrs(&self) -> Vec<SocketAddr> {
        self.ports
            .iter()
            .map(|&port| SocketAddr::new(self.host, port))
            .collect()
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            history_limit: self.history,
            ..RoomConfig::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            outbound_capacity: self.queue_capacity,
        }
    }

    /// A service builder with every endpoint and setting from the
    /// command line.
    pub fn to_builder(&self) -> ChatServiceBuilder {
        self.bind_addrs().into_iter().fold(
            ChatServiceBuilder::new()
                .room_config(self.room_config())
                .session_config(self.session_config()),
            |builder, addr| builder.bind(addr.to_string()),
        )
    }
}
