//! Accept loops and the multi-endpoint service builder.
//!
//! This is the entry point for running a relay. It ties the layers
//! together: transport → session → room. Each listening endpoint gets
//! its own [`ChatServer`]; a [`ChatService`] runs several of them
//! against one shared room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use parley_room::{RoomConfig, RoomHandle, spawn_room};
use parley_session::{SessionConfig, run_session};
use parley_transport::{Connection, TcpTransport, Transport, TransportError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::ParleyError;

/// One listening endpoint feeding a shared room.
pub struct ChatServer<T: Transport = TcpTransport> {
    transport: T,
    room: RoomHandle,
    session_config: Arc<SessionConfig>,
}

impl<T: Transport> ChatServer<T> {
    /// Creates a server that hands every accepted connection to `room`.
    pub fn new(
        transport: T,
        room: RoomHandle,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            room,
            session_config: Arc::new(session_config),
        }
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Every accepted connection gets its own session task. Accept
    /// errors are logged and the loop keeps going. Sessions already
    /// running are not stopped when the loop exits.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "accepting connections");

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => accepted,
            };

            match accepted {
                Ok(conn) => self.spawn_session(conn),
                Err(TransportError::Shutdown) => break,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }

        self.transport.shutdown().await;
        tracing::info!(?addr, "accept loop stopped");
    }

    fn spawn_session(&self, conn: T::Connection) {
        let room = self.room.clone();
        let config = Arc::clone(&self.session_config);
        tokio::spawn(async move {
            let id = conn.id();
            if let Err(e) = run_session(conn, room, &config).await {
                tracing::debug!(%id, error = %e, "connection ended with error");
            }
        });
    }
}

/// Builder for a relay listening on one or more addresses.
///
/// # Example
///
/// ```rust,no_run
/// # async fn start() -> Result<(), parley::ParleyError> {
/// let service = parley::ChatServiceBuilder::new()
///     .bind("0.0.0.0:5000")
///     .bind("0.0.0.0:5001")
///     .build()
///     .await?;
/// service.run_until_ctrl_c().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ChatServiceBuilder {
    bind_addrs: Vec<String>,
    room_config: RoomConfig,
    session_config: SessionConfig,
}

impl ChatServiceBuilder {
    /// Creates a new builder with default settings and no endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address to listen on. May be called repeatedly; every
    /// endpoint shares the same room.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addrs.push(addr.into());
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the per-connection configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds every endpoint, then starts the room.
    ///
    /// # Errors
    ///
    /// [`ParleyError::NoEndpoints`] if [`bind`](Self::bind) was never
    /// called, or the first bind failure. Nothing is served unless every
    /// endpoint binds.
    pub async fn build(self) -> Result<ChatService, ParleyError> {
        if self.bind_addrs.is_empty() {
            return Err(ParleyError::NoEndpoints);
        }

        if self.session_config.outbound_capacity
            < self.room_config.history_limit
        {
            tracing::warn!(
                outbound_capacity = self.session_config.outbound_capacity,
                history_limit = self.room_config.history_limit,
                "outbound queue smaller than history, joiners may be dropped"
            );
        }

        let mut transports = Vec::with_capacity(self.bind_addrs.len());
        for addr in &self.bind_addrs {
            transports.push(TcpTransport::bind(addr).await?);
        }

        let room = spawn_room(self.room_config);
        let servers = transports
            .into_iter()
            .map(|transport| {
                ChatServer::new(
                    transport,
                    room.clone(),
                    self.session_config.clone(),
                )
            })
            .collect();

        Ok(ChatService { room, servers })
    }
}

/// A bound relay: one room and an accept loop per endpoint.
///
/// Nothing is accepted until [`run_until`](Self::run_until) or
/// [`run_until_ctrl_c`](Self::run_until_ctrl_c) is called, although the
/// operating system queues incoming connections from `build` onwards.
pub struct ChatService {
    room: RoomHandle,
    servers: Vec<ChatServer>,
}

impl ChatService {
    /// Creates a new builder.
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::new()
    }

    /// Addresses of every endpoint, in the order they were bound.
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.servers
            .iter()
            .filter_map(|server| server.local_addr().ok())
            .collect()
    }

    /// Handle to the shared room.
    pub fn room(&self) -> &RoomHandle {
        &self.room
    }

    /// Runs every accept loop until `shutdown` completes, then stops the
    /// room.
    ///
    /// # Errors
    ///
    /// Returns [`ParleyError::Room`] if the room had already stopped.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ParleyError>
    where
        F: Future<Output = ()> + Send,
    {
        let stop = CancellationToken::new();
        let mut loops = JoinSet::new();
        for server in self.servers {
            let stop = stop.clone();
            loops.spawn(server.run_until(async move {
                stop.cancelled().await;
            }));
        }

        shutdown.await;
        tracing::info!("shutting down");
        stop.cancel();

        while let Some(result) = loops.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "accept loop panicked");
            }
        }

        self.room.shutdown().await?;
        Ok(())
    }

    /// Runs until the process receives Ctrl-C.
    pub async fn run_until_ctrl_c(self) -> Result<(), ParleyError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await
    }
}
