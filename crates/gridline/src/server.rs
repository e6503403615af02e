//! `GridlineServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room core.

use std::net::SocketAddr;
use std::sync::Arc;

use gridline_protocol::{Codec, JsonCodec};
use gridline_room::{RoomManager, TemplateCatalog};
use gridline_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::GridlineError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// Every room operation goes through this lock, so two calls touching
    /// the same room never interleave.
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Gridline server.
///
/// # Example
///
/// ```rust,ignore
/// let server = GridlineServer::builder()
///     .bind("0.0.0.0:8080")
///     .templates(catalog)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GridlineServerBuilder {
    bind_addr: String,
    catalog: TemplateCatalog,
}

impl GridlineServerBuilder {
    /// Creates a builder bound to `127.0.0.1:8080` with the default catalog.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            catalog: TemplateCatalog::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the templates the room pool keeps a spare room for.
    pub fn templates(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Binds the listener and stocks the room pool.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build(self) -> Result<GridlineServer<JsonCodec>, GridlineError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        tracing::info!(templates = self.catalog.len(), "stocking room pool");
        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.catalog)),
            codec: JsonCodec,
        });

        Ok(GridlineServer { transport, state })
    }
}

impl Default for GridlineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gridline server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridlineServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GridlineServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GridlineServerBuilder {
        GridlineServerBuilder::new()
    }
}

impl<C: Codec> GridlineServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GridlineError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection is served by its own task.
    pub async fn run(mut self) -> Result<(), GridlineError> {
        tracing::info!(addr = %self.local_addr()?, "Gridline server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
