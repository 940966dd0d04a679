//! `ParlorServer` builder and accept loop.
//!
//! The entry point for running a Parlor server: it wires transport →
//! protocol → engine and spawns one handler task per connection.

use std::sync::Arc;

use parlor_engine::{Engine, EngineConfig, StatsSink};
use parlor_protocol::{Codec, JsonCodec};
use parlor_store::MatchStore;
use parlor_transport::{Transport, WebSocketTransport};

use crate::ParlorError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S, T, C> {
    pub(crate) engine: Engine<S, T>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStore::new(), NoopStats)
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    engine_config: EngineConfig,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            engine_config: EngineConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the engine configuration (reclaim timeout etc.).
    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Builds the server over the given store and stats sink.
    ///
    /// Uses `JsonCodec` and the WebSocket transport.
    pub async fn build<S: MatchStore, T: StatsSink>(
        self,
        store: S,
        stats: T,
    ) -> Result<ParlorServer<S, T, JsonCodec>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let engine = Engine::new(store, stats, self.engine_config);

        Ok(ParlorServer {
            transport,
            state: Arc::new(ServerState { engine, codec: JsonCodec }),
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<S, T, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, T, C>>,
}

impl<S, T, C> ParlorServer<S, T, C>
where
    S: MatchStore,
    T: StatsSink,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The engine behind this server. Useful for wiring health checks
    /// or driving the same engine from another surface.
    pub fn engine(&self) -> &Engine<S, T> {
        &self.state.engine
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<S, T, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
