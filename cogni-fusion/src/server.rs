//! TCP listener for the vision producer

use std::net::SocketAddr;

use cogni_common::events::SessionStats;
use tokio::net::TcpListener;
use tracing::info;

use crate::engine::FusionEngine;
use crate::error::{Error, Result};
use crate::ingest::{IngestConfig, ObservationStream};

/// Accepts one producer connection and runs its session
pub struct FusionServer {
    listener: TcpListener,
    ingest: IngestConfig,
}

impl FusionServer {
    pub async fn bind(addr: &str, ingest: IngestConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!("Fusion server listening on {}", listener.local_addr()?);
        Ok(Self { listener, ingest })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for a producer, then run the session until it ends
    ///
    /// The connection is closed when this returns, on every path.
    pub async fn serve_one(&self, engine: &mut FusionEngine) -> Result<SessionStats> {
        info!("Waiting for vision producer...");
        let (socket, peer) = self.listener.accept().await?;
        socket.set_nodelay(true)?;

        engine.start_session(&peer.to_string());
        let mut stream = ObservationStream::new(socket, self.ingest);
        engine.run(&mut stream).await
    }
}
