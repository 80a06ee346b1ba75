//! Local channel server for runtime tests.
//!
//! Binds `127.0.0.1:0` and upgrades incoming connections, recording the
//! request URI so tests can check the channel parameter.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// How long tests wait for the manager to connect.
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// TestServer
// ============================================================================

/// WebSocket server standing in for the chat backend.
pub(crate) struct TestServer {
    listener: TcpListener,
    port: u16,
}

impl TestServer {
    /// Binds to a random localhost port.
    pub(crate) async fn bind() -> Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        debug!(port, "Test server bound");

        Ok(Self { listener, port })
    }

    /// Returns the base URL, without channel parameter.
    pub(crate) fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Accepts one client and returns the socket with its request URI.
    pub(crate) async fn accept(&self) -> Result<(WebSocketStream<TcpStream>, String)> {
        let (stream, addr) = timeout(ACCEPT_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(ACCEPT_TIMEOUT.as_millis() as u64))??;

        debug!(?addr, "Test server accepted TCP connection");

        let mut uri = String::new();
        let capture = |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
            uri = request.uri().to_string();
            Ok(response)
        };

        let ws = tokio_tungstenite::accept_hdr_async(stream, capture)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        Ok((ws, uri))
    }

    /// Accepts the TCP connection but never completes the upgrade.
    pub(crate) async fn accept_and_stall(&self) -> Result<TcpStream> {
        let (stream, _) = timeout(ACCEPT_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(ACCEPT_TIMEOUT.as_millis() as u64))??;
        Ok(stream)
    }
}
