//! Transport session factory.
//!
//! [`Connector`] is the seam between the manager and the network. The
//! default [`WsConnector`] performs a plain tokio-tungstenite client
//! handshake; custom connectors can add headers, TLS roots or proxies.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream produced by a [`Connector`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connector
// ============================================================================

/// Opens transport sessions.
///
/// Called once per connect attempt; the returned stream is owned by a single
/// session and dropped when that session ends.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Performs the WebSocket handshake against `url`.
    ///
    /// # Errors
    ///
    /// Any error is reported to the manager as a transport error followed by
    /// a close.
    async fn connect(&self, url: &Url) -> Result<WsStream>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// Default connector using [`tokio_tungstenite::connect_async`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<WsStream> {
        let (stream, response) = connect_async(url.as_str()).await?;
        debug!(%url, status = %response.status(), "WebSocket handshake completed");
        Ok(stream)
    }
}
