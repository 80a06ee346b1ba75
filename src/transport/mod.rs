//! WebSocket transport layer.
//!
//! Connects the manager to the chat backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   TransportEvent    ┌──────────────────┐
//! │  ConnectionManager   │◄────────────────────│  Session task    │      WebSocket
//! │  (event loop task)   │                     │  (one per        │◄────────────────► chat server
//! │                      │────────────────────►│   attempt)       │  ?locationId=<id>
//! └──────────────────────┘   text / close      └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | Handshake seam and default tokio-tungstenite connector |
//! | `endpoint` | Channel endpoint URL building |
//! | `session` | Per-attempt session task (internal) |

// ============================================================================
// Submodules
// ============================================================================

/// Handshake seam.
pub mod connector;

/// Channel endpoint URLs.
pub mod endpoint;

/// Per-attempt session task.
pub(crate) mod session;

#[cfg(test)]
pub(crate) mod test_server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{Connector, WsConnector, WsStream};
pub use endpoint::{CHANNEL_QUERY_PARAM, channel_url};
