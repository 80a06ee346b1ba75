//! Realm Link - resilient chat channel client.
//!
//! This library keeps a realtime chat channel of the RPG platform connected
//! over WebSocket and delivers decoded inbound messages to a callback.
//!
//! # Architecture
//!
//! The client follows an event-loop model:
//!
//! - **Machine (pure)**: Consumes transport events, returns effects
//! - **Event loop (tokio task)**: Runs the machine, executes effects
//! - **Session tasks**: One per connect attempt, pump frames to and from the server
//!
//! Key design principles:
//!
//! - Exactly one live session per manager
//! - Events from discarded sessions or cancelled timers are ignored
//! - Reconnects follow a [`ReconnectPolicy`] and stop when it gives up
//! - A manual close is final
//!
//! # Quick Start
//!
//! ```no_run
//! use realm_link::{ConnectionManager, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .base_url("ws://localhost:8080")
//!         .channel(4)
//!         .on_message(|payload| println!("received: {payload}"))
//!         .on_error(|error| eprintln!("error: {error}"))
//!         .build()?;
//!
//!     // The first session is still connecting right after build.
//!     manager.wait_for_open().await?;
//!     manager.send(&json!({ "text": "Hail, traveller" })).await?;
//!     println!("{}", manager.status_message());
//!
//!     manager.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manager`] | [`ConnectionManager`], builder, policy and status |
//! | [`history`] | [`HistoryClient`] for stored channel messages |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`ChannelId`] and [`SessionId`] |
//! | [`protocol`] | Channel wire format |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Connection manager.
///
/// Use [`ConnectionManager::builder()`] to connect to a channel.
pub mod manager;

/// Channel message history over HTTP.
pub mod history;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Channel wire format.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Manager types
pub use manager::{
    CloseEvent, ConnectionError, ConnectionManager, ConnectionState, EventHandlers,
    ManagerBuilder, ManagerOptions, ReconnectPolicy, Status,
};

// History
pub use history::HistoryClient;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ChannelId, SessionId};

// Protocol types
pub use protocol::{ChatMessage, OutboundEnvelope};

// Transport seam
pub use transport::{Connector, WsConnector};
