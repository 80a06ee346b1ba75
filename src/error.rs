//! Error types for realm-link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use realm_link::{ConnectionManager, Result};
//!
//! async fn greet(manager: &ConnectionManager) -> Result<()> {
//!     manager.send(&serde_json::json!({ "text": "hi" })).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::RetriesExhausted`] |
//! | Channel usage | [`Error::NotOpen`], [`Error::ManagerClosed`] |
//! | Protocol | [`Error::Decode`] |
//! | History | [`Error::Http`], [`Error::Request`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::manager::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by the builder when a required option is missing or invalid.
    /// No connection attempt is made.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL cannot be used for a channel connection.
    #[error("Invalid endpoint '{url}': {message}")]
    InvalidEndpoint {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport session could not be established or failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Session did not open within the establishment timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Transport session closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reconnect policy ran out of attempts.
    #[error("Unable to establish connection after {attempts} attempts")]
    RetriesExhausted {
        /// Number of reconnect attempts dispatched.
        attempts: u32,
    },

    // ========================================================================
    // Channel Usage Errors
    // ========================================================================
    /// Message not sent because the channel is not open.
    #[error("Message not sent: connection is {state}")]
    NotOpen {
        /// State at the time of the send.
        state: ConnectionState,
    },

    /// The manager was closed by its owner.
    #[error("Connection manager is closed")]
    ManagerClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame is not valid JSON.
    #[error("Failed to decode frame: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },

    // ========================================================================
    // History Errors
    // ========================================================================
    /// History endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// HTTP request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a not-open error.
    #[inline]
    pub fn not_open(state: ConnectionState) -> Self {
        Self::NotOpen { state }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http(status: u16, url: impl Into<String>) -> Self {
        Self::Http {
            status,
            url: url.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::RetriesExhausted { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may clear on their own once the reconnect policy
    /// brings the channel back.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotOpen { .. }
                | Self::Decode { .. }
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
