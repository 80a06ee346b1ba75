//! Connection state and caller-facing status.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

/// Status text once the reconnect policy has given up.
pub const EXHAUSTED_MESSAGE: &str =
    "Unable to establish connection. Please refresh the page to try again.";

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the channel. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// A transport session is being established.
    #[default]
    Connecting,
    /// The transport session is open and frames flow both ways.
    Open,
    /// No live session. May be waiting for a reconnect.
    Closed,
    /// The transport reported an error; a close follows.
    Errored,
}

impl ConnectionState {
    /// Returns `true` if frames can be sent.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        })
    }
}

// ============================================================================
// Status
// ============================================================================

/// Snapshot of the manager as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Status {
    /// Current state.
    pub state: ConnectionState,

    /// Reconnect attempts dispatched since the last successful open.
    pub retry_count: u32,

    /// Last error text, cleared on open.
    pub error_message: Option<String>,

    /// The reconnect policy gave up; only a manual refresh recovers.
    pub exhausted: bool,

    /// The owner closed the manager.
    pub manually_closed: bool,
}

impl Status {
    /// Human-readable status line for display.
    #[must_use]
    pub fn status_message(&self) -> String {
        if self.exhausted {
            return EXHAUSTED_MESSAGE.to_string();
        }

        match self.state {
            ConnectionState::Connecting if self.retry_count > 0 => {
                format!("Reconnecting (attempt {})...", self.retry_count)
            }
            ConnectionState::Connecting => "Connecting...".to_string(),
            ConnectionState::Open => "Connected".to_string(),
            ConnectionState::Closed if self.manually_closed => "Disconnected".to_string(),
            ConnectionState::Closed => "Connection lost. Reconnecting...".to_string(),
            ConnectionState::Errored => self
                .error_message
                .clone()
                .unwrap_or_else(|| "Connection error".to_string()),
        }
    }

    /// Returns `true` if no further automatic attempt will be made.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.exhausted || self.manually_closed
    }
}

// ============================================================================
// Tests
// ============================================================================
