//! Caller callbacks for channel events.
//!
//! - `on_message`: decoded inbound payload (required)
//! - `on_error`: transport error or reconnect exhaustion
//! - `on_close`: transport session closed
//! - `on_open`: transport session opened
//!
//! Handlers run on the manager's event loop task and should return quickly.
//! A panic inside a handler ends the event loop; the manager then reports
//! [`crate::Error::ManagerClosed`] for every later send.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

// ============================================================================
// Event Payloads
// ============================================================================

/// Details passed to `on_close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// WebSocket close code, if the peer sent one.
    pub code: Option<u16>,
    /// Close reason or a local description.
    pub reason: String,
}

impl CloseEvent {
    /// Creates a close event without a close code.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
        }
    }

    /// Creates a close event with a close code.
    pub fn with_code(reason: impl Into<String>, code: u16) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code: {})", self.reason, code),
            None => f.write_str(&self.reason),
        }
    }
}

/// Details passed to `on_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    /// Human-readable error message.
    pub message: String,
    /// `false` once the reconnect policy has given up.
    pub recoverable: bool,
}

impl ConnectionError {
    /// Creates a connection error.
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Callback Types
// ============================================================================

/// Callback for decoded inbound payloads.
pub type OnMessageCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Callback for transport errors.
pub type OnErrorCallback = Arc<dyn Fn(ConnectionError) + Send + Sync>;

/// Callback for session close.
pub type OnCloseCallback = Arc<dyn Fn(CloseEvent) + Send + Sync>;

/// Callback for session open.
pub type OnOpenCallback = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// EventHandlers
// ============================================================================

/// Set of caller callbacks. Only `on_message` is required by the builder.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub(crate) on_message: Option<OnMessageCallback>,
    pub(crate) on_error: Option<OnErrorCallback>,
    pub(crate) on_close: Option<OnCloseCallback>,
    pub(crate) on_open: Option<OnOpenCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_open", &self.on_open.is_some())
            .finish()
    }
}

impl EventHandlers {
    /// Creates an empty handler set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the inbound message callback.
    #[must_use]
    pub fn on_message(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Registers the error callback.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Registers the close callback.
    #[must_use]
    pub fn on_close(mut self, f: impl Fn(CloseEvent) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    /// Registers the open callback.
    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    /// Returns `true` if the required message callback is set.
    #[inline]
    #[must_use]
    pub fn has_message_handler(&self) -> bool {
        self.on_message.is_some()
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    pub(crate) fn emit_message(&self, payload: Value) {
        if let Some(cb) = &self.on_message {
            cb(payload);
        }
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }

    pub(crate) fn emit_close(&self, event: CloseEvent) {
        if let Some(cb) = &self.on_close {
            cb(event);
        }
    }

    pub(crate) fn emit_open(&self) {
        if let Some(cb) = &self.on_open {
            cb();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
