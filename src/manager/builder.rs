//! Builder pattern for connection managers.
//!
//! # Example
//!
//! ```no_run
//! use realm_link::ConnectionManager;
//!
//! # async fn example() -> realm_link::Result<()> {
//! let manager = ConnectionManager::builder()
//!     .base_url("ws://localhost:8080")
//!     .channel(4)
//!     .on_message(|payload| println!("{payload}"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ChannelId;
use crate::transport::{Connector, WsConnector, channel_url};

use super::core::ConnectionManager;
use super::handlers::{CloseEvent, ConnectionError, EventHandlers};
use super::options::ManagerOptions;
use super::policy::ReconnectPolicy;

// ============================================================================
// ManagerBuilder
// ============================================================================

/// Builder for a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ManagerBuilder {
    options: ManagerOptions,
    handlers: EventHandlers,
    connector: Option<Arc<dyn Connector>>,
}

impl fmt::Debug for ManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerBuilder")
            .field("options", &self.options)
            .field("handlers", &self.handlers)
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

// ============================================================================
// ManagerBuilder Implementation
// ============================================================================

impl ManagerBuilder {
    /// Creates a builder with default options and no handlers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat server base URL, e.g. `ws://localhost:8080`.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = Some(url.into());
        self
    }

    /// Sets the channel to subscribe to. Accepts strings and numbers.
    #[inline]
    #[must_use]
    pub fn channel(mut self, channel: impl ToString) -> Self {
        self.options.channel = Some(channel.to_string());
        self
    }

    /// Sets the establishment timeout.
    #[inline]
    #[must_use]
    pub fn establish_timeout(mut self, timeout: Duration) -> Self {
        self.options.establish_timeout = timeout;
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.options.reconnect_policy = policy;
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces all handlers at once.
    #[inline]
    #[must_use]
    pub fn handlers(mut self, handlers: EventHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Registers the inbound message callback (required).
    ///
    /// Handlers run on the manager's event loop and must not block or panic.
    /// A panicking handler stops the event loop: the status stays where it
    /// was and later sends fail with [`Error::ManagerClosed`]. The same holds
    /// for every `on_*` handler.
    #[must_use]
    pub fn on_message(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_message(f);
        self
    }

    /// Registers the error callback. Runs on the event loop, see [`on_message`](Self::on_message).
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_error(f);
        self
    }

    /// Registers the close callback. Runs on the event loop, see [`on_message`](Self::on_message).
    #[must_use]
    pub fn on_close(mut self, f: impl Fn(CloseEvent) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_close(f);
        self
    }

    /// Registers the open callback. Runs on the event loop, see [`on_message`](Self::on_message).
    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_open(f);
        self
    }

    /// Uses a custom connector instead of [`WsConnector`].
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Validates the configuration and starts the manager.
    ///
    /// The first connect attempt begins immediately.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the channel, base URL or message handler is
    ///   missing, the policy is invalid, or no tokio runtime is running
    /// - [`Error::InvalidEndpoint`] if the base URL is unusable
    pub fn build(self) -> Result<ConnectionManager> {
        let channel = self.validate_channel()?;
        let endpoint = self.validate_endpoint(&channel)?;
        self.validate_handlers()?;
        self.options.reconnect_policy.validate()?;

        if self.options.establish_timeout.is_zero() {
            return Err(Error::config("establish timeout must be non-zero"));
        }

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>);

        ConnectionManager::start(channel, endpoint, self.options, self.handlers, connector)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ManagerBuilder {
    fn validate_channel(&self) -> Result<ChannelId> {
        let token = self.options.channel.clone().ok_or_else(|| {
            Error::config(
                "Channel identifier is required. Use .channel() to set it.\n\
                 Example: ConnectionManager::builder().channel(4)",
            )
        })?;

        ChannelId::new(token)
    }

    fn validate_endpoint(&self, channel: &ChannelId) -> Result<Url> {
        let base = self.options.base_url.as_deref().ok_or_else(|| {
            Error::config(
                "Base URL is required. Use .base_url() to set it.\n\
                 Example: ConnectionManager::builder().base_url(\"ws://localhost:8080\")",
            )
        })?;

        channel_url(base, channel)
    }

    fn validate_handlers(&self) -> Result<()> {
        if !self.handlers.has_message_handler() {
            return Err(Error::config(
                "Message handler is required. Use .on_message() to set it.",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
