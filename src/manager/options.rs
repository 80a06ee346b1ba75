//! Connection manager options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use realm_link::{ManagerOptions, ReconnectPolicy};
//!
//! let options = ManagerOptions::new()
//!     .with_base_url("ws://localhost:8080")
//!     .with_channel(4)
//!     .with_establish_timeout(Duration::from_secs(3))
//!     .with_reconnect_policy(ReconnectPolicy::capped_doubling(
//!         Duration::from_secs(1),
//!         Duration::from_secs(30),
//!     ));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use super::policy::ReconnectPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Default time a session may take to reach open.
pub const DEFAULT_ESTABLISH_TIMEOUT: Duration = Duration::from_millis(5000);

// ============================================================================
// ManagerOptions
// ============================================================================

/// Plain configuration for a connection manager.
///
/// Values are validated when the manager is built, not when they are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Chat server base URL (`ws://` or `wss://`).
    pub base_url: Option<String>,

    /// Channel token, validated into a [`crate::ChannelId`] at build time.
    pub channel: Option<String>,

    /// Time a session may take to reach open before it is force-closed.
    pub establish_timeout: Duration,

    /// Delay schedule between reconnect attempts.
    pub reconnect_policy: ReconnectPolicy,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            channel: None,
            establish_timeout: DEFAULT_ESTABLISH_TIMEOUT,
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl ManagerOptions {
    /// Creates options with default timeouts and policy.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat server base URL.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the channel token.
    #[inline]
    #[must_use]
    pub fn with_channel(mut self, channel: impl ToString) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    /// Sets the establishment timeout.
    #[inline]
    #[must_use]
    pub fn with_establish_timeout(mut self, timeout: Duration) -> Self {
        self.establish_timeout = timeout;
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
