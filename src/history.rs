//! Channel message history.
//!
//! Live frames only carry messages sent while connected. Earlier messages
//! come from the REST endpoint `GET {base}/channel/{id}/history`, which
//! answers with a JSON array of [`ChatMessage`]s.
//!
//! # Example
//!
//! ```no_run
//! use realm_link::{ChannelId, HistoryClient};
//!
//! # async fn example() -> realm_link::Result<()> {
//! let history = HistoryClient::new("http://localhost:8080")?;
//! for message in history.fetch(&ChannelId::from(4u64)).await? {
//!     println!("[{}] {}: {}", message.created_at, message.username, message.message);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ChannelId;
use crate::protocol::ChatMessage;

// ============================================================================
// Constants
// ============================================================================

/// Request timeout for history fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// HistoryClient
// ============================================================================

/// Client for the channel history endpoint.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base: Url,
    client: reqwest::Client,
}

impl HistoryClient {
    /// Creates a client for an `http://` or `https://` base URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `base` does not parse
    /// - [`Error::InvalidEndpoint`] if the scheme is not HTTP
    /// - [`Error::Request`] if the HTTP client cannot be built
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Self::with_client(base, client)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new), minus client construction.
    pub fn with_client(base: &str, client: reqwest::Client) -> Result<Self> {
        let base = Url::parse(base)?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::invalid_endpoint(
                base.as_str(),
                format!("expected http or https scheme, got '{}'", base.scheme()),
            ));
        }
        if base.cannot_be_a_base() {
            return Err(Error::invalid_endpoint(base.as_str(), "URL cannot be a base"));
        }

        Ok(Self { base, client })
    }

    /// Base URL.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of the history endpoint for `channel`.
    #[must_use]
    pub fn history_url(&self, channel: &ChannelId) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);

        // Checked in the constructor
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["channel", channel.as_str(), "history"]);
        }
        url
    }

    /// Fetches the stored messages of `channel`.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the server answers with a non-success status
    /// - [`Error::Request`] on transport failure or an undecodable body
    pub async fn fetch(&self, channel: &ChannelId) -> Result<Vec<ChatMessage>> {
        let url = self.history_url(channel);
        debug!(%channel, %url, "Fetching channel history");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(%channel, status = status.as_u16(), "History request failed");
            return Err(Error::http(status.as_u16(), url.as_str()));
        }

        let messages: Vec<ChatMessage> = response.json().await?;
        debug!(%channel, count = messages.len(), "Channel history received");

        Ok(messages)
    }
}

// ============================================================================
// Tests
// ============================================================================
