//! Channel endpoint URLs.
//!
//! A channel endpoint is the server base URL with the channel token added as
//! a query parameter:
//!
//! ```text
//! ws://localhost:8080            + channel 4  →  ws://localhost:8080/?locationId=4
//! wss://chat.example/ws?v=2      + channel 4  →  wss://chat.example/ws?v=2&locationId=4
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ChannelId;

// ============================================================================
// Constants
// ============================================================================

/// Query parameter carrying the channel token.
pub const CHANNEL_QUERY_PARAM: &str = "locationId";

// ============================================================================
// Functions
// ============================================================================

/// Builds the endpoint for `channel` from a `ws://` or `wss://` base URL.
///
/// Existing query parameters are kept; a previous channel parameter is
/// replaced.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if `base` does not parse or its scheme
/// is not `ws` or `wss`.
pub fn channel_url(base: &str, channel: &ChannelId) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::invalid_endpoint(base, e.to_string()))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::invalid_endpoint(
            base,
            format!("unsupported scheme '{}', expected ws or wss", url.scheme()),
        ));
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CHANNEL_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(CHANNEL_QUERY_PARAM, channel.as_str());

    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
