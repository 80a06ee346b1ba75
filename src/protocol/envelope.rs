//! Outbound envelope.
//!
//! Caller payloads are wrapped in a tagged envelope before transmission:
//!
//! ```json
//! { "type": "message", "content": { ... } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, to_string, to_value};

use crate::error::Result;

// ============================================================================
// OutboundEnvelope
// ============================================================================

/// A frame sent from the client to the channel server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundEnvelope {
    /// Chat message carrying the caller's payload verbatim.
    Message {
        /// Caller payload.
        content: Value,
    },
}

impl OutboundEnvelope {
    /// Wraps an already-shaped payload.
    #[inline]
    #[must_use]
    pub fn message(content: Value) -> Self {
        Self::Message { content }
    }

    /// Wraps any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the payload cannot be represented as JSON.
    pub fn from_payload<T: Serialize + ?Sized>(payload: &T) -> Result<Self> {
        Ok(Self::message(to_value(payload)?))
    }

    /// Serializes the envelope to frame text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Returns the wrapped payload.
    #[inline]
    #[must_use]
    pub fn content(&self) -> &Value {
        match self {
            Self::Message { content } => content,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
