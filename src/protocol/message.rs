//! Inbound frame decoding.
//!
//! The channel treats inbound frames as opaque JSON. Location chat servers
//! emit [`ChatMessage`] shaped frames, and the history endpoint returns the
//! same shape.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, from_value};

use crate::error::{Error, Result};

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a text frame into structured JSON.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the frame is not valid JSON.
pub fn decode_frame(text: &str) -> Result<Value> {
    from_str(text).map_err(|e| Error::decode(e.to_string()))
}

/// Interprets a decoded frame as a concrete type.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the value does not match `T`.
pub fn decode_as<T: DeserializeOwned>(value: &Value) -> Result<T> {
    from_value(value.clone()).map_err(|e| Error::decode(e.to_string()))
}

// ============================================================================
// ChatMessage
// ============================================================================

/// One line of location chat.
///
/// # Format
///
/// ```json
/// { "username": "aria", "message": "hello", "createdAt": "2024-05-01T10:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author display name.
    pub username: String,

    /// Message body.
    pub message: String,

    /// Server timestamp, passed through as sent.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_decode_valid_frame() {
        let value = decode_frame(r#"{"username":"aria","message":"hi"}"#).unwrap();
        assert_eq!(value["username"], "aria");
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = decode_frame("hello there").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_json() {
        assert!(decode_frame(r#"{"username":"#).is_err());
    }

    #[test]
    fn test_decode_as_chat_message() {
        let value = json!({
            "username": "aria",
            "message": "The gate is open",
            "createdAt": "2024-05-01T10:00:00Z"
        });

        let chat: ChatMessage = decode_as(&value).unwrap();
        assert_eq!(chat.username, "aria");
        assert_eq!(chat.created_at, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_decode_as_wrong_shape() {
        let value = json!({ "username": 7 });
        assert!(decode_as::<ChatMessage>(&value).is_err());
    }
}
