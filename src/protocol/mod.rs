//! Channel wire format.
//!
//! Every frame is UTF-8 JSON text.
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `OutboundEnvelope` | Local → Server | Tagged chat payload |
//! | inbound frame | Server → Local | Opaque JSON, forwarded as [`serde_json::Value`] |
//! | `ChatMessage` | Server → Local | Typed view of a location chat line |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Outbound envelope encoding |
//! | `message` | Inbound frame decoding and chat message type |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound envelope encoding.
pub mod envelope;

/// Inbound frame decoding.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::OutboundEnvelope;
pub use message::{ChatMessage, decode_as, decode_frame};
