//! Type-safe identifier wrappers.
//!
//! Newtypes keep channel tokens and transport session generations from being
//! mixed with arbitrary strings and integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// ChannelId
// ============================================================================

/// Opaque token naming the logical conversation a connection subscribes to.
///
/// Location chats use the numeric location id, but any non-empty token is
/// accepted and passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a channel id from a string token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the token is empty or only whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::config("channel identifier must not be empty"));
        }
        Ok(Self(token))
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ChannelId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for ChannelId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<&str> for ChannelId {
    type Error = Error;

    fn try_from(token: &str) -> Result<Self> {
        Self::new(token)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = Error;

    fn try_from(token: String) -> Result<Self> {
        Self::new(token)
    }
}

impl From<ChannelId> for String {
    #[inline]
    fn from(channel: ChannelId) -> Self {
        channel.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Generation number of a transport session.
///
/// Each connect attempt gets a fresh id; events carrying an older id belong
/// to a discarded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// The id before any session has been opened.
    pub const INITIAL: Self = Self(0);

    /// Returns the id following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw generation number.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
