//! Shared utilities for demos.
//!
//! Provides common functionality used across demos:
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Default chat server WebSocket URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

/// Default chat server HTTP URL for history.
pub const DEFAULT_HTTP_URL: &str = "http://localhost:8080";

/// Default channel.
pub const DEFAULT_CHANNEL: &str = "1";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_history: bool,
    pub ws_url: String,
    pub http_url: String,
    pub channel: String,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// Flags: `--debug`, `--no-history`, `--url=<ws url>`, `--http=<http url>`,
    /// `--channel=<id>`.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value = |prefix: &str, default: &str| {
            args.iter()
                .find_map(|a| a.strip_prefix(prefix))
                .unwrap_or(default)
                .to_string()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_history: args.iter().any(|a| a == "--no-history"),
            ws_url: value("--url=", DEFAULT_WS_URL),
            http_url: value("--http=", DEFAULT_HTTP_URL),
            channel: value("--channel=", DEFAULT_CHANNEL),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging. `RUST_LOG` overrides the default filter.
pub fn init_logging(debug: bool) {
    let default = if debug { "realm_link=debug" } else { "realm_link=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
