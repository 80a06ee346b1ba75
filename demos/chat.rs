//! Interactive location chat.
//!
//! Demonstrates:
//! - Fetching stored channel history
//! - Connecting a channel with handlers for every event
//! - Sending lines typed on stdin
//! - Watching status changes while reconnecting
//!
//! Usage:
//!   cargo run --example chat
//!   cargo run --example chat -- --channel=4
//!   cargo run --example chat -- --url=ws://localhost:8080 --http=http://localhost:8080
//!   cargo run --example chat -- --debug --no-history

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use realm_link::protocol::decode_as;
use realm_link::{ChannelId, ChatMessage, ConnectionManager, HistoryClient, Result};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Location Chat ===\n");

    let channel = ChannelId::new(args.channel.as_str())?;

    // ========================================================================
    // History
    // ========================================================================

    if !args.no_history {
        println!("[1] Fetching history from {}...", args.http_url);
        match HistoryClient::new(&args.http_url)?.fetch(&channel).await {
            Ok(messages) => {
                for message in &messages {
                    print_message(message);
                }
                println!("    ✓ {} messages\n", messages.len());
            }
            Err(e) => println!("    ✗ History unavailable: {e}\n"),
        }
    }

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[2] Connecting to {} (channel {channel})...", args.ws_url);

    let manager = ConnectionManager::builder()
        .base_url(&args.ws_url)
        .channel(&channel)
        .on_open(|| println!("    ✓ Connected"))
        .on_message(|payload| match decode_as::<ChatMessage>(&payload) {
            Ok(message) => print_message(&message),
            Err(_) => println!("    [raw] {payload}"),
        })
        .on_error(|error| println!("    ✗ {error}"))
        .on_close(|event| println!("    ~ Closed: {event}"))
        .build()?;

    let mut status_rx = manager.subscribe_status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let line = status_rx.borrow_and_update().status_message();
            println!("    [status] {line}");
        }
    });

    // ========================================================================
    // Chat
    // ========================================================================

    println!("\n[3] Type a message and press Enter. Ctrl+C to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if let Err(e) = manager.send(&json!({ "text": text })).await {
                    println!("    ✗ Not sent: {e}");
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.close().await;
    println!("\n    ✓ Disconnected");

    Ok(())
}

fn print_message(message: &ChatMessage) {
    println!("    [{}] {}: {}", message.created_at, message.username, message.message);
}
