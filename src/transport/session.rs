//! Transport session task.
//!
//! Each connect attempt spawns one session task. The task performs the
//! handshake through a [`Connector`], then pumps frames in both directions
//! until the socket closes or the manager discards it. Everything it observes
//! is reported as a [`TransportEvent`] tagged with its [`SessionId`], so
//! events from a discarded session can be told apart from the live one.
//!
//! # Event Order
//!
//! ```text
//! connect ok:    Opened → Frame* → [Error] → Closed
//! connect fails: Error → Closed
//! discarded:     (nothing further)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::manager::{CloseEvent, TransportEvent};

use super::connector::Connector;

// ============================================================================
// Types
// ============================================================================

/// Sender half used by sessions to report events to the manager loop.
pub(crate) type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Commands from the manager loop to a session task.
#[derive(Debug)]
enum Outbound {
    /// Write a text frame.
    Text(String),
    /// Close the socket and stop.
    Close,
}

// ============================================================================
// SessionHandle
// ============================================================================

/// Owner-side handle of a running session task.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    id: SessionId,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
}

impl SessionHandle {
    /// Spawns a session task connecting to `url`.
    pub(crate) fn spawn(
        id: SessionId,
        url: Url,
        connector: Arc<dyn Connector>,
        events: EventSender,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_session(id, url, connector, outbound_rx, events));

        Self { id, outbound_tx }
    }

    /// Session id.
    #[inline]
    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    /// Queues a text frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the session task has ended.
    pub(crate) fn transmit(&self, text: String) -> Result<()> {
        self.outbound_tx
            .send(Outbound::Text(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Asks the task to close the socket. A task still inside the handshake
    /// abandons it.
    pub(crate) fn close(self) {
        let _ = self.outbound_tx.send(Outbound::Close);
        trace!(session = %self.id, "Session discarded");
    }
}

// ============================================================================
// Session Task
// ============================================================================

async fn run_session(
    id: SessionId,
    url: Url,
    connector: Arc<dyn Connector>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
) {
    let connected = tokio::select! {
        result = connector.connect(&url) => result,
        _ = outbound_rx.recv() => {
            debug!(session = %id, "Session discarded during handshake");
            return;
        }
    };

    let stream = match connected {
        Ok(stream) => stream,
        Err(e) => {
            debug!(session = %id, error = %e, "Connect failed");
            let _ = events.send(TransportEvent::Error {
                session: id,
                message: e.to_string(),
            });
            let _ = events.send(TransportEvent::Closed {
                session: id,
                close: CloseEvent::new(format!("connect failed: {e}")),
            });
            return;
        }
    };

    let _ = events.send(TransportEvent::Opened { session: id });

    let (mut ws_write, mut ws_read) = stream.split();

    let close = loop {
        tokio::select! {
            // Incoming frames from the channel server
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Frame {
                            session: id,
                            text: text.as_str().to_owned(),
                        });
                    }

                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => {
                            let _ = events.send(TransportEvent::Frame { session: id, text });
                        }
                        Err(_) => {
                            warn!(session = %id, len = bytes.len(), "Dropping non-UTF-8 binary frame");
                        }
                    },

                    Some(Ok(Message::Close(frame))) => {
                        debug!(session = %id, "WebSocket closed by remote");
                        break match frame {
                            Some(frame) => {
                                CloseEvent::with_code(frame.reason.as_str(), u16::from(frame.code))
                            }
                            None => CloseEvent::new("closed by remote"),
                        };
                    }

                    Some(Err(e)) => {
                        let _ = events.send(TransportEvent::Error {
                            session: id,
                            message: e.to_string(),
                        });
                        break CloseEvent::new(format!("transport error: {e}"));
                    }

                    None => {
                        debug!(session = %id, "WebSocket stream ended");
                        break CloseEvent::new("stream ended");
                    }

                    // Ignore Ping, Pong, raw frames
                    Some(Ok(_)) => {}
                }
            }

            // Commands from the manager loop
            command = outbound_rx.recv() => {
                match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            let _ = events.send(TransportEvent::Error {
                                session: id,
                                message: e.to_string(),
                            });
                            break CloseEvent::new(format!("send failed: {e}"));
                        }
                        trace!(session = %id, "Frame sent");
                    }

                    Some(Outbound::Close) | None => {
                        let _ = ws_write.close().await;
                        break CloseEvent::new("closed locally");
                    }
                }
            }
        }
    };

    let _ = events.send(TransportEvent::Closed { session: id, close });
    debug!(session = %id, "Session task terminated");
}
