//! Connection manager handle and event loop.
//!
//! [`ConnectionManager`] is the owner-facing handle. Building one spawns an
//! event loop task that owns the [`ConnectionMachine`] and carries out the
//! effects it returns: spawning session tasks, arming timers, writing frames
//! and invoking caller handlers.
//!
//! # Event Loop
//!
//! The loop selects over two channels:
//!
//! - Commands from the handle (send, close), served first
//! - [`TransportEvent`]s from session tasks and timers
//!
//! After every step the current [`Status`] is published on a watch channel.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ChannelId, SessionId};
use crate::transport::Connector;
use crate::transport::session::{EventSender, SessionHandle};

use super::builder::ManagerBuilder;
use super::handlers::EventHandlers;
use super::machine::{ConnectionMachine, Effect, TransportEvent};
use super::options::ManagerOptions;
use super::state::{ConnectionState, Status};

// ============================================================================
// Types
// ============================================================================

/// Commands from the handle to the event loop.
enum ManagerCommand {
    /// Wrap and transmit a payload on the live session.
    Send {
        payload: Value,
        reply_tx: oneshot::Sender<Result<()>>,
    },
    /// Tear down and stop the loop.
    Close { done_tx: oneshot::Sender<()> },
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Resilient connection to one chat channel.
///
/// Connects on build, reconnects according to its
/// [`ReconnectPolicy`](super::ReconnectPolicy) and reports decoded inbound
/// payloads through `on_message`.
///
/// Dropping the manager has the same effect as [`close`](Self::close),
/// without waiting for the teardown to finish.
///
/// # Example
///
/// ```no_run
/// use realm_link::ConnectionManager;
/// use serde_json::json;
///
/// # async fn example() -> realm_link::Result<()> {
/// let manager = ConnectionManager::builder()
///     .base_url("ws://localhost:8080")
///     .channel(4)
///     .on_message(|payload| println!("received: {payload}"))
///     .build()?;
///
/// manager.wait_for_open().await?;
/// manager.send(&json!({ "text": "hello" })).await?;
/// manager.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConnectionManager {
    channel: ChannelId,
    endpoint: Url,
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    status_rx: watch::Receiver<Status>,
}

impl ConnectionManager {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    /// Spawns the event loop. Called by [`ManagerBuilder::build`].
    pub(crate) fn start(
        channel: ChannelId,
        endpoint: Url,
        options: ManagerOptions,
        handlers: EventHandlers,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::config("ConnectionManager must be built inside a tokio runtime"))?;

        let machine = ConnectionMachine::new(
            endpoint.clone(),
            options.reconnect_policy,
            options.establish_timeout,
        );

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(Status::default());

        let event_loop = EventLoop {
            machine,
            handlers,
            connector,
            events_tx,
            status_tx,
            session: None,
            establish_timer: None,
            reconnect_timer: None,
        };

        runtime.spawn(event_loop.run(command_rx, events_rx));

        info!(%channel, %endpoint, "Connection manager started");

        Ok(Self {
            channel,
            endpoint,
            command_tx,
            status_rx,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Channel this manager is subscribed to.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Endpoint URL including the channel parameter.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status_rx.borrow().clone()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status_rx.borrow().state
    }

    /// Reconnect attempts since the last successful open.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.status_rx.borrow().retry_count
    }

    /// Last error text, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.status_rx.borrow().error_message.clone()
    }

    /// Human-readable status line.
    #[must_use]
    pub fn status_message(&self) -> String {
        self.status_rx.borrow().status_message()
    }

    /// Returns `true` once the manager has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed() || self.status_rx.borrow().manually_closed
    }

    /// Receiver that observes every status change.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status_rx.clone()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Waits until the channel is open.
    ///
    /// Returns immediately if it already is. Useful right after
    /// [`build`](ManagerBuilder::build), since the first session is still
    /// connecting at that point and [`send`](Self::send) would be rejected.
    ///
    /// # Errors
    ///
    /// - [`Error::ManagerClosed`] if the manager is closed before it opens
    /// - [`Error::RetriesExhausted`] if the reconnect policy gives up first
    pub async fn wait_for_open(&self) -> Result<()> {
        let mut status_rx = self.status_rx.clone();
        let status = status_rx
            .wait_for(|s| s.state.is_open() || s.is_terminal())
            .await
            .map_err(|_| Error::ManagerClosed)?
            .clone();

        if status.state.is_open() {
            Ok(())
        } else if status.exhausted {
            Err(Error::RetriesExhausted {
                attempts: status.retry_count,
            })
        } else {
            Err(Error::ManagerClosed)
        }
    }

    /// Sends `payload` wrapped as `{"type":"message","content":<payload>}`.
    ///
    /// Nothing is queued: a payload sent while the channel is not open is
    /// dropped and reported.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the channel is not open
    /// - [`Error::ManagerClosed`] after [`close`](Self::close)
    /// - [`Error::Json`] if the payload cannot be serialized
    /// - [`Error::ConnectionClosed`] if the session ended before the write
    pub async fn send<T>(&self, payload: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ManagerCommand::Send { payload, reply_tx })
            .map_err(|_| Error::ManagerClosed)?;

        reply_rx.await.map_err(|_| Error::ManagerClosed)?
    }

    /// Closes the channel and stops reconnecting.
    ///
    /// Cancels pending timers and closes the live session. `on_close` is not
    /// invoked for a manual close. Idempotent.
    pub async fn close(&self) {
        let (done_tx, done_rx) = oneshot::channel();

        if self
            .command_tx
            .send(ManagerCommand::Close { done_tx })
            .is_err()
        {
            trace!(channel = %self.channel, "Close on stopped manager");
            return;
        }

        let _ = done_rx.await;
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// State owned by the event loop task.
struct EventLoop {
    machine: ConnectionMachine,
    handlers: EventHandlers,
    connector: Arc<dyn Connector>,
    events_tx: EventSender,
    status_tx: watch::Sender<Status>,
    session: Option<SessionHandle>,
    establish_timer: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

impl EventLoop {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<ManagerCommand>,
        mut events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let effects = self.machine.start();
        self.apply(effects);
        self.publish_status();

        loop {
            tokio::select! {
                biased;

                // Commands from the handle
                command = command_rx.recv() => {
                    match command {
                        Some(ManagerCommand::Send { payload, reply_tx }) => {
                            let _ = reply_tx.send(self.transmit(payload));
                        }

                        Some(ManagerCommand::Close { done_tx }) => {
                            self.shutdown();
                            let _ = done_tx.send(());
                            break;
                        }

                        None => {
                            debug!("Manager handle dropped");
                            self.shutdown();
                            break;
                        }
                    }
                }

                // Session and timer events
                Some(event) = events_rx.recv() => {
                    let effects = self.machine.handle_transport_event(event);
                    self.apply(effects);
                }
            }

            self.publish_status();
        }

        debug!(
            decode_failures = self.machine.decode_failures(),
            "Manager event loop terminated"
        );
    }

    fn transmit(&self, payload: Value) -> Result<()> {
        match self.machine.send(payload)? {
            Effect::Transmit { session, text } => self.write_frame(session, text),
            effect => {
                trace!(?effect, "Send produced no frame");
                Ok(())
            }
        }
    }

    /// Single write path for outbound frames.
    fn write_frame(&self, session: SessionId, text: String) -> Result<()> {
        match &self.session {
            Some(handle) if handle.id() == session => handle.transmit(text),
            _ => Err(Error::ConnectionClosed),
        }
    }

    fn shutdown(&mut self) {
        let effects = self.machine.close();
        self.apply(effects);

        // Nothing may fire after close, whatever the machine still tracks.
        abort_timer(&mut self.establish_timer);
        abort_timer(&mut self.reconnect_timer);
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.machine.status());
    }

    // ========================================================================
    // Effects
    // ========================================================================

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            trace!(?effect, "Applying effect");

            match effect {
                Effect::OpenSession { session, url } => self.open_session(session, url),

                Effect::ArmEstablishTimer { session, after } => {
                    abort_timer(&mut self.establish_timer);
                    self.establish_timer = Some(self.spawn_timer(
                        after,
                        TransportEvent::EstablishTimeout { session },
                    ));
                }

                Effect::CancelEstablishTimer => abort_timer(&mut self.establish_timer),

                Effect::CloseSession { session } => self.close_session(session),

                Effect::ScheduleReconnect { after, attempt } => {
                    info!(
                        attempt,
                        delay_ms = after.as_millis() as u64,
                        "Reconnect scheduled"
                    );
                    abort_timer(&mut self.reconnect_timer);
                    self.reconnect_timer =
                        Some(self.spawn_timer(after, TransportEvent::ReconnectDue));
                }

                Effect::CancelReconnect => abort_timer(&mut self.reconnect_timer),

                Effect::Transmit { session, text } => {
                    if let Err(e) = self.write_frame(session, text) {
                        warn!(%session, error = %e, "Frame not written");
                    }
                }

                Effect::Deliver(payload) => self.handlers.emit_message(payload),
                Effect::NotifyOpen => self.handlers.emit_open(),
                Effect::NotifyError(error) => self.handlers.emit_error(error),
                Effect::NotifyClose(close) => self.handlers.emit_close(close),
            }
        }

        // The machine forgets a session once it has closed; drop our handle too.
        if self.session.as_ref().map(SessionHandle::id) != self.machine.session()
            && let Some(stale) = self.session.take()
        {
            stale.close();
        }
    }

    fn open_session(&mut self, session: SessionId, url: Url) {
        if let Some(previous) = self.session.take() {
            previous.close();
        }

        self.session = Some(SessionHandle::spawn(
            session,
            url,
            Arc::clone(&self.connector),
            self.events_tx.clone(),
        ));
    }

    fn close_session(&mut self, session: SessionId) {
        if self.session.as_ref().is_some_and(|h| h.id() == session)
            && let Some(handle) = self.session.take()
        {
            handle.close();
        }
    }

    fn spawn_timer(&self, after: Duration, event: TransportEvent) -> JoinHandle<()> {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events_tx.send(event);
        })
    }
}

fn abort_timer(timer: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = timer.take() {
        handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
