//! Connection state machine.
//!
//! [`ConnectionMachine`] holds every decision the manager makes: state
//! transitions, retry counting, backoff and teardown. It performs no I/O.
//! Transport activity and timer firings come in as [`TransportEvent`]s
//! through [`ConnectionMachine::handle_transport_event`], and the work the
//! runtime must do goes out as a list of [`Effect`]s.
//!
//! # Transitions
//!
//! ```text
//!              start / ReconnectDue
//!                      │
//!                      ▼
//!   ┌──────────► Connecting ──Opened──► Open
//!   │                 │  │                │
//!   │   Error ────────┘  └─Closed/Timeout─┤──Error──► Errored
//!   │     ▼                               ▼              │
//!   │  Errored ─────────Closed──────►  Closed ◄──Closed──┘
//!   │                                     │
//!   └──────── ReconnectDue ◄── policy ────┘ (unless exhausted / closed)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{OutboundEnvelope, decode_frame};

use super::handlers::{CloseEvent, ConnectionError};
use super::policy::ReconnectPolicy;
use super::state::{ConnectionState, EXHAUSTED_MESSAGE, Status};

// ============================================================================
// TransportEvent
// ============================================================================

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Session reached the open state.
    Opened {
        /// Session the event belongs to.
        session: SessionId,
    },
    /// Text frame received.
    Frame {
        /// Session the event belongs to.
        session: SessionId,
        /// Raw frame body.
        text: String,
    },
    /// Transport reported an error. A `Closed` follows.
    Error {
        /// Session the event belongs to.
        session: SessionId,
        /// Error description.
        message: String,
    },
    /// Session closed, locally or remotely.
    Closed {
        /// Session the event belongs to.
        session: SessionId,
        /// Close details.
        close: CloseEvent,
    },
    /// Establishment timer fired.
    EstablishTimeout {
        /// Session the timer was armed for.
        session: SessionId,
    },
    /// Reconnect backoff timer fired.
    ReconnectDue,
}

impl TransportEvent {
    /// Session the event is tagged with, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::Opened { session }
            | Self::Frame { session, .. }
            | Self::Error { session, .. }
            | Self::Closed { session, .. }
            | Self::EstablishTimeout { session } => Some(*session),
            Self::ReconnectDue => None,
        }
    }
}

// ============================================================================
// Effect
// ============================================================================

/// Work the runtime performs on behalf of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a transport session to `url`.
    OpenSession {
        /// New session id.
        session: SessionId,
        /// Channel endpoint.
        url: Url,
    },
    /// Fire `EstablishTimeout` for `session` after `after`.
    ArmEstablishTimer {
        /// Session being established.
        session: SessionId,
        /// Timeout.
        after: Duration,
    },
    /// Cancel the establishment timer.
    CancelEstablishTimer,
    /// Close and discard a transport session.
    CloseSession {
        /// Session to close.
        session: SessionId,
    },
    /// Fire `ReconnectDue` after `after`.
    ScheduleReconnect {
        /// Backoff delay.
        after: Duration,
        /// Attempt number the timer will dispatch (1-based).
        attempt: u32,
    },
    /// Cancel the pending reconnect timer.
    CancelReconnect,
    /// Write a text frame on the live session.
    Transmit {
        /// Live session.
        session: SessionId,
        /// Serialized envelope.
        text: String,
    },
    /// Hand a decoded payload to `on_message`.
    Deliver(Value),
    /// Invoke `on_open`.
    NotifyOpen,
    /// Invoke `on_error`.
    NotifyError(ConnectionError),
    /// Invoke `on_close`.
    NotifyClose(CloseEvent),
}

// ============================================================================
// ConnectionMachine
// ============================================================================

/// Transport-free connection manager logic.
#[derive(Debug)]
pub struct ConnectionMachine {
    endpoint: Url,
    policy: ReconnectPolicy,
    establish_timeout: Duration,

    state: ConnectionState,
    retry_count: u32,
    /// Live session, if any. Events for any other id are stale.
    session: Option<SessionId>,
    last_session: SessionId,
    /// The live session has reached open at least once.
    session_opened: bool,
    reconnect_pending: bool,
    started: bool,
    manually_closed: bool,
    exhausted: bool,
    error_message: Option<String>,
    decode_failures: u64,
}

impl ConnectionMachine {
    /// Creates a machine for a channel endpoint. Nothing happens until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(endpoint: Url, policy: ReconnectPolicy, establish_timeout: Duration) -> Self {
        Self {
            endpoint,
            policy,
            establish_timeout,
            state: ConnectionState::Connecting,
            retry_count: 0,
            session: None,
            last_session: SessionId::INITIAL,
            session_opened: false,
            reconnect_pending: false,
            started: false,
            manually_closed: false,
            exhausted: false,
            error_message: None,
            decode_failures: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts dispatched since the last open.
    #[inline]
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Live session id.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Channel endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a reconnect timer is outstanding.
    #[inline]
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Whether the owner closed the machine.
    #[inline]
    #[must_use]
    pub fn is_manually_closed(&self) -> bool {
        self.manually_closed
    }

    /// Whether the reconnect policy gave up.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Inbound frames dropped because they were not valid JSON.
    #[inline]
    #[must_use]
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    /// Caller-facing snapshot.
    #[must_use]
    pub fn status(&self) -> Status {
        Status {
            state: self.state,
            retry_count: self.retry_count,
            error_message: self.error_message.clone(),
            exhausted: self.exhausted,
            manually_closed: self.manually_closed,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Opens the first session. Later calls are ignored.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.started || self.manually_closed {
            return Vec::new();
        }
        self.started = true;
        self.open_session()
    }

    /// Wraps `payload` in an envelope for the live session.
    ///
    /// # Errors
    ///
    /// - [`Error::ManagerClosed`] after [`close`](Self::close)
    /// - [`Error::NotOpen`] if the session is not open; nothing is transmitted
    /// - [`Error::Json`] if the envelope cannot be serialized
    pub fn send(&self, payload: Value) -> Result<Effect> {
        if self.manually_closed {
            return Err(Error::ManagerClosed);
        }

        let session = match (self.state, self.session) {
            (ConnectionState::Open, Some(session)) => session,
            _ => {
                warn!(state = %self.state, "Message not sent: connection is not open");
                return Err(Error::not_open(self.state));
            }
        };

        let text = OutboundEnvelope::message(payload).to_text()?;
        Ok(Effect::Transmit { session, text })
    }

    /// Tears the machine down. Cancels timers, closes the live session, and
    /// ignores every later event. Idempotent.
    pub fn close(&mut self) -> Vec<Effect> {
        if self.manually_closed {
            return Vec::new();
        }

        info!(endpoint = %self.endpoint, "Closing connection manager");
        self.manually_closed = true;
        self.state = ConnectionState::Closed;

        let mut effects = vec![Effect::CancelEstablishTimer];
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }
        if let Some(session) = self.session.take() {
            effects.push(Effect::CloseSession { session });
        }
        effects
    }

    // ========================================================================
    // Event Dispatch
    // ========================================================================

    /// Single entry point for transport events and timer firings.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Vec<Effect> {
        if self.manually_closed {
            trace!(?event, "Ignoring event after close");
            return Vec::new();
        }

        if let Some(session) = event.session()
            && self.session != Some(session)
        {
            trace!(%session, "Ignoring event from discarded session");
            return Vec::new();
        }

        match event {
            TransportEvent::Opened { session } => self.on_opened(session),
            TransportEvent::Frame { text, .. } => self.on_frame(&text),
            TransportEvent::Error { session, message } => self.on_error(session, message),
            TransportEvent::Closed { session, close } => self.on_closed(session, close),
            TransportEvent::EstablishTimeout { session } => self.on_establish_timeout(session),
            TransportEvent::ReconnectDue => self.on_reconnect_due(),
        }
    }

    fn open_session(&mut self) -> Vec<Effect> {
        let session = self.last_session.next();
        self.last_session = session;
        self.session = Some(session);
        self.session_opened = false;
        self.state = ConnectionState::Connecting;

        debug!(%session, endpoint = %self.endpoint, "Opening transport session");

        vec![
            Effect::OpenSession {
                session,
                url: self.endpoint.clone(),
            },
            Effect::ArmEstablishTimer {
                session,
                after: self.establish_timeout,
            },
        ]
    }

    fn on_opened(&mut self, session: SessionId) -> Vec<Effect> {
        info!(%session, attempts = self.retry_count, "Channel connected");
        self.state = ConnectionState::Open;
        self.session_opened = true;
        self.retry_count = 0;
        self.error_message = None;
        vec![Effect::CancelEstablishTimer, Effect::NotifyOpen]
    }

    fn on_frame(&mut self, text: &str) -> Vec<Effect> {
        match decode_frame(text) {
            Ok(payload) => vec![Effect::Deliver(payload)],
            Err(e) => {
                self.decode_failures += 1;
                warn!(error = %e, len = text.len(), "Dropping undecodable frame");
                Vec::new()
            }
        }
    }

    fn on_error(&mut self, session: SessionId, message: String) -> Vec<Effect> {
        warn!(%session, error = %message, "Transport error");
        self.state = ConnectionState::Errored;
        let text = format!("Connection error: {message}");
        self.error_message = Some(text.clone());
        vec![Effect::NotifyError(ConnectionError::new(text, true))]
    }

    fn on_closed(&mut self, session: SessionId, close: CloseEvent) -> Vec<Effect> {
        debug!(%session, reason = %close, "Transport session closed");
        self.session = None;
        self.state = ConnectionState::Closed;

        let mut effects = vec![Effect::CancelEstablishTimer, Effect::NotifyClose(close)];
        effects.extend(self.schedule_reconnect());
        effects
    }

    fn on_establish_timeout(&mut self, session: SessionId) -> Vec<Effect> {
        if self.session_opened {
            return Vec::new();
        }

        warn!(
            %session,
            timeout_ms = self.establish_timeout.as_millis() as u64,
            "Connection establishment timed out"
        );

        let mut effects = vec![Effect::CloseSession { session }];
        effects.extend(self.on_closed(
            session,
            CloseEvent::new("connection establishment timed out"),
        ));
        effects
    }

    fn on_reconnect_due(&mut self) -> Vec<Effect> {
        if !self.reconnect_pending {
            trace!("Ignoring reconnect timer with nothing pending");
            return Vec::new();
        }

        self.reconnect_pending = false;
        self.retry_count += 1;
        info!(attempt = self.retry_count, "Reconnecting");
        self.open_session()
    }

    fn schedule_reconnect(&mut self) -> Vec<Effect> {
        match self.policy.delay_for(self.retry_count) {
            Some(after) => {
                let attempt = self.retry_count + 1;
                debug!(attempt, delay_ms = after.as_millis() as u64, "Scheduling reconnect");
                self.reconnect_pending = true;
                vec![Effect::ScheduleReconnect { after, attempt }]
            }
            None => {
                warn!(attempts = self.retry_count, "Reconnect attempts exhausted");
                self.exhausted = true;
                self.error_message = Some(EXHAUSTED_MESSAGE.to_string());
                vec![Effect::NotifyError(ConnectionError::new(
                    EXHAUSTED_MESSAGE,
                    false,
                ))]
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    fn machine() -> ConnectionMachine {
        let url = Url::parse("ws://localhost:8080/?locationId=4").unwrap();
        ConnectionMachine::new(url, ReconnectPolicy::default(), Duration::from_millis(5000))
    }

    fn live(m: &ConnectionMachine) -> SessionId {
        m.session().expect("live session")
    }

    fn open(m: &mut ConnectionMachine) -> Vec<Effect> {
        let session = live(m);
        m.handle_transport_event(TransportEvent::Opened { session })
    }

    fn close(m: &mut ConnectionMachine) -> Vec<Effect> {
        let session = live(m);
        m.handle_transport_event(TransportEvent::Closed {
            session,
            close: CloseEvent::with_code("abnormal", 1006),
        })
    }

    fn scheduled(effects: &[Effect]) -> Option<Duration> {
        effects.iter().find_map(|e| match e {
            Effect::ScheduleReconnect { after, .. } => Some(*after),
            _ => None,
        })
    }

    #[test]
    fn test_start_opens_session_and_arms_timer() {
        let mut m = machine();
        let effects = m.start();

        let session = live(&m);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(
            effects,
            vec![
                Effect::OpenSession {
                    session,
                    url: Url::parse("ws://localhost:8080/?locationId=4").unwrap(),
                },
                Effect::ArmEstablishTimer {
                    session,
                    after: Duration::from_millis(5000),
                },
            ]
        );
        assert!(m.start().is_empty());
    }

    #[test]
    fn test_open_then_abrupt_close_schedules_first_step() {
        let mut m = machine();
        m.start();

        let effects = open(&mut m);
        assert_eq!(m.state(), ConnectionState::Open);
        assert_eq!(m.retry_count(), 0);
        assert!(effects.contains(&Effect::CancelEstablishTimer));
        assert!(effects.contains(&Effect::NotifyOpen));

        let effects = close(&mut m);
        assert_eq!(m.state(), ConnectionState::Closed);
        assert_eq!(scheduled(&effects), Some(Duration::from_millis(1000)));
        assert!(m.reconnect_pending());
        assert!(m.session().is_none());
    }

    #[test]
    fn test_reconnect_replaces_session() {
        let mut m = machine();
        m.start();
        let first = live(&m);
        close(&mut m);

        let effects = m.handle_transport_event(TransportEvent::ReconnectDue);
        let second = live(&m);

        assert!(second > first);
        assert_eq!(m.retry_count(), 1);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(matches!(effects[0], Effect::OpenSession { session, .. } if session == second));
    }

    #[test]
    fn test_exhaustion_after_five_failed_cycles() {
        let mut m = machine();
        m.start();

        let expected = [1, 2, 3, 5, 8];
        for (i, secs) in expected.iter().enumerate() {
            let effects = close(&mut m);
            assert_eq!(scheduled(&effects), Some(Duration::from_secs(*secs)));
            m.handle_transport_event(TransportEvent::ReconnectDue);
            assert_eq!(m.retry_count(), i as u32 + 1);
        }

        let effects = close(&mut m);
        assert_eq!(scheduled(&effects), None);
        assert!(m.is_exhausted());
        assert!(!m.reconnect_pending());
        assert!(effects.contains(&Effect::NotifyError(ConnectionError::new(
            EXHAUSTED_MESSAGE,
            false
        ))));
        assert_eq!(m.status().status_message(), EXHAUSTED_MESSAGE);

        assert!(m.handle_transport_event(TransportEvent::ReconnectDue).is_empty());
    }

    #[test]
    fn test_open_resets_retry_counter() {
        let mut m = machine();
        m.start();
        close(&mut m);
        m.handle_transport_event(TransportEvent::ReconnectDue);
        close(&mut m);
        m.handle_transport_event(TransportEvent::ReconnectDue);
        assert_eq!(m.retry_count(), 2);

        open(&mut m);
        assert_eq!(m.retry_count(), 0);

        let effects = close(&mut m);
        assert_eq!(scheduled(&effects), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_send_while_open_builds_envelope() {
        let mut m = machine();
        m.start();
        open(&mut m);
        let session = live(&m);

        let effect = m.send(json!({ "text": "hi" })).unwrap();
        assert_eq!(
            effect,
            Effect::Transmit {
                session,
                text: r#"{"type":"message","content":{"text":"hi"}}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_send_while_not_open_is_rejected() {
        let mut m = machine();
        assert!(matches!(
            m.send(json!("early")),
            Err(Error::NotOpen {
                state: ConnectionState::Connecting
            })
        ));

        m.start();
        close(&mut m);
        assert!(matches!(m.send(json!("x")), Err(Error::NotOpen { .. })));

        m.close();
        assert!(matches!(m.send(json!("x")), Err(Error::ManagerClosed)));
    }

    #[test]
    fn test_frames_decode_or_drop() {
        let mut m = machine();
        m.start();
        open(&mut m);
        let session = live(&m);

        let effects = m.handle_transport_event(TransportEvent::Frame {
            session,
            text: r#"{"username":"aria","message":"hi"}"#.into(),
        });
        assert_eq!(
            effects,
            vec![Effect::Deliver(json!({ "username": "aria", "message": "hi" }))]
        );

        let effects = m.handle_transport_event(TransportEvent::Frame {
            session,
            text: "not json".into(),
        });
        assert!(effects.is_empty());
        assert_eq!(m.decode_failures(), 1);
        assert_eq!(m.state(), ConnectionState::Open);
    }

    #[test]
    fn test_error_does_not_schedule_reconnect() {
        let mut m = machine();
        m.start();
        open(&mut m);
        let session = live(&m);

        let effects = m.handle_transport_event(TransportEvent::Error {
            session,
            message: "reset by peer".into(),
        });
        assert_eq!(m.state(), ConnectionState::Errored);
        assert_eq!(scheduled(&effects), None);
        assert_eq!(
            m.status().error_message.as_deref(),
            Some("Connection error: reset by peer")
        );

        let effects = close(&mut m);
        assert_eq!(m.state(), ConnectionState::Closed);
        assert!(scheduled(&effects).is_some());
    }

    #[test]
    fn test_establish_timeout_forces_close() {
        let mut m = machine();
        m.start();
        let session = live(&m);

        let effects = m.handle_transport_event(TransportEvent::EstablishTimeout { session });
        assert_eq!(effects[0], Effect::CloseSession { session });
        assert!(effects.contains(&Effect::NotifyClose(CloseEvent::new(
            "connection establishment timed out"
        ))));
        assert_eq!(scheduled(&effects), Some(Duration::from_secs(1)));
        assert_eq!(m.state(), ConnectionState::Closed);

        // The transport's own close for the abandoned session is stale.
        let late = m.handle_transport_event(TransportEvent::Closed {
            session,
            close: CloseEvent::new("gone"),
        });
        assert!(late.is_empty());
    }

    #[test]
    fn test_establish_timeout_after_open_is_ignored() {
        let mut m = machine();
        m.start();
        let session = live(&m);
        open(&mut m);

        assert!(
            m.handle_transport_event(TransportEvent::EstablishTimeout { session })
                .is_empty()
        );
        assert_eq!(m.state(), ConnectionState::Open);
    }

    #[test]
    fn test_close_then_late_transport_close() {
        let mut m = machine();
        m.start();
        open(&mut m);
        let session = live(&m);

        let effects = m.close();
        assert!(effects.contains(&Effect::CloseSession { session }));

        let late = m.handle_transport_event(TransportEvent::Closed {
            session,
            close: CloseEvent::new("late"),
        });
        assert!(late.is_empty());
        assert!(!m.reconnect_pending());
        assert!(m.status().is_terminal());
    }

    #[test]
    fn test_close_cancels_pending_reconnect() {
        let mut m = machine();
        m.start();
        close(&mut m);
        assert!(m.reconnect_pending());

        let effects = m.close();
        assert!(effects.contains(&Effect::CancelReconnect));
        assert!(m.handle_transport_event(TransportEvent::ReconnectDue).is_empty());
        assert!(m.session().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut m = machine();
        m.start();
        assert!(!m.close().is_empty());
        assert!(m.close().is_empty());
        assert!(m.start().is_empty());
        assert_eq!(m.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_capped_doubling_never_exhausts() {
        let url = Url::parse("ws://localhost:8080/?locationId=4").unwrap();
        let mut m = ConnectionMachine::new(
            url,
            ReconnectPolicy::capped_doubling(Duration::from_secs(1), Duration::from_secs(30)),
            Duration::from_secs(5),
        );
        m.start();

        let mut last = Duration::ZERO;
        for _ in 0..20 {
            let after = scheduled(&close(&mut m)).expect("always reschedules");
            assert!(after >= last);
            last = after;
            m.handle_transport_event(TransportEvent::ReconnectDue);
        }
        assert_eq!(last, Duration::from_secs(30));
        assert!(!m.is_exhausted());
    }

    // ========================================================================
    // Property Tests
    // ========================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Open,
        Close,
        Error,
        Frame(bool),
        Timeout,
        Reconnect,
        Send,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Open),
            Just(Op::Close),
            Just(Op::Error),
            any::<bool>().prop_map(Op::Frame),
            Just(Op::Timeout),
            Just(Op::Reconnect),
            Just(Op::Send),
        ]
    }

    proptest! {
        #[test]
        fn prop_retry_counter_invariants(ops in prop::collection::vec(op(), 0..80)) {
            let mut m = machine();
            m.start();

            for op in ops {
                let before = m.retry_count();
                let session = m.session();

                match (op, session) {
                    (Op::Open, Some(session)) => {
                        m.handle_transport_event(TransportEvent::Opened { session });
                        prop_assert_eq!(m.retry_count(), 0);
                        prop_assert_eq!(m.state(), ConnectionState::Open);
                    }
                    (Op::Close, Some(session)) => {
                        m.handle_transport_event(TransportEvent::Closed {
                            session,
                            close: CloseEvent::new("drop"),
                        });
                        prop_assert_eq!(m.retry_count(), before);
                        prop_assert!(m.session().is_none());
                    }
                    (Op::Error, Some(session)) => {
                        let effects = m.handle_transport_event(TransportEvent::Error {
                            session,
                            message: "boom".into(),
                        });
                        prop_assert!(scheduled(&effects).is_none());
                    }
                    (Op::Frame(valid), Some(session)) => {
                        let text = if valid { "{\"a\":1}" } else { "{oops" };
                        let effects = m.handle_transport_event(TransportEvent::Frame {
                            session,
                            text: text.into(),
                        });
                        prop_assert_eq!(effects.iter().any(|e| matches!(e, Effect::Deliver(_))), valid);
                    }
                    (Op::Timeout, Some(session)) => {
                        m.handle_transport_event(TransportEvent::EstablishTimeout { session });
                    }
                    (Op::Reconnect, _) => {
                        let pending = m.reconnect_pending();
                        m.handle_transport_event(TransportEvent::ReconnectDue);
                        if pending {
                            prop_assert_eq!(m.retry_count(), before + 1);
                            prop_assert!(m.session().is_some());
                        } else {
                            prop_assert_eq!(m.retry_count(), before);
                        }
                    }
                    (Op::Send, _) => {
                        let result = m.send(json!({ "text": "hi" }));
                        prop_assert_eq!(result.is_ok(), m.state() == ConnectionState::Open);
                    }
                    _ => {}
                }

                if m.state() == ConnectionState::Open {
                    prop_assert_eq!(m.retry_count(), 0);
                }
                if m.reconnect_pending() {
                    prop_assert!(m.session().is_none());
                }
                prop_assert!(m.retry_count() <= 5);
            }
        }

        #[test]
        fn prop_close_is_terminal(ops in prop::collection::vec(op(), 0..40)) {
            let mut m = machine();
            m.start();

            for op in ops {
                if let (Op::Close, Some(session)) = (op, m.session()) {
                    m.handle_transport_event(TransportEvent::Closed {
                        session,
                        close: CloseEvent::new("drop"),
                    });
                    m.handle_transport_event(TransportEvent::ReconnectDue);
                }
            }

            let last = m.session().unwrap_or(SessionId::INITIAL);
            m.close();
            let due = m.handle_transport_event(TransportEvent::ReconnectDue);
            prop_assert!(due.is_empty());
            let late_close = m.handle_transport_event(TransportEvent::Closed {
                session: last,
                close: CloseEvent::new("late"),
            });
            prop_assert!(late_close.is_empty());
            let late_frame = m.handle_transport_event(TransportEvent::Frame {
                session: last,
                text: "{}".into(),
            });
            prop_assert!(late_frame.is_empty());
            prop_assert!(!m.reconnect_pending());
        }
    }
}
