//! Connection manager.
//!
//! Keeps one chat channel connected: connects on build, reconnects after
//! drops according to a [`ReconnectPolicy`], force-closes attempts that
//! never open, and stops for good once closed or out of attempts.
//!
//! # Layers
//!
//! | Module | Description |
//! |--------|-------------|
//! | `machine` | Pure state machine: events in, effects out |
//! | `core` | [`ConnectionManager`] handle and the event loop running the machine |
//! | `builder` | [`ManagerBuilder`] with validation |
//! | `options` | [`ManagerOptions`] |
//! | `policy` | [`ReconnectPolicy`] delay schedules |
//! | `handlers` | [`EventHandlers`] caller callbacks |
//! | `state` | [`ConnectionState`] and [`Status`] |

// ============================================================================
// Submodules
// ============================================================================

mod builder;
mod core;
mod handlers;
mod machine;
mod options;
mod policy;
mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ManagerBuilder;
pub use core::ConnectionManager;
pub use handlers::{
    CloseEvent, ConnectionError, EventHandlers, OnCloseCallback, OnErrorCallback,
    OnMessageCallback, OnOpenCallback,
};
pub use machine::{ConnectionMachine, Effect, TransportEvent};
pub use options::{DEFAULT_ESTABLISH_TIMEOUT, ManagerOptions};
pub use policy::{DEFAULT_BACKOFF_STEPS, ReconnectPolicy};
pub use state::{ConnectionState, EXHAUSTED_MESSAGE, Status};
