//! Unified error type for the controller.
//!
//! The four core components (event queue, timer service, input sampler,
//! FSM) are deliberately boolean/counter-based per their specification —
//! `push`, `set`, `handle_event` and friends return `bool`, not `Result`.
//! `Error` exists only for the handful of operations that genuinely are
//! fallible in the Result sense: constructing a [`crate::host::HostLoop`]
//! from a malformed [`crate::config::ControllerConfig`].

use core::fmt;

/// Every fallible construction path in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A configuration value is out of the range the control path can use.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
