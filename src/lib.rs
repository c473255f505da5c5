//! Bi-energy (electric/gas) heating controller core.
//!
//! Deterministic, event-driven, single-threaded, allocation-free control
//! logic: a debouncing input sampler, a dual-priority event queue, a
//! software timer service, and a table-driven FSM with a staged
//! start/stop element sequencer — wired together by [`host::HostLoop`].
//! Physical GPIO/actuator I/O is reached only through the [`ports`]
//! trait boundary; this crate owns no hardware.

#![deny(unused_must_use)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evq;
pub mod fsm;
pub mod host;
pub mod inputs;
pub mod ports;
pub mod timers;

pub use error::{Error, Result};
