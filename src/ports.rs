//! Port traits the control core is wired against.
//!
//! The domain types (`inputs`, `fsm`, `host`) never touch a GPIO register
//! or a relay driver directly — they call through these traits. Swapping
//! the hardware adapter for a simulation or a test double never touches
//! `src/fsm` or `src/inputs`.
//!
//! Grounded on the teacher's `app/ports.rs` hexagonal boundary (the same
//! split between "what the domain needs" and "how the board provides
//! it"), `examples/original_source/Core/Inc/inputs.h`'s `hw_read_*_raw`
//! hooks for the raw-input surface, and `fsm.h`'s `guard_*`/action-intent
//! hooks for the guard and action surfaces.

use crate::evq::EventKind;

/// Raw, unfiltered hardware levels. Implementations must be fast and
/// non-blocking — the sampler calls every tick and applies its own
/// debouncing on top.
pub trait RawInputs {
    /// Thermostat contact, before active-low correction.
    fn thermostat(&self) -> bool;
    /// Energy-provider selector contact, before active-low correction.
    fn provider(&self) -> bool;
    /// Mode selector, contact A, before active-low correction.
    fn mode_a(&self) -> bool;
    /// Mode selector, contact B, before active-low correction.
    fn mode_b(&self) -> bool;
    /// Mode selector, contact C, before active-low correction.
    fn mode_c(&self) -> bool;
}

/// Side-effect-free conditions the FSM consults when evaluating a
/// transition guard. Computed by the host's supervisory logic (lockout
/// timers, temperature hysteresis, fault latch) and handed in fresh on
/// every `handle_event` call — the FSM itself never caches them.
pub trait GuardProvider {
    /// `true` once the thermostat anti-flap lockout has expired.
    fn lockout_clear(&self) -> bool;
    /// `true` if the energy source currently targeted is electric.
    fn target_is_elec(&self) -> bool;
    /// `true` if the energy source currently targeted is gas.
    fn target_is_gas(&self) -> bool;
    /// `true` if the measured temperature is at or below the safe
    /// threshold (with hysteresis applied by the caller).
    fn temp_is_safe(&self) -> bool;
    /// `true` if no fault is currently latched.
    fn no_fault(&self) -> bool;
}

/// Effect sink: every action intent the FSM decides on is emitted here —
/// never executed inline by the FSM itself. Mirrors the teacher's
/// `ActuatorPort`/`EventSink` split between commands and notifications;
/// here there is only the notification half, since this crate owns no
/// physical outputs (non-goal, spec.md §1).
pub trait ActionSink {
    /// Start the 1→2→3 element sequence.
    fn seq_start(&mut self);
    /// Element `n` (1-based) has just been commanded on during the
    /// up-sequence.
    fn seq_step_element_up(&mut self, n: u8);
    /// Element `n` (1-based) has just been commanded off during the
    /// down-sequence.
    fn seq_step_element_down(&mut self, n: u8);
    /// Start the 3→2→1 element sequence.
    fn seq_stop(&mut self);
    /// Entered `HEAT_ELEC`.
    fn enter_elec(&mut self);
    /// Entered `HEAT_GAS`.
    fn enter_gas(&mut self);
    /// Entered `COOLDOWN`.
    fn enter_cool(&mut self);
    /// Every output should be off; controller is at rest.
    fn all_off(&mut self);
    /// Entered `FAULT`.
    fn enter_fault(&mut self);
}

/// An [`ActionSink`] that discards every notification. Useful for unit
/// tests that only care about state transitions, not side effects.
pub struct NullActionSink;

impl ActionSink for NullActionSink {
    fn seq_start(&mut self) {}
    fn seq_step_element_up(&mut self, _n: u8) {}
    fn seq_step_element_down(&mut self, _n: u8) {}
    fn seq_stop(&mut self) {}
    fn enter_elec(&mut self) {}
    fn enter_gas(&mut self) {}
    fn enter_cool(&mut self) {}
    fn all_off(&mut self) {}
    fn enter_fault(&mut self) {}
}

/// An [`ActionSink`] that logs every notification at `info` level. What
/// the simulation binary (`src/main.rs`) wires up by default.
pub struct LoggingActionSink;

impl ActionSink for LoggingActionSink {
    fn seq_start(&mut self) {
        log::info!("seq_start");
    }
    fn seq_step_element_up(&mut self, n: u8) {
        log::info!("seq_step_element_up({n})");
    }
    fn seq_step_element_down(&mut self, n: u8) {
        log::info!("seq_step_element_down({n})");
    }
    fn seq_stop(&mut self) {
        log::info!("seq_stop");
    }
    fn enter_elec(&mut self) {
        log::info!("enter_elec");
    }
    fn enter_gas(&mut self) {
        log::info!("enter_gas");
    }
    fn enter_cool(&mut self) {
        log::info!("enter_cool");
    }
    fn all_off(&mut self) {
        log::info!("all_off");
    }
    fn enter_fault(&mut self) {
        log::warn!("enter_fault");
    }
}

/// Classifies an externally observed fault condition into the event it
/// should raise — the boundary the host loop uses to turn raw safety
/// signals (over-temp, redundancy mismatch, run-time ceilings) into
/// queueable events without the FSM needing to know where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCondition {
    OvertempWarn,
    OvertempCrit,
    Redundancy,
    BurnerRuntime,
    ElementsRuntime,
    SensorFault,
}

impl FaultCondition {
    pub fn event_kind(self) -> EventKind {
        match self {
            Self::OvertempWarn => EventKind::OvertempWarn,
            Self::OvertempCrit => EventKind::OvertempCrit,
            Self::Redundancy => EventKind::FaultRedundancy,
            Self::BurnerRuntime => EventKind::FaultTimeBurner,
            Self::ElementsRuntime => EventKind::FaultTimeElems,
            Self::SensorFault => EventKind::SensorFault,
        }
    }
}
