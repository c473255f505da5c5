//! Simulation binary.
//!
//! Drives [`duoheat_ctl::host::HostLoop`] against an in-memory hardware
//! stub instead of real GPIOs, to exercise the control core end to end
//! outside the target board. Not part of the library surface — a real
//! embedding wires [`duoheat_ctl::ports::RawInputs`]/[`GuardProvider`]
//! to actual peripheral drivers instead of [`SimHardware`].

#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use duoheat_ctl::config::{ControllerConfig, InputsConfig};
use duoheat_ctl::fsm::StateId;
use duoheat_ctl::host::HostLoop;
use duoheat_ctl::ports::{GuardProvider, LoggingActionSink, RawInputs};

/// A hand-driven hardware stand-in: thermostat closes at `thermostat_on_at_ms`,
/// provider is pinned to electric, temperature is reported safe throughout.
struct SimHardware {
    thermostat_on_at_ms: u32,
    now_ms: u32,
}

impl RawInputs for SimHardware {
    fn thermostat(&self) -> bool {
        self.now_ms >= self.thermostat_on_at_ms
    }
    fn provider(&self) -> bool {
        true
    }
    fn mode_a(&self) -> bool {
        true
    }
    fn mode_b(&self) -> bool {
        false
    }
    fn mode_c(&self) -> bool {
        false
    }
}

impl GuardProvider for SimHardware {
    fn lockout_clear(&self) -> bool {
        true
    }
    fn target_is_elec(&self) -> bool {
        true
    }
    fn target_is_gas(&self) -> bool {
        false
    }
    fn temp_is_safe(&self) -> bool {
        true
    }
    fn no_fault(&self) -> bool {
        true
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cfg = ControllerConfig::default();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle)?;
    let mut hw = SimHardware { thermostat_on_at_ms: 100, now_ms: 0 };
    let mut sink = LoggingActionSink;

    host.seed_from_hw(&hw);

    let run_ms = cfg.seq_delay_ms * 3 + 5_000;
    let mut last_state = host.state();

    for t in 0..run_ms {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);

        if host.state() != last_state {
            info!("t={t}ms: {:?} -> {:?}", last_state, host.state());
            last_state = host.state();
        }
    }

    let snap = host.snapshot();
    info!(
        "final snapshot: state={:?} normal_queue={:?} faults_queue={:?}",
        snap.state, snap.normal_queue, snap.faults_queue
    );

    Ok(())
}
