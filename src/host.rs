//! Host loop: wires the four core components together and drives them
//! from a fixed 1ms caller cadence.
//!
//! `HostLoop::on_tick_ms` is called once per millisecond by the
//! embedding application. It accumulates elapsed time against the
//! input sampler's and timer service's own tick periods to decide when
//! to invoke them, then always drains the event queue to empty —
//! `FAULTS` first — dispatching each event to the FSM and counting a
//! `false` return as an ignored event. Same "read → evaluate → dispatch"
//! shape as the teacher's `AppService::tick`, generalized here from one
//! fixed cadence to the three independent ones this crate needs.
//!
//! Porting note: this crate targets a single-threaded cooperative host
//! loop (spec §1/§5). An ISR-context embedding would need a lock-free
//! SPSC producer feeding `EvqCore::push` from interrupt context instead
//! of calling `on_tick_ms` directly from one; no such adapter exists in
//! this crate since it has no interrupt-context code to place it in.

use crate::config::{ControllerConfig, InputsConfig};
use crate::error::{Error, Result};
use crate::evq::{EvQueueStats, EventArg, EventKind, EvqCore, QueueId};
use crate::fsm::{FsmCore, SequencerState, StateId};
use crate::inputs::InputSampler;
use crate::ports::{ActionSink, FaultCondition, GuardProvider, RawInputs};
use crate::timers::{TimerId, TimerService};

/// Owns the full control core. Construct once at startup, then call
/// [`HostLoop::on_tick_ms`] from a 1ms periodic source.
#[derive(Debug)]
pub struct HostLoop {
    evq: EvqCore,
    timers: TimerService,
    inputs: InputSampler,
    fsm: FsmCore,
    inp_tick_ms: u32,
    tmr_tick_ms: u32,
    inp_acc_ms: u32,
    tmr_acc_ms: u32,
    uptime_ms: u32,
}

impl HostLoop {
    /// Build the control core from `cfg`/`inputs_cfg`, starting the FSM
    /// in `initial_state` (normally [`StateId::Idle`]).
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if either tick period is zero —
    /// a zero period would make the sampler or timer service run every
    /// call, silently discarding the configured cadence.
    pub fn new(cfg: &ControllerConfig, inputs_cfg: &InputsConfig, initial_state: StateId) -> Result<Self> {
        if cfg.inp_tick_ms == 0 {
            return Err(Error::InvalidConfig("inp_tick_ms must be nonzero"));
        }
        if cfg.tmr_tick_ms == 0 {
            return Err(Error::InvalidConfig("tmr_tick_ms must be nonzero"));
        }

        log::info!("HostLoop starting in {initial_state:?}");
        Ok(Self {
            evq: EvqCore::new(),
            timers: TimerService::new(cfg.tmr_tick_ms),
            inputs: InputSampler::new(cfg, inputs_cfg),
            fsm: FsmCore::new(initial_state, cfg.seq_delay_ms),
            inp_tick_ms: cfg.inp_tick_ms,
            tmr_tick_ms: cfg.tmr_tick_ms,
            inp_acc_ms: 0,
            tmr_acc_ms: 0,
            uptime_ms: 0,
        })
    }

    /// Seed the input sampler's debounce state from current hardware
    /// levels without emitting startup events. Call once before the
    /// first `on_tick_ms`.
    pub fn seed_from_hw(&mut self, raw: &dyn RawInputs) {
        self.inputs.seed_from_hw(raw);
    }

    /// Advance the whole control core by one millisecond: sample inputs
    /// and/or tick timers if their periods have elapsed, then drain the
    /// event queue to empty through the FSM.
    pub fn on_tick_ms(&mut self, raw: &dyn RawInputs, guards: &dyn GuardProvider, actions: &mut dyn ActionSink) {
        self.uptime_ms = self.uptime_ms.wrapping_add(1);

        self.inp_acc_ms += 1;
        if self.inp_acc_ms >= self.inp_tick_ms {
            self.inp_acc_ms = 0;
            self.inputs.tick(raw, &mut self.evq, self.uptime_ms);
        }

        self.tmr_acc_ms += 1;
        if self.tmr_acc_ms >= self.tmr_tick_ms {
            self.tmr_acc_ms = 0;
            self.timers.tick(&mut self.evq);
        }

        while let Some(event) = self.evq.pop_next() {
            let kind = event.kind;
            let applied = self.fsm.handle_event(&event, guards, &mut self.timers, &mut self.evq, actions);
            if !applied {
                self.evq.note_ignored(kind);
            }
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.state()
    }

    pub fn sequencer(&self) -> SequencerState {
        self.fsm.sequencer()
    }

    pub fn queue_stats(&self, qid: QueueId) -> EvQueueStats {
        self.evq.stats(qid)
    }

    pub fn timer_active(&self, id: TimerId) -> bool {
        self.timers.is_active(id)
    }

    pub fn timer_remaining_ms(&self, id: TimerId) -> u32 {
        self.timers.remaining_ms(id)
    }

    pub fn uptime_ms(&self) -> u32 {
        self.uptime_ms
    }

    /// Queue an event the host's own supervisory logic observed directly
    /// rather than through the debounced input sampler — a temperature
    /// crossing a safety threshold, a provider-orchestrated energy
    /// switch request, a fault clear acknowledgement. Classified into
    /// NORMAL or FAULTS the same way the input sampler and timer service
    /// are: by [`EvqCore::queue_for`].
    pub fn report_event(&mut self, kind: EventKind, arg: EventArg) -> bool {
        let qid = EvqCore::queue_for(kind);
        self.evq.push(qid, kind, arg, self.uptime_ms)
    }

    /// Convenience wrapper over [`HostLoop::report_event`] for the six
    /// fault-class conditions a safety supervisor outside this crate
    /// would detect (over-temperature, redundancy mismatch, run-time
    /// ceilings, sensor failure).
    pub fn report_fault(&mut self, condition: FaultCondition) -> bool {
        self.report_event(condition.event_kind(), EventArg::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evq::EventKind;
    use crate::ports::NullActionSink;

    struct Stub {
        th: bool,
        target_elec: bool,
        target_gas: bool,
    }

    impl RawInputs for Stub {
        fn thermostat(&self) -> bool { self.th }
        fn provider(&self) -> bool { true }
        fn mode_a(&self) -> bool { true }
        fn mode_b(&self) -> bool { false }
        fn mode_c(&self) -> bool { false }
    }

    impl GuardProvider for Stub {
        fn lockout_clear(&self) -> bool { true }
        fn target_is_elec(&self) -> bool { self.target_elec }
        fn target_is_gas(&self) -> bool { self.target_gas }
        fn temp_is_safe(&self) -> bool { true }
        fn no_fault(&self) -> bool { true }
    }

    #[test]
    fn rejects_zero_tick_periods() {
        let mut cfg = ControllerConfig::default();
        cfg.inp_tick_ms = 0;
        let err = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap_err();
        assert_eq!(err, Error::InvalidConfig("inp_tick_ms must be nonzero"));
    }

    #[test]
    fn thermostat_on_drives_sequence_start_across_ticks() {
        let cfg = ControllerConfig { inp_tick_ms: 1, inp_debounce_ms: 3, tmr_tick_ms: 1, ..ControllerConfig::default() };
        let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
        let stub = Stub { th: true, target_elec: true, target_gas: false };
        let mut sink = NullActionSink;

        for _ in 0..5 {
            host.on_tick_ms(&stub, &stub, &mut sink);
        }

        assert_eq!(host.state(), StateId::Starting);
        assert!(host.timer_active(TimerId::Seq));
    }

    #[test]
    fn ignored_events_are_counted() {
        let cfg = ControllerConfig::default();
        let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
        let stub = Stub { th: false, target_elec: true, target_gas: false };
        let mut sink = NullActionSink;

        // Force an event with no matching row in IDLE.
        host.evq.push(QueueId::Normal, EventKind::TempSafe, crate::evq::EventArg::NONE, 0);
        host.on_tick_ms(&stub, &stub, &mut sink);

        assert_eq!(host.queue_stats(QueueId::Normal).ignored, 1);
    }
}
