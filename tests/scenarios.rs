//! Integration tests for the six concrete scenarios in the specification's
//! worked-example section, driven through [`HostLoop`] end to end.

use duoheat_ctl::config::{ControllerConfig, InputsConfig};
use duoheat_ctl::evq::{EventArg, EventKind, QueueId};
use duoheat_ctl::fsm::StateId;
use duoheat_ctl::host::HostLoop;
use duoheat_ctl::ports::{ActionSink, GuardProvider, RawInputs};
use duoheat_ctl::timers::TimerId;

struct Stub {
    thermostat_on_at_ms: Option<u32>,
    provider_elec_from_ms: Option<u32>,
    target_elec: bool,
    target_gas: bool,
    temp_safe: bool,
    now_ms: u32,
}

impl Default for Stub {
    fn default() -> Self {
        Self {
            thermostat_on_at_ms: None,
            provider_elec_from_ms: None,
            target_elec: true,
            target_gas: false,
            temp_safe: true,
            now_ms: 0,
        }
    }
}

impl RawInputs for Stub {
    fn thermostat(&self) -> bool {
        self.thermostat_on_at_ms.is_some_and(|t| self.now_ms >= t)
    }
    fn provider(&self) -> bool {
        self.provider_elec_from_ms.is_some_and(|t| self.now_ms >= t)
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

impl GuardProvider for Stub {
    fn lockout_clear(&self) -> bool {
        true
    }
    fn target_is_elec(&self) -> bool {
        self.target_elec
    }
    fn target_is_gas(&self) -> bool {
        self.target_gas
    }
    fn temp_is_safe(&self) -> bool {
        self.temp_safe
    }
    fn no_fault(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct CountingSink {
    all_off_calls: u32,
    enter_fault_calls: u32,
}

impl ActionSink for CountingSink {
    fn seq_start(&mut self) {}
    fn seq_step_element_up(&mut self, _n: u8) {}
    fn seq_step_element_down(&mut self, _n: u8) {}
    fn seq_stop(&mut self) {}
    fn enter_elec(&mut self) {}
    fn enter_gas(&mut self) {}
    fn enter_cool(&mut self) {}
    fn all_off(&mut self) {
        self.all_off_calls += 1;
    }
    fn enter_fault(&mut self) {
        self.enter_fault_calls += 1;
    }
}

fn fast_sampling_config() -> ControllerConfig {
    ControllerConfig { inp_tick_ms: 1, inp_debounce_ms: 30, inp_provider_stable_ms: 2000, inp_mode_stable_ms: 200, tmr_tick_ms: 1, seq_delay_ms: 12_000 }
}

#[test]
fn scenario_1_normal_electric_start() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
    // Seed while the thermostat still reads off, then let it close at t=0 so
    // the debounce channel actually observes an edge instead of treating
    // TH_ON as the pre-existing stable level.
    let mut hw = Stub::default();
    host.seed_from_hw(&hw);
    hw.thermostat_on_at_ms = Some(0);

    let mut sink = CountingSink::default();

    // 30ms debounce at a 1ms sampling tick fires on the 30th sample (t=29).
    for t in 0..=29u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }
    assert_eq!(host.state(), StateId::Starting);
    assert!(host.timer_active(TimerId::Seq));
    assert_eq!(host.sequencer().step, 0);

    for t in 30..12_029u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }
    assert_eq!(host.state(), StateId::Starting, "still ramping element 2 in");
    assert_eq!(host.sequencer().step, 0);

    // The next 12s step fires the final timeout, which self-queues SEQ_DONE
    // and the host drains it in the same call.
    for t in 12_029..=24_029u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }

    assert_eq!(host.state(), StateId::HeatElec);
}

#[test]
fn scenario_2_gas_start_bypasses_sequencer() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
    let mut hw = Stub { target_elec: false, target_gas: true, ..Stub::default() };
    let mut sink = CountingSink::default();
    host.seed_from_hw(&hw);
    hw.thermostat_on_at_ms = Some(0);

    for t in 0..=35u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }

    assert_eq!(host.state(), StateId::HeatGas);
    assert!(!host.timer_active(TimerId::Seq));
}

#[test]
fn scenario_3_thermostat_chatter_suppressed() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
    let mut hw = Stub::default();
    let mut sink = CountingSink::default();
    host.seed_from_hw(&hw);

    for t in 0..100u32 {
        hw.thermostat_on_at_ms = if (t / 10) % 2 == 0 { None } else { Some(0) };
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }

    assert_eq!(host.state(), StateId::Idle, "chatter below threshold must never start the sequence");
}

#[test]
fn scenario_4_provider_switch_debounce_boundary() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Idle).unwrap();
    let mut hw = Stub::default();
    let mut sink = CountingSink::default();
    host.seed_from_hw(&hw);
    hw.provider_elec_from_ms = Some(0);

    // Debounce fires on the 2000th 1ms sample after the edge: t = 1999.
    for t in 0..1999u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }
    assert_eq!(host.queue_stats(QueueId::Normal).pushed, 0, "no PROVIDER_TO_ELEC before the debounce threshold");

    hw.now_ms = 1999;
    host.on_tick_ms(&hw, &hw, &mut sink);
    assert_eq!(host.queue_stats(QueueId::Normal).pushed, 1);

    for t in 2000..2100u32 {
        hw.now_ms = t;
        host.on_tick_ms(&hw, &hw, &mut sink);
    }
    assert_eq!(host.queue_stats(QueueId::Normal).pushed, 1, "no further events without a new edge");
}

#[test]
fn scenario_5_overtemp_from_heat_elec_enters_fault_once() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::HeatElec).unwrap();
    let hw = Stub::default();
    let mut sink = CountingSink::default();

    host.report_event(EventKind::OvertempCrit, EventArg::NONE);
    host.on_tick_ms(&hw, &hw, &mut sink);

    assert_eq!(host.state(), StateId::Fault);
    assert_eq!(sink.enter_fault_calls, 1);
    assert_eq!(host.sequencer().direction, duoheat_ctl::fsm::SeqDirection::None);
    assert!(!host.timer_active(TimerId::Seq));
}

#[test]
fn scenario_6_cooldown_completion_runs_all_off_once() {
    let cfg = fast_sampling_config();
    let mut host = HostLoop::new(&cfg, &InputsConfig::default(), StateId::Cooldown).unwrap();
    let hw = Stub::default();
    let mut sink = CountingSink::default();

    host.report_event(EventKind::TempSafe, EventArg::NONE);
    host.on_tick_ms(&hw, &hw, &mut sink);

    assert_eq!(host.state(), StateId::Idle);
    assert_eq!(sink.all_off_calls, 1);
}
