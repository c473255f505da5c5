//! Input sampler: per-signal debounce and event emission.
//!
//! Three independent debounce state machines run off [`RawInputs`] every
//! tick: the thermostat contact (short threshold), the bi-energy
//! provider selector (long threshold — a slow, safety-relevant signal),
//! and the three-way user mode selector (its own threshold, resolved
//! through [`TriSelector`] since exactly one of three contacts should be
//! active at a time).
//!
//! Grounded on `examples/original_source/Core/Src/inputs.c`: the
//! same-raw-sample accumulate / threshold / saturate-don't-reset
//! behavior, and the three-way selector's "non-exclusive reading resets
//! the accumulator without touching the stable index" ambiguity rule.

use crate::config::{ControllerConfig, InputsConfig};
use crate::evq::{EventArg, EventKind, EvqCore, QueueId};
use crate::ports::RawInputs;

fn apply_active_low(raw: bool, active_low: bool) -> bool {
    if active_low {
        !raw
    } else {
        raw
    }
}

/// Single-channel threshold debounce over a boolean signal.
#[derive(Debug, Clone, Copy)]
struct DebounceChannel {
    stable: bool,
    last_raw: bool,
    acc_ms: u16,
    thresh_ms: u16,
    active_low: bool,
}

impl DebounceChannel {
    fn new(active_low: bool, thresh_ms: u16) -> Self {
        Self {
            stable: false,
            last_raw: false,
            acc_ms: 0,
            thresh_ms,
            active_low,
        }
    }

    fn seed(&mut self, raw: bool) {
        self.stable = apply_active_low(raw, self.active_low);
        self.last_raw = raw;
        self.acc_ms = self.thresh_ms;
    }

    /// Accumulate one `tick_ms`-wide sample. Returns the new stable
    /// level if it just changed.
    fn tick(&mut self, raw: bool, tick_ms: u16) -> Option<bool> {
        if raw == self.last_raw {
            self.acc_ms = self.acc_ms.saturating_add(tick_ms);
            if self.acc_ms >= self.thresh_ms {
                let lvl = apply_active_low(raw, self.active_low);
                if lvl != self.stable {
                    self.stable = lvl;
                    return Some(lvl);
                }
            }
            None
        } else {
            self.last_raw = raw;
            self.acc_ms = tick_ms;
            None
        }
    }
}

/// Three-position exclusive selector (e.g. ELEC/GAS/BI), debounced as a
/// single unit so a mechanical transition across positions can't emit a
/// spurious intermediate state.
#[derive(Debug, Clone, Copy)]
struct TriSelector {
    stable_idx: u8,
    /// `None` mirrors the original's sentinel 255: last sample was
    /// ambiguous (not exactly one contact active).
    last_idx: Option<u8>,
    acc_ms: u16,
    thresh_ms: u16,
    a_active_low: bool,
    b_active_low: bool,
    c_active_low: bool,
}

impl TriSelector {
    fn new(thresh_ms: u16, a: bool, b: bool, c: bool) -> Self {
        Self {
            stable_idx: 0,
            last_idx: None,
            acc_ms: 0,
            thresh_ms,
            a_active_low: a,
            b_active_low: b,
            c_active_low: c,
        }
    }

    fn read_index(&self, raw: (bool, bool, bool)) -> Option<u8> {
        let a = apply_active_low(raw.0, self.a_active_low);
        let b = apply_active_low(raw.1, self.b_active_low);
        let c = apply_active_low(raw.2, self.c_active_low);
        match (a, b, c) {
            (true, false, false) => Some(0),
            (false, true, false) => Some(1),
            (false, false, true) => Some(2),
            _ => None,
        }
    }

    fn seed(&mut self, raw: (bool, bool, bool)) {
        match self.read_index(raw) {
            Some(idx) => {
                self.stable_idx = idx;
                self.last_idx = Some(idx);
                self.acc_ms = self.thresh_ms;
            }
            None => {
                self.stable_idx = 0;
                self.last_idx = None;
                self.acc_ms = 0;
            }
        }
    }

    /// Returns the new stable index if it just changed.
    fn tick(&mut self, raw: (bool, bool, bool), tick_ms: u16) -> Option<u8> {
        let Some(idx) = self.read_index(raw) else {
            self.acc_ms = 0;
            self.last_idx = None;
            return None;
        };

        if self.last_idx == Some(idx) {
            self.acc_ms = self.acc_ms.saturating_add(tick_ms);
            if self.acc_ms >= self.thresh_ms && idx != self.stable_idx {
                self.stable_idx = idx;
                return Some(idx);
            }
            None
        } else {
            self.last_idx = Some(idx);
            self.acc_ms = tick_ms;
            None
        }
    }
}

/// Owns the three debounce channels and turns their stable-state
/// changes into events on the NORMAL queue.
#[derive(Debug)]
pub struct InputSampler {
    thermostat: DebounceChannel,
    provider: DebounceChannel,
    mode: TriSelector,
    tick_ms: u16,
}

impl InputSampler {
    pub fn new(cfg: &ControllerConfig, inputs: &InputsConfig) -> Self {
        Self {
            thermostat: DebounceChannel::new(inputs.thermostat_active_low, cfg.inp_debounce_ms),
            provider: DebounceChannel::new(inputs.provider_active_low, cfg.inp_provider_stable_ms),
            mode: TriSelector::new(
                cfg.inp_mode_stable_ms,
                inputs.mode_a_active_low,
                inputs.mode_b_active_low,
                inputs.mode_c_active_low,
            ),
            tick_ms: cfg.inp_tick_ms.min(u32::from(u16::MAX)) as u16,
        }
    }

    /// Seed every channel's stable state from the current hardware
    /// reading without emitting any events — avoids a startup flood.
    pub fn seed_from_hw(&mut self, raw: &dyn RawInputs) {
        self.thermostat.seed(raw.thermostat());
        self.provider.seed(raw.provider());
        self.mode.seed((raw.mode_a(), raw.mode_b(), raw.mode_c()));
    }

    /// Sample all three channels once and push any resulting events.
    pub fn tick(&mut self, raw: &dyn RawInputs, evq: &mut EvqCore, tick_stamp: u32) {
        if let Some(level) = self.thermostat.tick(raw.thermostat(), self.tick_ms) {
            log::debug!("thermostat stable -> {level}");
            let kind = if level { EventKind::ThOn } else { EventKind::ThOff };
            evq.push(QueueId::Normal, kind, EventArg::NONE, tick_stamp);
        }

        if let Some(level) = self.provider.tick(raw.provider(), self.tick_ms) {
            log::debug!("provider stable -> {}", if level { "elec" } else { "gas" });
            let kind = if level {
                EventKind::ProviderToElec
            } else {
                EventKind::ProviderToGas
            };
            evq.push(QueueId::Normal, kind, EventArg::NONE, tick_stamp);
        }

        let mode_raw = (raw.mode_a(), raw.mode_b(), raw.mode_c());
        if let Some(idx) = self.mode.tick(mode_raw, self.tick_ms) {
            log::debug!("mode selector stable -> {idx}");
            let kind = match idx {
                0 => EventKind::UserModeElec,
                1 => EventKind::UserModeGas,
                _ => EventKind::UserModeBi,
            };
            evq.push(QueueId::Normal, kind, EventArg::NONE, tick_stamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        th: bool,
        provider: bool,
        mode: (bool, bool, bool),
    }

    impl RawInputs for Fixed {
        fn thermostat(&self) -> bool {
            self.th
        }
        fn provider(&self) -> bool {
            self.provider
        }
        fn mode_a(&self) -> bool {
            self.mode.0
        }
        fn mode_b(&self) -> bool {
            self.mode.1
        }
        fn mode_c(&self) -> bool {
            self.mode.2
        }
    }

    fn cfg() -> ControllerConfig {
        ControllerConfig {
            inp_tick_ms: 10,
            inp_debounce_ms: 30,
            inp_provider_stable_ms: 2000,
            inp_mode_stable_ms: 200,
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn thermostat_needs_three_stable_samples_at_30ms_over_10ms_tick() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();
        let raw = Fixed { th: true, provider: false, mode: (true, false, false) };

        s.tick(&raw, &mut evq, 0);
        s.tick(&raw, &mut evq, 0);
        assert_eq!(evq.len(QueueId::Normal), 0, "must not fire before threshold");

        s.tick(&raw, &mut evq, 0);
        assert_eq!(evq.len(QueueId::Normal), 1);
        let e = evq.pop_next().unwrap();
        assert_eq!(e.kind, EventKind::ThOn);
    }

    #[test]
    fn chatter_resets_accumulator_without_emitting() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();

        for flip in 0..10 {
            let th = flip % 2 == 0;
            let raw = Fixed { th, provider: false, mode: (true, false, false) };
            s.tick(&raw, &mut evq, 0);
        }
        assert_eq!(evq.len(QueueId::Normal), 0);
    }

    #[test]
    fn seed_from_hw_emits_nothing() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();
        let raw = Fixed { th: true, provider: true, mode: (false, true, false) };
        s.seed_from_hw(&raw);
        s.tick(&raw, &mut evq, 0);
        assert_eq!(evq.len(QueueId::Normal), 0, "seeded state must already equal sampled state");
    }

    #[test]
    fn tri_selector_ambiguous_reading_does_not_change_stable() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();
        // Two contacts active at once: mechanically ambiguous.
        let raw = Fixed { th: false, provider: false, mode: (true, true, false) };
        for _ in 0..30 {
            s.tick(&raw, &mut evq, 0);
        }
        assert_eq!(evq.len(QueueId::Normal), 0);
    }

    #[test]
    fn tri_selector_emits_once_stable() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();
        let raw = Fixed { th: false, provider: false, mode: (false, true, false) };
        for _ in 0..20 {
            s.tick(&raw, &mut evq, 0);
        }
        assert_eq!(evq.len(QueueId::Normal), 1);
        assert_eq!(evq.pop_next().unwrap().kind, EventKind::UserModeGas);
    }

    #[test]
    fn provider_uses_long_threshold() {
        let mut s = InputSampler::new(&cfg(), &InputsConfig::default());
        let mut evq = EvqCore::new();
        let raw = Fixed { th: false, provider: true, mode: (true, false, false) };
        for _ in 0..199 {
            s.tick(&raw, &mut evq, 0);
        }
        assert_eq!(evq.len(QueueId::Normal), 0, "2000ms/10ms = 200 samples needed");
        s.tick(&raw, &mut evq, 0);
        assert_eq!(evq.len(QueueId::Normal), 1);
        assert_eq!(evq.pop_next().unwrap().kind, EventKind::ProviderToElec);
    }
}
