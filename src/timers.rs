//! Software timer service.
//!
//! A fixed-size array of one-shot timers, indexed by [`TimerId`]. `set`
//! rounds the requested delay up to the next tick (never fires early),
//! and `tick` applies back-pressure: if the expiry event can't be pushed
//! because the target queue is full, the timer holds at zero ticks and
//! retries next call rather than silently losing the expiry.
//!
//! Grounded on `examples/original_source/Core/Src/timers.c` for the
//! ceil-rounding and retry-on-push-failure semantics, restated in the
//! teacher's `scheduler.rs` style (fixed-size table, `SchedulerDelegate`
//! callback on fire) — here the "delegate" is the event queue itself.

use crate::evq::{Event, EventArg, EventKind, EvqCore, QueueId};

/// Number of independently armable software timers.
pub const TMR_COUNT: usize = 8;

/// Canonical timer identity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerId {
    Seq = 0,
    MinOff = 1,
    MinOn = 2,
    CooldownMin = 3,
    MaxBurner = 4,
    MaxElems = 5,
    User0 = 6,
    User1 = 7,
}

impl TimerId {
    /// Fallible conversion from a raw slot index — the boundary a
    /// hardware ISR or deserializer would cross. Rejects anything
    /// `>= TMR_COUNT`.
    fn try_from_usize(raw: usize) -> Option<Self> {
        Some(match raw {
            0 => Self::Seq,
            1 => Self::MinOff,
            2 => Self::MinOn,
            3 => Self::CooldownMin,
            4 => Self::MaxBurner,
            5 => Self::MaxElems,
            6 => Self::User0,
            7 => Self::User1,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SwTimer {
    ticks: u32,
    kind: Option<EventKind>,
    arg: EventArg,
}

/// Fixed-size one-shot timer bank driven by a fixed tick period.
#[derive(Debug)]
pub struct TimerService {
    timers: [SwTimer; TMR_COUNT],
    tick_ms: u32,
    uptime_ticks: u32,
}

impl TimerService {
    /// Build a service driven by a `tick_ms`-period caller.
    pub fn new(tick_ms: u32) -> Self {
        Self {
            timers: [SwTimer::default(); TMR_COUNT],
            tick_ms: tick_ms.max(1),
            uptime_ticks: 0,
        }
    }

    fn ms_to_ticks(&self, delay_ms: u32) -> u32 {
        let mut q = delay_ms / self.tick_ms;
        if delay_ms % self.tick_ms != 0 {
            q += 1;
        }
        q.max(1)
    }

    /// Arm `id` to fire `kind`/`arg` after `delay_ms`, rounded up to the
    /// tick granularity. Re-arming an already-active timer replaces it.
    ///
    /// Returns `bool` per spec to mirror [`crate::evq::EvqCore::push`]'s
    /// boundary-check shape; `id`/`kind` are already type-safe enums here
    /// so this always succeeds. `set_raw` is the fallible entry point a
    /// hardware ISR or deserializer crossing from an untyped timer index
    /// would use instead.
    pub fn set(&mut self, id: TimerId, delay_ms: u32, kind: EventKind, arg: EventArg) -> bool {
        let ticks = self.ms_to_ticks(delay_ms);
        let t = &mut self.timers[id as usize];
        t.ticks = ticks;
        t.kind = Some(kind);
        t.arg = arg;
        true
    }

    /// Raw-index entry point for `set` — the boundary a hardware ISR or
    /// deserializer would cross with an untyped timer slot and event
    /// kind. Rejects an out-of-range `raw_id` or invalid `raw_kind`
    /// without side effects.
    pub fn set_raw(&mut self, raw_id: usize, delay_ms: u32, raw_kind: u8, arg: EventArg) -> bool {
        let Some(id) = TimerId::try_from_usize(raw_id) else { return false };
        let Some(kind) = EventKind::try_from_u8(raw_kind) else { return false };
        self.set(id, delay_ms, kind, arg)
    }

    /// Disarm `id`. A no-op if it wasn't active.
    pub fn cancel(&mut self, id: TimerId) {
        let t = &mut self.timers[id as usize];
        t.ticks = 0;
        t.kind = None;
    }

    /// Whether `id` is currently armed (including a pending retry at
    /// zero ticks that has not yet been accepted by the event queue).
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers[id as usize].kind.is_some()
    }

    /// Remaining time for `id` in milliseconds, rounded to tick
    /// granularity. `0` if inactive.
    pub fn remaining_ms(&self, id: TimerId) -> u32 {
        self.timers[id as usize].ticks * self.tick_ms
    }

    /// The caller's tick period, for timers that need it to convert
    /// other delays (e.g. the input sampler's debounce thresholds).
    pub fn tick_ms(&self) -> u32 {
        self.tick_ms
    }

    /// Advance every armed timer by one tick. Expired timers attempt to
    /// push their event onto `evq`'s NORMAL queue; a full queue leaves
    /// the timer parked at zero ticks so the next `tick` retries instead
    /// of dropping the expiry.
    pub fn tick(&mut self, evq: &mut EvqCore) {
        self.uptime_ticks = self.uptime_ticks.wrapping_add(1);

        for t in &mut self.timers {
            let Some(kind) = t.kind else { continue };

            if t.ticks > 0 {
                t.ticks -= 1;
            }

            if t.ticks == 0 {
                let pushed = evq.push(QueueId::Normal, kind, t.arg, self.uptime_ticks);
                if pushed {
                    t.kind = None;
                }
                // else: retry next tick, ticks already pinned at 0.
            }
        }
    }

    /// Ticks elapsed since construction, for diagnostics.
    pub fn uptime_ticks(&self) -> u32 {
        self.uptime_ticks
    }
}

/// The event the most recent `tick` would emit for `id`, without
/// mutating state — test/diagnostic helper only.
#[cfg(test)]
fn peek(svc: &TimerService, id: TimerId) -> Option<Event> {
    let t = &svc.timers[id as usize];
    t.kind.map(|kind| Event {
        kind,
        arg: t.arg,
        tick: svc.uptime_ticks,
    })
}
