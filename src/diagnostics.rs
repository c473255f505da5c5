//! Telemetry readback.
//!
//! Every counter here is read-only and non-resetting: polling for
//! diagnostics must never perturb control-path state. `ControllerSnapshot`
//! aggregates everything a host embedder would want to hand to its own
//! telemetry transport — this crate does not transmit it anywhere itself
//! (no networking, per spec.md §1).
//!
//! Grounded on the teacher's `diagnostics.rs` crash-log/counter readback
//! shape, narrowed to the counters this crate actually owns.

use crate::evq::{EvQueueStats, QueueId};
use crate::fsm::{SequencerState, StateId};
use crate::host::HostLoop;
use crate::timers::TimerId;

/// All eight timer identities, for iterating the active-timer bitmap in
/// table order.
const ALL_TIMERS: [TimerId; 8] = [
    TimerId::Seq,
    TimerId::MinOff,
    TimerId::MinOn,
    TimerId::CooldownMin,
    TimerId::MaxBurner,
    TimerId::MaxElems,
    TimerId::User0,
    TimerId::User1,
];

/// Point-in-time readback of the whole controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSnapshot {
    pub state: StateId,
    pub sequencer: SequencerState,
    pub normal_queue: EvQueueStats,
    pub faults_queue: EvQueueStats,
    /// Bit `i` set means `ALL_TIMERS[i]` is currently armed.
    pub active_timers_bitmap: u8,
    pub uptime_ms: u32,
}

impl HostLoop {
    /// Capture a [`ControllerSnapshot`] of the current control-core
    /// state. Cheap: every field is a plain read of already-maintained
    /// counters, no queue draining or timer mutation happens here.
    pub fn snapshot(&self) -> ControllerSnapshot {
        let mut bitmap = 0u8;
        for (i, &id) in ALL_TIMERS.iter().enumerate() {
            if self.timer_active(id) {
                bitmap |= 1 << i;
            }
        }

        ControllerSnapshot {
            state: self.state(),
            sequencer: self.sequencer(),
            normal_queue: self.queue_stats(QueueId::Normal),
            faults_queue: self.queue_stats(QueueId::Faults),
            active_timers_bitmap: bitmap,
            uptime_ms: self.uptime_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, InputsConfig};

    #[test]
    fn fresh_host_loop_snapshot_is_idle_with_no_timers_active() {
        let host = HostLoop::new(&ControllerConfig::default(), &InputsConfig::default(), StateId::Idle).unwrap();
        let snap = host.snapshot();
        assert_eq!(snap.state, StateId::Idle);
        assert_eq!(snap.active_timers_bitmap, 0);
        assert_eq!(snap.normal_queue.pushed, 0);
    }
}
