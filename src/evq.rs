//! Dual-priority event queue.
//!
//! Two fixed-capacity ring buffers — `NORMAL` and `FAULTS` — feed the FSM
//! core. `FAULTS` is always drained first. Coalescing suppresses duplicate
//! pending events for a configurable subset of kinds; overflow is handled
//! asymmetrically: `NORMAL` drops the incoming event, `FAULTS` overwrites
//! the oldest one rather than lose a fresh fault.
//!
//! Grounded on the teacher's `events.rs` ring-buffer/stats shape, restated
//! as two `heapless::Deque`s (the teacher's own fixed-capacity vocabulary)
//! since the ISR-facing atomics that module needed don't apply to this
//! single-threaded cooperative core (see `host.rs`).

use heapless::Deque;
use log::warn;

use crate::config::{EVQ_FAULTS_CAP, EVQ_NORMAL_CAP};

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Canonical event dictionary. Values 1..=23; 0 is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    ThOn = 1,
    ThOff = 2,
    ProviderToElec = 3,
    ProviderToGas = 4,
    UserModeElec = 5,
    UserModeGas = 6,
    UserModeBi = 7,
    SeqStepTimeout = 8,
    MinOnDone = 9,
    MinOffDone = 10,
    CooldownTimeout = 11,
    TempSafe = 12,
    OvertempWarn = 13,
    OvertempCrit = 14,
    FaultRedundancy = 15,
    FaultTimeBurner = 16,
    FaultTimeElems = 17,
    SensorFault = 18,
    FaultClear = 19,
    SeqDone = 20,
    TransitionReq = 21,
    Reserved1 = 22,
    Reserved2 = 23,
}

impl EventKind {
    /// One past the highest valid discriminant (mirrors `EVT_MAX_ENUM`).
    pub const MAX_ENUM: u8 = 24;

    /// Fallible conversion from a raw byte — the boundary a hardware ISR
    /// or deserializer would cross. Rejects `0` and anything `>= MAX_ENUM`.
    pub fn try_from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Self::ThOn,
            2 => Self::ThOff,
            3 => Self::ProviderToElec,
            4 => Self::ProviderToGas,
            5 => Self::UserModeElec,
            6 => Self::UserModeGas,
            7 => Self::UserModeBi,
            8 => Self::SeqStepTimeout,
            9 => Self::MinOnDone,
            10 => Self::MinOffDone,
            11 => Self::CooldownTimeout,
            12 => Self::TempSafe,
            13 => Self::OvertempWarn,
            14 => Self::OvertempCrit,
            15 => Self::FaultRedundancy,
            16 => Self::FaultTimeBurner,
            17 => Self::FaultTimeElems,
            18 => Self::SensorFault,
            19 => Self::FaultClear,
            20 => Self::SeqDone,
            21 => Self::TransitionReq,
            22 => Self::Reserved1,
            23 => Self::Reserved2,
            _ => return None,
        })
    }

    fn is_fault_class(self) -> bool {
        matches!(
            self,
            Self::OvertempCrit
                | Self::FaultRedundancy
                | Self::FaultTimeBurner
                | Self::FaultTimeElems
                | Self::SensorFault
        )
    }
}

/// Small fixed-shape scalar payload attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventArg {
    pub u8: u8,
    pub u16: u16,
}

impl EventArg {
    pub const NONE: Self = Self { u8: 0, u16: 0 };
}

/// A queued event: kind, payload, and the producer's tick timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub arg: EventArg,
    pub tick: u32,
}

/// Which of the two priority-ranked queues an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueId {
    Normal,
    Faults,
}

/// Per-queue telemetry counters. Reading never resets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvQueueStats {
    pub pushed: u32,
    pub popped: u32,
    pub dropped: u32,
    pub coalesced: u32,
    pub ignored: u32,
}

/// A single fixed-capacity priority class.
#[derive(Debug)]
struct EventQueue<const CAP: usize> {
    buf: Deque<Event, CAP>,
    stats: EvQueueStats,
}

impl<const CAP: usize> EventQueue<CAP> {
    fn new() -> Self {
        Self {
            buf: Deque::new(),
            stats: EvQueueStats::default(),
        }
    }

    fn already_queued(&self, kind: EventKind) -> bool {
        self.buf.iter().any(|e| e.kind == kind)
    }
}

/// The complete dual-priority event queue owned by the host loop.
#[derive(Debug)]
pub struct EvqCore {
    normal: EventQueue<EVQ_NORMAL_CAP>,
    faults: EventQueue<EVQ_FAULTS_CAP>,
    /// Indexed by discriminant; slot 0 unused.
    coalesce: [bool; EventKind::MAX_ENUM as usize],
}

impl EvqCore {
    /// Build a fresh queue with the default coalescing policy: ON for
    /// `{TH_ON, TH_OFF, TRANSITION_REQ, PROVIDER_TO_ELEC, PROVIDER_TO_GAS}`.
    pub fn new() -> Self {
        let mut coalesce = [false; EventKind::MAX_ENUM as usize];
        for k in [
            EventKind::ThOn,
            EventKind::ThOff,
            EventKind::TransitionReq,
            EventKind::ProviderToElec,
            EventKind::ProviderToGas,
        ] {
            coalesce[k as usize] = true;
        }
        Self {
            normal: EventQueue::new(),
            faults: EventQueue::new(),
            coalesce,
        }
    }

    /// Enable or disable coalescing for `kind`. `kind` is already a
    /// validated [`EventKind`] here, so this always succeeds; `true` is
    /// returned to mirror [`EvqCore::push`]'s boundary-check shape.
    /// [`EvqCore::set_coalesce_raw`] is the fallible entry point for an
    /// untyped raw kind.
    pub fn set_coalesce(&mut self, kind: EventKind, enable: bool) -> bool {
        self.coalesce[kind as usize] = enable;
        true
    }

    /// Raw-byte entry point for `set_coalesce` — the boundary a hardware
    /// ISR or deserializer would cross with an untyped kind. Rejects an
    /// invalid `raw_kind` without side effects.
    pub fn set_coalesce_raw(&mut self, raw_kind: u8, enable: bool) -> bool {
        match EventKind::try_from_u8(raw_kind) {
            Some(kind) => self.set_coalesce(kind, enable),
            None => false,
        }
    }

    /// Push a validated event kind into the named queue.
    pub fn push(&mut self, qid: QueueId, kind: EventKind, arg: EventArg, tick: u32) -> bool {
        let event = Event { kind, arg, tick };

        if self.coalesce[kind as usize] {
            let already = match qid {
                QueueId::Normal => self.normal.already_queued(kind),
                QueueId::Faults => self.faults.already_queued(kind),
            };
            if already {
                match qid {
                    QueueId::Normal => self.normal.stats.coalesced += 1,
                    QueueId::Faults => self.faults.stats.coalesced += 1,
                }
                return true;
            }
        }

        match qid {
            QueueId::Normal => {
                if self.normal.buf.push_back(event).is_err() {
                    self.normal.stats.dropped += 1;
                    return false;
                }
                self.normal.stats.pushed += 1;
                true
            }
            QueueId::Faults => {
                if self.faults.buf.is_full() {
                    self.faults.buf.pop_front();
                    self.faults.stats.dropped += 1;
                    warn!("FAULTS queue overflow: dropped oldest fault");
                }
                // Capacity was just freed (or never exhausted) — this cannot fail.
                let _ = self.faults.buf.push_back(event);
                self.faults.stats.pushed += 1;
                true
            }
        }
    }

    /// Push a raw byte kind — the entry point a hardware ISR or a
    /// deserializer would use, where the kind has not yet been validated.
    pub fn push_raw(&mut self, qid: QueueId, raw_kind: u8, arg: EventArg, tick: u32) -> bool {
        match EventKind::try_from_u8(raw_kind) {
            Some(kind) => self.push(qid, kind, arg, tick),
            None => false,
        }
    }

    /// Pop the next event: drains `FAULTS` to empty before touching `NORMAL`.
    pub fn pop_next(&mut self) -> Option<Event> {
        if let Some(e) = self.faults.buf.pop_front() {
            self.faults.stats.popped += 1;
            return Some(e);
        }
        if let Some(e) = self.normal.buf.pop_front() {
            self.normal.stats.popped += 1;
            return Some(e);
        }
        None
    }

    /// The queue a fault-class event belongs in (used by the host loop
    /// when it classifies an externally-observed fault before pushing it).
    pub fn queue_for(kind: EventKind) -> QueueId {
        if kind.is_fault_class() {
            QueueId::Faults
        } else {
            QueueId::Normal
        }
    }

    /// Record that the FSM found no matching transition for `kind`.
    pub fn note_ignored(&mut self, _kind: EventKind) {
        self.normal.stats.ignored += 1;
    }

    /// Read-only telemetry snapshot for a queue. Does not reset counters.
    pub fn stats(&self, qid: QueueId) -> EvQueueStats {
        match qid {
            QueueId::Normal => self.normal.stats,
            QueueId::Faults => self.faults.stats,
        }
    }

    /// Current number of queued events (for diagnostics/tests only).
    pub fn len(&self, qid: QueueId) -> usize {
        match qid {
            QueueId::Normal => self.normal.buf.len(),
            QueueId::Faults => self.faults.buf.len(),
        }
    }
}

impl Default for EvqCore {
    fn default() -> Self {
        Self::new()
    }
}
