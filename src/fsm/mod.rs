//! Table-driven finite state machine with a staged element sequencer.
//!
//! The engine is a linear scan over a fixed, declaration-ordered
//! transition table: the first row whose `(state, event)` matches and
//! whose guard passes wins. A guard failure does not reject the event —
//! the scan continues to the next row, so several rows can share a
//! `(state, event)` pair distinguished only by guard (see rows 0–1).
//! Critical faults bypass the table entirely through a fast path that
//! fires from any state.
//!
//! Grounded on `examples/original_source/Core/Src/fsm.c`'s `FSM[]` table
//! and `fsm_handle_event`'s scan-continue-on-guard-fail loop, restated in
//! the teacher's function-pointer-table style (`fsm/mod.rs`) as a `const`
//! array of plain data dispatched through `guard_eval`/`action_exec`
//! match arms instead of function pointers, since every guard/action here
//! is a closed, small set known at compile time.

use crate::evq::{Event, EventArg, EventKind, EvqCore, QueueId};
use crate::ports::{ActionSink, GuardProvider};
use crate::timers::{TimerId, TimerService};

/// Process state. `repr(u8)` to match the teacher's closed-enum
/// convention for values that cross a diagnostics boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Starting = 1,
    HeatElec = 2,
    HeatGas = 3,
    Stopping = 4,
    Cooldown = 5,
    Fault = 6,
}

/// Side-effect-free predicates consulted by the table. `None` always
/// passes; the two compound variants implement the §9 LOCKOUT_CLEAR
/// resolution (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardId {
    None,
    TargetElec,
    TargetGas,
    TempSafe,
    NoFault,
    /// `LockoutClear && TargetElec` — the `(IDLE, TH_ON)` electric row's
    /// guard; no separate ahead-of-scan lockout-only row exists (§9).
    LockoutAndTargetElec,
    /// `LockoutClear && TargetGas`.
    LockoutAndTargetGas,
}

/// Atomic action intents dispatched to an [`ActionSink`]. The FSM itself
/// never touches a GPIO or relay — it only decides which intent fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    None,
    SeqStart,
    SeqStep,
    SeqStop,
    EnterElec,
    EnterGas,
    EnterCool,
    AllOff,
    EnterFault,
}

/// Direction of the in-progress element sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqDirection {
    None,
    Up,
    Down,
}

/// Sequencer progress, exposed read-only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerState {
    pub direction: SeqDirection,
    pub step: u8,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self { direction: SeqDirection::None, step: 0 }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
struct Transition {
    src: StateId,
    event: EventKind,
    guard: GuardId,
    action: ActionId,
    dst: StateId,
}

/// The complete, declaration-ordered transition table. Row order is
/// significant: `handle_event` applies the first matching, guard-passing
/// row. Rows 0–1 share `(IDLE, TH_ON)`, distinguished only by their
/// compound guard (§9 LOCKOUT_CLEAR resolution, option (a) — no separate
/// lockout-only anchor row, since any such row sitting ahead of these in
/// scan order would match first whenever lockout is clear and swallow
/// both of them). Row 11 resolves the FAULT-exit open question (§9).
const TRANSITIONS: [Transition; 12] = [
    Transition { src: StateId::Idle, event: EventKind::ThOn, guard: GuardId::LockoutAndTargetElec, action: ActionId::SeqStart, dst: StateId::Starting },
    Transition { src: StateId::Idle, event: EventKind::ThOn, guard: GuardId::LockoutAndTargetGas, action: ActionId::EnterGas, dst: StateId::HeatGas },
    Transition { src: StateId::Starting, event: EventKind::SeqStepTimeout, guard: GuardId::None, action: ActionId::SeqStep, dst: StateId::Starting },
    Transition { src: StateId::Stopping, event: EventKind::SeqStepTimeout, guard: GuardId::None, action: ActionId::SeqStep, dst: StateId::Stopping },
    Transition { src: StateId::Starting, event: EventKind::SeqDone, guard: GuardId::None, action: ActionId::EnterElec, dst: StateId::HeatElec },
    Transition { src: StateId::Stopping, event: EventKind::SeqDone, guard: GuardId::None, action: ActionId::EnterCool, dst: StateId::Cooldown },
    Transition { src: StateId::HeatElec, event: EventKind::ThOff, guard: GuardId::None, action: ActionId::SeqStop, dst: StateId::Stopping },
    Transition { src: StateId::HeatGas, event: EventKind::ThOff, guard: GuardId::None, action: ActionId::EnterCool, dst: StateId::Cooldown },
    Transition { src: StateId::Cooldown, event: EventKind::TempSafe, guard: GuardId::None, action: ActionId::AllOff, dst: StateId::Idle },
    Transition { src: StateId::HeatElec, event: EventKind::TransitionReq, guard: GuardId::TargetGas, action: ActionId::SeqStop, dst: StateId::Stopping },
    Transition { src: StateId::HeatGas, event: EventKind::TransitionReq, guard: GuardId::TargetElec, action: ActionId::EnterCool, dst: StateId::Cooldown },
    Transition { src: StateId::Fault, event: EventKind::FaultClear, guard: GuardId::NoFault, action: ActionId::AllOff, dst: StateId::Idle },
];

fn guard_eval(guard: GuardId, guards: &dyn GuardProvider) -> bool {
    match guard {
        GuardId::None => true,
        GuardId::TargetElec => guards.target_is_elec(),
        GuardId::TargetGas => guards.target_is_gas(),
        GuardId::TempSafe => guards.temp_is_safe(),
        GuardId::NoFault => guards.no_fault(),
        GuardId::LockoutAndTargetElec => guards.lockout_clear() && guards.target_is_elec(),
        GuardId::LockoutAndTargetGas => guards.lockout_clear() && guards.target_is_gas(),
    }
}

fn is_critical_fault(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::OvertempCrit
            | EventKind::FaultRedundancy
            | EventKind::FaultTimeBurner
            | EventKind::FaultTimeElems
            | EventKind::SensorFault
    )
}

/// Owns process state and sequencer progress; consumes events one at a
/// time through [`FsmCore::handle_event`].
#[derive(Debug)]
pub struct FsmCore {
    state: StateId,
    seq: SequencerState,
    seq_delay_ms: u32,
}

impl FsmCore {
    pub fn new(initial: StateId, seq_delay_ms: u32) -> Self {
        Self { state: initial, seq: SequencerState::default(), seq_delay_ms }
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn sequencer(&self) -> SequencerState {
        self.seq
    }

    /// Apply `event`'s effect, if any. Returns `true` iff a transition
    /// (table row or fault fast-path) fired.
    pub fn handle_event(
        &mut self,
        event: &Event,
        guards: &dyn GuardProvider,
        timers: &mut TimerService,
        evq: &mut EvqCore,
        actions: &mut dyn ActionSink,
    ) -> bool {
        if is_critical_fault(event.kind) {
            log::warn!("{:?}: critical fault {:?} -> Fault", self.state, event.kind);
            self.seq = SequencerState::default();
            actions.enter_fault();
            self.state = StateId::Fault;
            return true;
        }

        for row in &TRANSITIONS {
            if row.src != self.state || row.event != event.kind {
                continue;
            }
            if !guard_eval(row.guard, guards) {
                continue;
            }
            log::info!("{:?} x {:?} -> {:?}", row.src, row.event, row.dst);
            self.exec_action(row.action, timers, evq, actions, event.tick);
            self.state = row.dst;
            return true;
        }

        false
    }

    fn exec_action(
        &mut self,
        action: ActionId,
        timers: &mut TimerService,
        evq: &mut EvqCore,
        actions: &mut dyn ActionSink,
        tick: u32,
    ) {
        match action {
            ActionId::None => {}
            ActionId::SeqStart => {
                self.seq = SequencerState { direction: SeqDirection::Up, step: 0 };
                actions.seq_start();
                actions.seq_step_element_up(1);
                timers.set(TimerId::Seq, self.seq_delay_ms, EventKind::SeqStepTimeout, EventArg::NONE);
            }
            ActionId::SeqStop => {
                self.seq = SequencerState { direction: SeqDirection::Down, step: 3 };
                actions.seq_stop();
                actions.seq_step_element_down(3);
                timers.set(TimerId::Seq, self.seq_delay_ms, EventKind::SeqStepTimeout, EventArg::NONE);
            }
            ActionId::SeqStep => self.seq_step(timers, evq, actions, tick),
            ActionId::EnterElec => actions.enter_elec(),
            ActionId::EnterGas => actions.enter_gas(),
            ActionId::EnterCool => actions.enter_cool(),
            ActionId::AllOff => actions.all_off(),
            ActionId::EnterFault => {
                self.seq = SequencerState::default();
                actions.enter_fault();
            }
        }
    }

    fn seq_step(&mut self, timers: &mut TimerService, evq: &mut EvqCore, actions: &mut dyn ActionSink, tick: u32) {
        match self.seq.direction {
            SeqDirection::Up => match self.seq.step {
                0 => {
                    self.seq.step = 1;
                    actions.seq_step_element_up(2);
                    timers.set(TimerId::Seq, self.seq_delay_ms, EventKind::SeqStepTimeout, EventArg::NONE);
                }
                1 => {
                    self.seq.step = 2;
                    actions.seq_step_element_up(3);
                    evq.push(QueueId::Normal, EventKind::SeqDone, EventArg::NONE, tick);
                    self.seq.direction = SeqDirection::None;
                }
                _ => {}
            },
            SeqDirection::Down => match self.seq.step {
                3 => {
                    self.seq.step = 2;
                    actions.seq_step_element_down(2);
                    timers.set(TimerId::Seq, self.seq_delay_ms, EventKind::SeqStepTimeout, EventArg::NONE);
                }
                2 => {
                    self.seq.step = 1;
                    actions.seq_step_element_down(1);
                    timers.set(TimerId::Seq, self.seq_delay_ms, EventKind::SeqStepTimeout, EventArg::NONE);
                }
                _ => {
                    evq.push(QueueId::Normal, EventKind::SeqDone, EventArg::NONE, tick);
                    self.seq.direction = SeqDirection::None;
                }
            },
            SeqDirection::None => {}
        }
    }
}
