//! Door phase sequencing
//!
//! The door timer interrupt advances a [`DoorSequencer`]; the Control node
//! main loop reads how far the sequence has got and announces each phase in
//! order. The sequencer only ever moves forward, so a slow main loop sees a
//! later phase but never an earlier one.

use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use doorlock_hal::interrupt::InterruptHandler;
use doorlock_protocol::Marker;

use crate::config::DoorTiming;
use crate::traits::MotorCommand;

/// Door sequence phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DoorPhase {
    /// No sequence running
    Idle = 0,
    /// Motor turning to open the door
    Opening = 1,
    /// Door held open
    Waiting = 2,
    /// Motor turning to close the door
    Closing = 3,
    /// Sequence finished
    Complete = 4,
}

impl DoorPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DoorPhase::Opening,
            2 => DoorPhase::Waiting,
            3 => DoorPhase::Closing,
            4 => DoorPhase::Complete,
            _ => DoorPhase::Idle,
        }
    }

    /// The phase that follows this one
    pub fn next(self) -> Option<Self> {
        match self {
            DoorPhase::Idle => Some(DoorPhase::Opening),
            DoorPhase::Opening => Some(DoorPhase::Waiting),
            DoorPhase::Waiting => Some(DoorPhase::Closing),
            DoorPhase::Closing => Some(DoorPhase::Complete),
            DoorPhase::Complete => None,
        }
    }

    /// Phase announced by a door marker
    pub fn from_marker(marker: Marker) -> Option<Self> {
        match marker {
            Marker::DoorOpening => Some(DoorPhase::Opening),
            Marker::DoorWaiting => Some(DoorPhase::Waiting),
            Marker::DoorClosing => Some(DoorPhase::Closing),
            _ => None,
        }
    }

    /// Marker announcing this phase
    ///
    /// `Complete` is announced with `OperationSuccess`.
    pub fn marker(self) -> Option<Marker> {
        match self {
            DoorPhase::Opening => Some(Marker::DoorOpening),
            DoorPhase::Waiting => Some(Marker::DoorWaiting),
            DoorPhase::Closing => Some(Marker::DoorClosing),
            DoorPhase::Complete => Some(Marker::OperationSuccess),
            DoorPhase::Idle => None,
        }
    }

    /// Motor command for this phase
    pub fn motor_command(self) -> MotorCommand {
        match self {
            DoorPhase::Opening => MotorCommand::clockwise(100),
            DoorPhase::Closing => MotorCommand::anticlockwise(100),
            _ => MotorCommand::STOP,
        }
    }

    /// Phase for an elapsed time under the given timing
    pub fn at(elapsed_s: u16, timing: &DoorTiming) -> Self {
        if elapsed_s >= timing.complete_at() {
            DoorPhase::Complete
        } else if elapsed_s >= timing.closing_at() {
            DoorPhase::Closing
        } else if elapsed_s >= timing.waiting_at() {
            DoorPhase::Waiting
        } else {
            DoorPhase::Opening
        }
    }
}

/// Timer-driven door phase tracker
///
/// Shared between the door timer interrupt and the main loop. All fields
/// are atomics so the handler never needs a critical section.
pub struct DoorSequencer {
    armed: AtomicBool,
    elapsed_s: AtomicU16,
    reached: AtomicU8,
    tick_s: AtomicU8,
    waiting_at: AtomicU16,
    closing_at: AtomicU16,
    complete_at: AtomicU16,
}

impl Default for DoorSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl DoorSequencer {
    /// Create an idle sequencer
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            elapsed_s: AtomicU16::new(0),
            reached: AtomicU8::new(DoorPhase::Idle as u8),
            tick_s: AtomicU8::new(0),
            waiting_at: AtomicU16::new(0),
            closing_at: AtomicU16::new(0),
            complete_at: AtomicU16::new(0),
        }
    }

    /// Start a new sequence at `Opening` with zero elapsed time
    pub fn arm(&self, timing: &DoorTiming) {
        self.armed.store(false, Ordering::Release);
        self.tick_s.store(timing.tick_s, Ordering::Relaxed);
        self.waiting_at.store(timing.waiting_at(), Ordering::Relaxed);
        self.closing_at.store(timing.closing_at(), Ordering::Relaxed);
        self.complete_at.store(timing.complete_at(), Ordering::Relaxed);
        self.elapsed_s.store(0, Ordering::Relaxed);
        self.reached.store(DoorPhase::Opening as u8, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
    }

    /// Stop reacting to ticks and return to `Idle`
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
        self.reached.store(DoorPhase::Idle as u8, Ordering::Release);
    }

    /// Furthest phase reached since the last arm
    pub fn reached(&self) -> DoorPhase {
        DoorPhase::from_u8(self.reached.load(Ordering::Acquire))
    }

    /// Seconds accumulated since the last arm
    pub fn elapsed_s(&self) -> u16 {
        self.elapsed_s.load(Ordering::Acquire)
    }

    /// Check whether a sequence is running
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    fn phase_at(&self, elapsed_s: u16) -> DoorPhase {
        if elapsed_s >= self.complete_at.load(Ordering::Relaxed) {
            DoorPhase::Complete
        } else if elapsed_s >= self.closing_at.load(Ordering::Relaxed) {
            DoorPhase::Closing
        } else if elapsed_s >= self.waiting_at.load(Ordering::Relaxed) {
            DoorPhase::Waiting
        } else {
            DoorPhase::Opening
        }
    }
}

impl InterruptHandler for DoorSequencer {
    fn on_interrupt(&self) {
        if !self.armed.load(Ordering::Acquire) {
            return;
        }
        let step = self.tick_s.load(Ordering::Relaxed) as u16;
        let elapsed = self.elapsed_s.load(Ordering::Relaxed).saturating_add(step);
        self.elapsed_s.store(elapsed, Ordering::Release);

        let phase = self.phase_at(elapsed);
        self.reached.fetch_max(phase as u8, Ordering::AcqRel);
        if phase == DoorPhase::Complete {
            self.armed.store(false, Ordering::Release);
        }
    }
}
