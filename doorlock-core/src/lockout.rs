//! Wrong-attempt counting and the lockout alarm
//!
//! Both nodes enter the lockout hold together: the Interface node counts
//! failures and announces `MaxWrongPassword`, the Control node sounds the
//! alarm until the Interface node releases it.

use crate::config::AlarmPattern;

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttemptOutcome {
    /// Below the threshold; `remaining` more failures are tolerated
    Retry { remaining: u8 },
    /// Threshold reached; the counter has been reset
    Exhausted,
}

/// Consecutive failure counter
///
/// Counts failures since the last success (or since creation). Reaching the
/// threshold reports [`AttemptOutcome::Exhausted`] exactly once and starts
/// counting again from zero.
#[derive(Debug, Clone)]
pub struct AttemptCounter {
    failures: u8,
    threshold: u8,
}

impl AttemptCounter {
    /// Create a counter that exhausts after `threshold` failures
    ///
    /// A zero threshold behaves like one.
    pub fn new(threshold: u8) -> Self {
        Self {
            failures: 0,
            threshold: threshold.max(1),
        }
    }

    /// Record a failed attempt
    pub fn record_failure(&mut self) -> AttemptOutcome {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.threshold {
            self.failures = 0;
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::Retry {
                remaining: self.threshold - self.failures,
            }
        }
    }

    /// Record a successful attempt, clearing the count
    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    /// Failures since the last success or exhaustion
    pub fn failures(&self) -> u8 {
        self.failures
    }
}

/// One step of the alarm pattern: buzzer state and how long to hold it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmStep {
    /// Buzzer sounding during this step
    pub sounding: bool,
    /// Step length in milliseconds
    pub duration_ms: u32,
}

impl AlarmPattern {
    /// Steps of one pattern cycle: each beep as on/off, then the pause
    pub fn steps(&self) -> impl Iterator<Item = AlarmStep> + '_ {
        let beeps = (0..self.beeps).flat_map(move |_| {
            [
                AlarmStep {
                    sounding: true,
                    duration_ms: self.on_ms,
                },
                AlarmStep {
                    sounding: false,
                    duration_ms: self.off_ms,
                },
            ]
        });
        beeps.chain(core::iter::once(AlarmStep {
            sounding: false,
            duration_ms: self.pause_ms,
        }))
    }

    /// Length of one pattern cycle in milliseconds
    pub fn cycle_ms(&self) -> u32 {
        self.steps().map(|s| s.duration_ms).sum()
    }
}
