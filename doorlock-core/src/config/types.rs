//! Configuration type definitions

use doorlock_hal::timer::TimerConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Door opening sequence timing
///
/// The door opens for `open_s`, holds for `wait_s`, then closes for another
/// `open_s`. Elapsed time advances by `tick_s` per door timer interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoorTiming {
    /// Opening (and closing) duration in seconds
    pub open_s: u16,
    /// Hold-open duration in seconds
    pub wait_s: u16,
    /// Seconds added per timer tick
    pub tick_s: u8,
}

impl Default for DoorTiming {
    fn default() -> Self {
        Self {
            open_s: 15,
            wait_s: 3,
            tick_s: 3,
        }
    }
}

impl DoorTiming {
    /// Elapsed seconds at which the door stops and waits
    pub fn waiting_at(&self) -> u16 {
        self.open_s
    }

    /// Elapsed seconds at which the door starts closing
    pub fn closing_at(&self) -> u16 {
        self.open_s.saturating_add(self.wait_s)
    }

    /// Elapsed seconds at which the sequence is complete
    pub fn complete_at(&self) -> u16 {
        self.closing_at().saturating_add(self.open_s)
    }

    /// Door timer period
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::every_ms(self.tick_s as u32 * 1000)
    }

    /// Longest gap between two consecutive phase changes, in milliseconds
    ///
    /// A phase that has not arrived within this bound plus one tick means
    /// the timer stopped firing.
    pub fn longest_phase_ms(&self) -> u32 {
        let longest = self.open_s.max(self.wait_s) as u32;
        (longest + self.tick_s as u32) * 1000
    }
}

/// Wrong-attempt limits and the lockout hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockoutPolicy {
    /// Consecutive wrong passwords (or mismatched provisioning entries)
    /// that trigger the lockout hold
    pub max_attempts: u8,
    /// Mismatched new-password confirmations before a change is abandoned
    pub max_mismatches: u8,
    /// Lockout hold duration in seconds
    pub hold_s: u16,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_mismatches: 5,
            hold_s: 60,
        }
    }
}

impl LockoutPolicy {
    /// Countdown timer used during the hold
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::every_ms(1000)
    }
}

/// Alarm sound pattern repeated during the lockout hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlarmPattern {
    /// Beeps per cycle
    pub beeps: u8,
    /// Beep length in milliseconds
    pub on_ms: u32,
    /// Silence between beeps in milliseconds
    pub off_ms: u32,
    /// Silence after the last beep in milliseconds
    pub pause_ms: u32,
}

impl Default for AlarmPattern {
    fn default() -> Self {
        Self {
            beeps: 3,
            on_ms: 100,
            off_ms: 100,
            pause_ms: 1000,
        }
    }
}

/// EEPROM addresses of the persisted credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CredentialLayout {
    /// First of four credential bytes (LSB first)
    pub credential_addr: u16,
    /// Provisioned flag byte
    pub flag_addr: u16,
    /// Flag value marking a provisioned device
    pub provisioned: u8,
}

impl Default for CredentialLayout {
    fn default() -> Self {
        Self {
            credential_addr: 0x0300,
            flag_addr: 0x0200,
            provisioned: 1,
        }
    }
}

/// Receive timeouts
///
/// Only receives whose answer does not depend on a person use
/// `exchange_ms`; menu commands, password entry and the lockout release
/// always wait indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkTimeouts {
    /// Bound for replies inside an exchange; `None` waits forever
    pub exchange_ms: Option<u32>,
    /// Sleep between receive polls
    pub poll_ms: u32,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        Self {
            exchange_ms: Some(2000),
            poll_ms: 1,
        }
    }
}

impl LinkTimeouts {
    /// Never time out
    pub const UNBOUNDED: Self = Self {
        exchange_ms: None,
        poll_ms: 1,
    };
}

/// Interface node screen timing and password entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UiTiming {
    /// How long a status message stays up
    pub message_ms: u32,
    /// Settle time after a key press
    pub key_press_ms: u32,
    /// How long an entered digit is shown before it is masked
    pub digit_reveal_ms: u32,
    /// Redraw interval for countdown and progress screens
    pub refresh_ms: u32,
    /// Digits per password
    pub password_len: u8,
}

impl Default for UiTiming {
    fn default() -> Self {
        Self {
            message_ms: 800,
            key_press_ms: 350,
            digit_reveal_ms: 300,
            refresh_ms: 100,
            password_len: 5,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    /// Door sequence timing
    pub door: DoorTiming,
    /// Attempt limits and lockout hold
    pub lockout: LockoutPolicy,
    /// Alarm pattern during lockout
    pub alarm: AlarmPattern,
    /// Credential EEPROM layout
    pub layout: CredentialLayout,
    /// Receive timeouts
    pub link: LinkTimeouts,
    /// Interface screen timing
    pub ui: UiTiming,
}
