//! Host-side simulation harness for the Doorlock nodes
//!
//! Runs a Control node and an Interface node on two threads, wired together
//! by an in-memory serial link. Each node gets its own virtual clock: delays
//! advance it instantly and fire the timer interrupt handler registered on
//! it, so a 60 s lockout hold finishes in milliseconds of wall time.
//!
//! # Example
//!
//! ```rust,ignore
//! use doorlock_harness::{Scenario, Step};
//!
//! let run = Scenario::new()
//!     .keys("1234512345")
//!     .step(Step::Boot)
//!     .run();
//! assert_eq!(run.control.eeprom.cells()[0x0200], 1);
//! ```
//!
//! Link timeouts are disabled by default. The two clocks are not in
//! lockstep, so a bounded receive on one node could expire while the other
//! is still busy in wall-clock terms.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod logger;
mod peripherals;
mod scenario;
mod serial;

pub use clock::{SimClock, SimDelay, SimTimer};
pub use logger::init_logging;
pub use peripherals::{RecordingAlarm, RecordingDisplay, RecordingMotor, ScriptedKeypad};
pub use scenario::{
    ControlReport, InterfaceOutcome, InterfaceReport, Run, Scenario, Step, EEPROM_SIZE,
};
pub use serial::{serial_pair, ChannelSerial, SerialClosed};
