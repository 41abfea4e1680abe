//! Two-node scenario runner

use std::panic::resume_unwind;
use std::thread;

use doorlock_core::config::{LinkTimeouts, SystemConfig};
use doorlock_core::door::DoorSequencer;
use doorlock_core::error::{LinkError, NodeError};
use doorlock_core::node::{
    BootKind, ControlHardware, ControlNode, InterfaceHardware, InterfaceNode, MenuOutcome,
};
use doorlock_core::state::ControlState;
use doorlock_core::store::CredentialStore;
use doorlock_core::traits::MotorCommand;
use doorlock_hal::eeprom::{RamStore, StoreError};
use doorlock_hal::timer::TickCounter;
use doorlock_protocol::Credential;

use crate::clock::{SimClock, SimDelay, SimTimer};
use crate::logger::set_node;
use crate::peripherals::{RecordingAlarm, RecordingDisplay, RecordingMotor, ScriptedKeypad};
use crate::serial::{serial_pair, ChannelSerial};

/// Size of the simulated credential EEPROM (an AT24C16)
pub const EEPROM_SIZE: usize = 2048;

/// One Interface node operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the boot handshake (and provisioning on a fresh device)
    Boot,
    /// Run one pass through the menu
    Menu,
}

/// What an Interface step returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceOutcome {
    /// Boot finished
    Booted(BootKind),
    /// A menu pass finished
    Menu(MenuOutcome),
}

/// Control node state after a run
#[derive(Debug)]
pub struct ControlReport {
    /// Failed operations, not counting the link closing at the end
    pub errors: Vec<NodeError>,
    /// State the node stopped in
    pub state: ControlState,
    /// EEPROM contents
    pub eeprom: RamStore<EEPROM_SIZE>,
    /// Motor commands as `(ms, command)`
    pub motor: Vec<(u64, MotorCommand)>,
    /// Buzzer changes as `(ms, sounding)`
    pub alarm: Vec<(u64, bool)>,
    /// Bytes sent to the Interface node
    pub sent: Vec<u8>,
    /// Virtual time spent
    pub elapsed_ms: u64,
}

/// Interface node state after a run
#[derive(Debug)]
pub struct InterfaceReport {
    /// Result of each completed step, in order
    pub outcomes: Vec<InterfaceOutcome>,
    /// Error that ended the run early
    pub error: Option<NodeError>,
    /// Every distinct screen shown
    pub screens: Vec<String>,
    /// Bytes sent to the Control node
    pub sent: Vec<u8>,
    /// Key presses left unused
    pub keys_left: usize,
    /// Virtual time spent
    pub elapsed_ms: u64,
}

impl InterfaceReport {
    /// Check whether any screen showed `needle`
    pub fn showed(&self, needle: &str) -> bool {
        self.screens.iter().any(|s| s.contains(needle))
    }
}

/// Reports from both nodes
#[derive(Debug)]
pub struct Run {
    /// Control node
    pub control: ControlReport,
    /// Interface node
    pub interface: InterfaceReport,
}

/// A scripted session between the two nodes
///
/// The Control node boots and then serves commands until the Interface
/// node has finished its steps and hung up the link.
pub struct Scenario {
    config: SystemConfig,
    eeprom: RamStore<EEPROM_SIZE>,
    keys: String,
    steps: Vec<Step>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Fresh device, default configuration, no receive timeouts
    pub fn new() -> Self {
        Self {
            config: SystemConfig {
                link: LinkTimeouts::UNBOUNDED,
                ..SystemConfig::default()
            },
            eeprom: RamStore::new(),
            keys: String::new(),
            steps: Vec::new(),
        }
    }

    /// Use `config` for both nodes
    pub fn config(mut self, config: SystemConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from existing EEPROM contents
    pub fn eeprom(mut self, eeprom: RamStore<EEPROM_SIZE>) -> Self {
        self.eeprom = eeprom;
        self
    }

    /// Start with `password` already provisioned
    pub fn provisioned(mut self, password: u32) -> Result<Self, StoreError> {
        let credential = Credential::new(password).map_err(|_| StoreError::OutOfRange)?;
        CredentialStore::new(&mut self.eeprom, self.config.layout).provision(credential)?;
        Ok(self)
    }

    /// Append key presses, written as the characters printed on the keys
    pub fn keys(mut self, keys: &str) -> Self {
        self.keys.push_str(keys);
        self
    }

    /// Append an Interface node step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Run both nodes to completion
    ///
    /// A panic on either node thread is re-raised here.
    pub fn run(self) -> Run {
        crate::logger::init_logging();
        let (control_serial, interface_serial) = serial_pair();
        let Scenario {
            config,
            eeprom,
            keys,
            steps,
        } = self;

        thread::scope(|s| {
            let control = s.spawn(move || run_control(control_serial, eeprom, config));
            let interface =
                s.spawn(move || run_interface(interface_serial, &keys, &steps, config));
            let interface = interface.join().unwrap_or_else(|e| resume_unwind(e));
            let control = control.join().unwrap_or_else(|e| resume_unwind(e));
            Run { control, interface }
        })
    }
}

fn run_control(
    serial: ChannelSerial,
    eeprom: RamStore<EEPROM_SIZE>,
    config: SystemConfig,
) -> ControlReport {
    set_node("control");
    let sequencer = DoorSequencer::new();
    let clock = SimClock::new();
    clock.attach(&sequencer);

    let hw = ControlHardware {
        serial,
        eeprom,
        motor: RecordingMotor::new(&clock),
        alarm: RecordingAlarm::new(&clock),
        timer: SimTimer::new(&clock),
        delay: SimDelay::new(&clock),
    };
    let mut node = ControlNode::new(hw, &sequencer, config);

    let mut errors = Vec::new();
    loop {
        let result = if node.state() == ControlState::Menu {
            node.serve_one()
        } else {
            node.boot()
        };
        match result {
            Ok(()) => {}
            Err(NodeError::Link(LinkError::Serial)) => break,
            Err(e) => errors.push(e),
        }
    }

    let state = node.state();
    let hw = node.release();
    ControlReport {
        errors,
        state,
        eeprom: hw.eeprom,
        motor: hw.motor.into_log(),
        alarm: hw.alarm.into_log(),
        sent: hw.serial.into_sent(),
        elapsed_ms: clock.now_ms(),
    }
}

fn run_interface(
    serial: ChannelSerial,
    keys: &str,
    steps: &[Step],
    config: SystemConfig,
) -> InterfaceReport {
    set_node("interface");
    let ticks = TickCounter::new();
    let clock = SimClock::new();
    clock.attach(&ticks);

    let hw = InterfaceHardware {
        serial,
        keypad: ScriptedKeypad::new(keys),
        display: RecordingDisplay::new(),
        timer: SimTimer::new(&clock),
        delay: SimDelay::new(&clock),
    };
    let mut node = InterfaceNode::new(hw, &ticks, config);

    let mut outcomes = Vec::new();
    let mut error = None;
    for step in steps {
        let result = match step {
            Step::Boot => node.boot().map(InterfaceOutcome::Booted),
            Step::Menu => node.menu_once().map(InterfaceOutcome::Menu),
        };
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    let hw = node.release();
    InterfaceReport {
        outcomes,
        error,
        screens: hw.display.into_history(),
        sent: hw.serial.into_sent(),
        keys_left: hw.keypad.remaining(),
        elapsed_ms: clock.now_ms(),
    }
}
