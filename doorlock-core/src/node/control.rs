//! Control node runtime

use embedded_hal::delay::DelayNs;

use doorlock_hal::eeprom::ByteStore;
use doorlock_hal::timer::PeriodicTimer;
use doorlock_hal::uart::SerialLink;
use doorlock_protocol::Marker;

use super::{classify, rejected};
use crate::config::SystemConfig;
use crate::door::{DoorPhase, DoorSequencer};
use crate::error::{NodeError, ProtocolError};
use crate::link::{Link, Wait};
use crate::state::{
    ControlAction, ControlEvent, ControlInput, ControlState, CredentialPurpose, Patience,
};
use crate::store::CredentialStore;
use crate::traits::{Alarm, DoorMotor};

/// Peripherals owned by the Control node
pub struct ControlHardware<S, E, M, A, T, D> {
    /// UART to the Interface node
    pub serial: S,
    /// Credential EEPROM
    pub eeprom: E,
    /// Door motor
    pub motor: M,
    /// Lockout buzzer
    pub alarm: A,
    /// Door timer (its compare interrupt ticks the sequencer)
    pub timer: T,
    /// Blocking delay
    pub delay: D,
}

/// The commanding node: door motor, alarm and credential store
pub struct ControlNode<'a, S, E, M, A, T, D> {
    link: Link<S>,
    store: CredentialStore<E>,
    motor: M,
    alarm: A,
    timer: T,
    delay: D,
    sequencer: &'a DoorSequencer,
    config: SystemConfig,
    state: ControlState,
}

impl<'a, S, E, M, A, T, D> ControlNode<'a, S, E, M, A, T, D>
where
    S: SerialLink,
    E: ByteStore,
    M: DoorMotor,
    A: Alarm,
    T: PeriodicTimer,
    D: DelayNs,
{
    /// Create a node that has not booted yet
    ///
    /// `sequencer` must be the handler registered for the door timer
    /// interrupt.
    pub fn new(
        hw: ControlHardware<S, E, M, A, T, D>,
        sequencer: &'a DoorSequencer,
        config: SystemConfig,
    ) -> Self {
        Self {
            link: Link::new(hw.serial, config.link.poll_ms),
            store: CredentialStore::new(hw.eeprom, config.layout),
            motor: hw.motor,
            alarm: hw.alarm,
            timer: hw.timer,
            delay: hw.delay,
            sequencer,
            config,
            state: ControlState::AwaitInterfaceReady,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Door motor
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Lockout buzzer
    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    /// Door timer
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Credential store
    pub fn store(&mut self) -> &mut CredentialStore<E> {
        &mut self.store
    }

    /// Announce readiness and run until the menu is reached
    ///
    /// On a fresh device this includes provisioning and any lockout hold
    /// along the way. On error every output is stopped and the node is left
    /// ready to boot again.
    pub fn boot(&mut self) -> Result<(), NodeError> {
        info!("control node booting");
        self.state = ControlState::AwaitInterfaceReady;
        let result = self.announce_and_settle();
        if let Err(e) = result {
            error!("boot failed: {:?}", e);
            self.halt_outputs();
            self.state = ControlState::AwaitInterfaceReady;
        }
        result
    }

    fn announce_and_settle(&mut self) -> Result<(), NodeError> {
        self.link.send(Marker::ControlReady)?;
        self.step()?;
        while self.state != ControlState::Menu {
            self.step()?;
        }
        info!("control node ready");
        Ok(())
    }

    /// Wait for one command and carry it out
    ///
    /// Returns once the node is back at the menu. Ignored bytes count as a
    /// served command. On error the motor, alarm and door timer are stopped
    /// and the node returns to the menu.
    pub fn serve_one(&mut self) -> Result<(), NodeError> {
        if self.state != ControlState::Menu {
            return Err(NodeError::Protocol(ProtocolError::OutOfTurn {
                state: self.state.name(),
            }));
        }
        let result = self.run_to_menu();
        if let Err(e) = result {
            error!("operation aborted in {}: {:?}", self.state.name(), e);
            self.halt_outputs();
            self.state = ControlState::Menu;
        }
        result
    }

    fn run_to_menu(&mut self) -> Result<(), NodeError> {
        self.step()?;
        while self.state != ControlState::Menu {
            self.step()?;
        }
        Ok(())
    }

    /// Boot, then serve commands forever
    pub fn run(&mut self) -> ! {
        loop {
            let result = if self.state == ControlState::Menu {
                self.serve_one()
            } else {
                self.boot()
            };
            if let Err(e) = result {
                trace!("restarting after {:?}", e);
            }
        }
    }

    /// Gather the input for the current state and apply one transition
    pub fn step(&mut self) -> Result<(), NodeError> {
        let event = self.gather(self.state.input())?;
        let t = self.state.transition(event).map_err(rejected)?;
        if t.next != self.state {
            debug!("{} -> {}", self.state.name(), t.next.name());
        }
        self.state = t.next;
        if let Some(action) = t.action {
            self.perform(action)?;
        }
        Ok(())
    }

    fn exchange_wait(&self) -> Wait {
        Wait::bounded(self.config.link.exchange_ms)
    }

    fn gather(&mut self, input: ControlInput) -> Result<ControlEvent, NodeError> {
        let event = match input {
            ControlInput::Marker(patience) => {
                let wait = match patience {
                    Patience::Human => Wait::Forever,
                    Patience::Exchange => self.exchange_wait(),
                };
                classify(self.link.recv_byte(&mut self.delay, wait)?)
            }
            ControlInput::Credential => {
                let wait = self.exchange_wait();
                ControlEvent::Credential(self.link.recv_credential(&mut self.delay, wait)?)
            }
            ControlInput::ProvisionedFlag => {
                ControlEvent::Provisioned(self.store.is_provisioned()?)
            }
            ControlInput::Verify(candidate) => ControlEvent::Verified(self.store.verify(candidate)?),
            ControlInput::Phase(announced) => {
                self.wait_for_phase(announced)?;
                ControlEvent::PhaseDue
            }
            ControlInput::LockoutRelease => self.sound_until_release()?,
        };
        Ok(event)
    }

    /// Block until the sequencer moves past `announced`
    fn wait_for_phase(&mut self, announced: DoorPhase) -> Result<(), NodeError> {
        let limit = self.config.door.longest_phase_ms();
        let poll = self.config.link.poll_ms.max(1);
        let mut waited = 0u32;
        while self.sequencer.reached() <= announced {
            if waited > limit {
                return Err(NodeError::TimerStalled);
            }
            self.delay.delay_ms(poll);
            waited = waited.saturating_add(poll);
        }
        Ok(())
    }

    /// Play the alarm pattern until a byte arrives
    fn sound_until_release(&mut self) -> Result<ControlEvent, NodeError> {
        let pattern = self.config.alarm;
        let poll = self.config.link.poll_ms.max(1);
        loop {
            for step in pattern.steps() {
                if step.sounding {
                    self.alarm.on();
                } else {
                    self.alarm.off();
                }
                let mut remaining = step.duration_ms;
                loop {
                    if let Some(byte) = self.link.poll_byte()? {
                        return Ok(classify(byte));
                    }
                    if remaining == 0 {
                        break;
                    }
                    let slice = remaining.min(poll);
                    self.delay.delay_ms(slice);
                    remaining -= slice;
                }
            }
        }
    }

    fn perform(&mut self, action: ControlAction) -> Result<(), NodeError> {
        match action {
            ControlAction::Send(marker) => self.link.send(marker)?,
            ControlAction::Persist {
                credential,
                purpose: CredentialPurpose::Provision,
            } => {
                self.store.provision(credential)?;
                info!("credential provisioned");
            }
            ControlAction::Persist {
                credential,
                purpose: CredentialPurpose::Replace,
            } => {
                self.store.save(credential)?;
                info!("credential changed");
            }
            ControlAction::StartDoor => {
                info!("door operation started");
                self.sequencer.arm(&self.config.door);
                self.timer.start(self.config.door.timer_config());
            }
            ControlAction::Announce(phase) => {
                if let Some(marker) = phase.marker() {
                    self.link.send(marker)?;
                }
                self.motor.drive(phase.motor_command())?;
                debug!("door {:?} at {}s", phase, self.sequencer.elapsed_s());
            }
            ControlAction::FinishDoor => {
                self.link.send(Marker::OperationSuccess)?;
                self.motor.stop()?;
                self.timer.stop();
                self.sequencer.disarm();
                info!("door operation complete");
            }
            ControlAction::SoundAlarm => {
                warn!("too many wrong passwords, sounding alarm");
                self.alarm.on();
            }
            ControlAction::SilenceAlarm => {
                self.alarm.off();
                info!("lockout released");
            }
            ControlAction::Ignore(byte) => {
                warn!("ignoring byte {} in {}", byte, self.state.name());
            }
        }
        Ok(())
    }

    /// Stop the door timer, and the motor and alarm if the failed state
    /// could have left them running
    fn halt_outputs(&mut self) {
        if self.state.drives_outputs() {
            if let Err(e) = self.motor.stop() {
                error!("motor stop failed: {:?}", e);
            }
            self.alarm.off();
        }
        self.timer.stop();
        self.sequencer.disarm();
    }

    /// Release the peripherals
    pub fn release(self) -> ControlHardware<S, E, M, A, T, D> {
        ControlHardware {
            serial: self.link.release(),
            eeprom: self.store.release(),
            motor: self.motor,
            alarm: self.alarm,
            timer: self.timer,
            delay: self.delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkTimeouts;
    use crate::error::LinkError;
    use crate::link::tests::{CountingDelay, ScriptedSerial};
    use crate::traits::{MotorCommand, MotorError};
    use doorlock_hal::eeprom::RamStore;
    use doorlock_hal::interrupt::InterruptHandler;
    use doorlock_hal::timer::TimerConfig;
    use doorlock_protocol::Credential;
    use heapless::Vec;

    type Eeprom = RamStore<1024>;

    /// Motor that records each command with the sequencer's elapsed time
    struct MockMotor<'a> {
        current: MotorCommand,
        log: Vec<(MotorCommand, u16), 8>,
        seq: &'a DoorSequencer,
    }

    impl<'a> MockMotor<'a> {
        fn new(seq: &'a DoorSequencer) -> Self {
            Self {
                current: MotorCommand::STOP,
                log: Vec::new(),
                seq,
            }
        }
    }

    impl DoorMotor for MockMotor<'_> {
        fn drive(&mut self, command: MotorCommand) -> Result<(), MotorError> {
            self.current = command;
            self.log.push((command, self.seq.elapsed_s())).unwrap();
            Ok(())
        }

        fn current(&self) -> MotorCommand {
            self.current
        }
    }

    #[derive(Default)]
    struct MockAlarm {
        on: bool,
        activations: u32,
    }

    impl Alarm for MockAlarm {
        fn on(&mut self) {
            if !self.on {
                self.activations += 1;
            }
            self.on = true;
        }

        fn off(&mut self) {
            self.on = false;
        }

        fn is_on(&self) -> bool {
            self.on
        }
    }

    #[derive(Default)]
    struct MockTimer {
        config: Option<TimerConfig>,
    }

    impl PeriodicTimer for MockTimer {
        fn start(&mut self, config: TimerConfig) {
            self.config = Some(config);
        }

        fn stop(&mut self) {
            self.config = None;
        }

        fn is_running(&self) -> bool {
            self.config.is_some()
        }
    }

    /// Delay that ticks the sequencer every `period_ms`
    struct TickingDelay<'a> {
        now_ms: u32,
        next_ms: u32,
        period_ms: u32,
        seq: &'a DoorSequencer,
    }

    impl DelayNs for TickingDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.delay_us(ns / 1000);
        }

        fn delay_us(&mut self, us: u32) {
            self.delay_ms(us / 1000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.now_ms += ms;
            while self.now_ms >= self.next_ms {
                self.seq.on_interrupt();
                self.next_ms += self.period_ms;
            }
        }
    }

    fn provisioned(value: u32) -> Eeprom {
        let mut store = CredentialStore::new(Eeprom::new(), Default::default());
        store.provision(Credential::new(value).unwrap()).unwrap();
        store.release()
    }

    fn node<'a, D: DelayNs>(
        rx: &[u8],
        eeprom: Eeprom,
        seq: &'a DoorSequencer,
        delay: D,
        config: SystemConfig,
    ) -> ControlNode<'a, ScriptedSerial, Eeprom, MockMotor<'a>, MockAlarm, MockTimer, D> {
        ControlNode::new(
            ControlHardware {
                serial: ScriptedSerial::with_rx(rx),
                eeprom,
                motor: MockMotor::new(seq),
                alarm: MockAlarm::default(),
                timer: MockTimer::default(),
                delay,
            },
            seq,
            config,
        )
    }

    fn at_menu<'a, D: DelayNs>(
        rx: &[u8],
        eeprom: Eeprom,
        seq: &'a DoorSequencer,
        delay: D,
    ) -> ControlNode<'a, ScriptedSerial, Eeprom, MockMotor<'a>, MockAlarm, MockTimer, D> {
        let mut rx_with_boot: Vec<u8, 64> = Vec::new();
        rx_with_boot.push(Marker::InterfaceReady.to_byte()).unwrap();
        rx_with_boot.extend_from_slice(rx).unwrap();
        let mut node = node(&rx_with_boot, eeprom, seq, delay, SystemConfig::default());
        node.boot().unwrap();
        node
    }

    fn sent<D: DelayNs>(
        node: ControlNode<'_, ScriptedSerial, Eeprom, MockMotor<'_>, MockAlarm, MockTimer, D>,
    ) -> Vec<u8, 64> {
        node.release().serial.tx
    }

    #[test]
    fn test_boot_first_time_provisions() {
        let seq = DoorSequencer::new();
        let rx = [0x00, 0xFF, 0xF2, 0x39, 0x30, 0x00, 0x00];
        let mut node = node(&rx, Eeprom::new(), &seq, CountingDelay::default(), SystemConfig::default());
        node.boot().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
        assert_eq!(node.store().load().unwrap().value(), 12345);
        assert_eq!(node.store().is_provisioned(), Ok(true));
        assert_eq!(sent(node).as_slice(), &[0xF1, 0xF3]);
    }

    #[test]
    fn test_boot_returning() {
        let seq = DoorSequencer::new();
        let node = at_menu(&[], provisioned(54321), &seq, CountingDelay::default());
        assert_eq!(node.state(), ControlState::Menu);
        assert_eq!(sent(node).as_slice(), &[0xF1, 0xF4]);
    }

    #[test]
    fn test_boot_reports_lost_link() {
        let seq = DoorSequencer::new();
        let mut config = SystemConfig::default();
        config.link.exchange_ms = Some(10);
        let mut node = node(&[], Eeprom::new(), &seq, CountingDelay::default(), config);
        node.link.serial_mut().fail = true;
        assert_eq!(node.boot(), Err(NodeError::Link(LinkError::Serial)));
        assert_eq!(node.state(), ControlState::AwaitInterfaceReady);
    }

    #[test]
    fn test_door_cycle_timeline() {
        let seq = DoorSequencer::new();
        let delay = TickingDelay {
            now_ms: 0,
            next_ms: 3000,
            period_ms: 3000,
            seq: &seq,
        };
        let mut node = at_menu(&[b'+', 0xFF], provisioned(12345), &seq, delay);
        node.serve_one().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
        assert!(!node.timer().is_running());
        assert!(!seq.is_armed());

        let hw = node.release();
        assert_eq!(
            hw.motor.log.as_slice(),
            &[
                (MotorCommand::clockwise(100), 0),
                (MotorCommand::STOP, 15),
                (MotorCommand::anticlockwise(100), 18),
                (MotorCommand::STOP, 33),
            ]
        );
        assert_eq!(hw.serial.tx.as_slice(), &[0xF1, 0xF4, 0xFB, 0xFC, 0xFD, 0xF2]);
        assert_eq!(hw.delay.now_ms, 33_000);
    }

    #[test]
    fn test_door_timer_stall() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[b'+', 0xFF], provisioned(12345), &seq, CountingDelay::default());
        assert_eq!(node.serve_one(), Err(NodeError::TimerStalled));
        assert_eq!(node.state(), ControlState::Menu);
        assert_eq!(node.motor().current(), MotorCommand::STOP);
        assert!(!node.timer().is_running());
        assert!(!seq.is_armed());
    }

    #[test]
    fn test_door_ready_timeout() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[b'+'], provisioned(12345), &seq, CountingDelay::default());
        assert_eq!(node.serve_one(), Err(NodeError::Link(LinkError::Timeout)));
        assert_eq!(node.state(), ControlState::Menu);
        assert!(!node.timer().is_running());
        assert!(!seq.is_armed());
    }

    #[test]
    fn test_change_password() {
        let seq = DoorSequencer::new();
        let rx = [b'-', 0xF5, 0x31, 0xD4, 0x00, 0x00, 0xF2, 0x67, 0x2B, 0x00, 0x00];
        let mut node = at_menu(&rx, provisioned(54321), &seq, CountingDelay::default());
        node.serve_one().unwrap();
        assert_eq!(node.store().load().unwrap().value(), 11111);
        assert_eq!(sent(node).as_slice(), &[0xF1, 0xF4, 0xF5, 0xF2]);
    }

    #[test]
    fn test_change_password_abandoned() {
        let seq = DoorSequencer::new();
        let rx = [b'-', 0xF5, 0x31, 0xD4, 0x00, 0x00, 0x2F];
        let mut node = at_menu(&rx, provisioned(54321), &seq, CountingDelay::default());
        node.serve_one().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
        assert_eq!(node.store().load().unwrap().value(), 54321);
    }

    #[test]
    fn test_wrong_password_retry() {
        let seq = DoorSequencer::new();
        let rx = [
            b'-', 0xF5, 0x67, 0x2B, 0x00, 0x00, 0xF2, // wrong, retry
            0xF5, 0x31, 0xD4, 0x00, 0x00, 0x2F, // right, abandon
        ];
        let mut node = at_menu(&rx, provisioned(54321), &seq, CountingDelay::default());
        node.serve_one().unwrap();
        assert_eq!(sent(node).as_slice(), &[0xF1, 0xF4, 0xF5, 0x2F, 0xF5, 0xF2]);
    }

    #[test]
    fn test_wrong_password_lockout() {
        let seq = DoorSequencer::new();
        let rx = [b'-', 0xF5, 0x67, 0x2B, 0x00, 0x00, 0xF6, 0xF2];
        let mut node = at_menu(&rx, provisioned(54321), &seq, CountingDelay::default());
        node.serve_one().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
        assert!(!node.alarm().is_on());
        assert!(node.alarm().activations >= 1);
        assert_eq!(node.store().load().unwrap().value(), 54321);
    }

    #[test]
    fn test_link_failure_during_lockout() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(
            &[b'-', 0xF5, 0x67, 0x2B, 0x00, 0x00, 0xF6],
            provisioned(54321),
            &seq,
            CountingDelay::default(),
        );
        // Run up to the lockout, then break the link under the alarm
        for _ in 0..5 {
            node.step().unwrap();
        }
        assert!(matches!(node.state(), ControlState::Lockout(_)));
        node.link.serial_mut().fail = true;
        assert_eq!(node.step(), Err(NodeError::Link(LinkError::Serial)));
        assert!(node.alarm().is_on());
    }

    #[test]
    fn test_idle_link_failure_leaves_outputs_alone() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[], provisioned(54321), &seq, CountingDelay::default());
        node.link.serial_mut().fail = true;
        assert_eq!(node.serve_one(), Err(NodeError::Link(LinkError::Serial)));
        assert_eq!(node.state(), ControlState::Menu);
        assert!(!node.timer().is_running());

        let hw = node.release();
        assert!(hw.motor.log.is_empty());
        assert_eq!(hw.alarm.activations, 0);
    }

    #[test]
    fn test_door_failure_stops_motor() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[b'+', 0xFF], provisioned(12345), &seq, CountingDelay::default());
        assert_eq!(node.serve_one(), Err(NodeError::TimerStalled));
        let hw = node.release();
        assert_eq!(
            hw.motor.log.as_slice(),
            &[(MotorCommand::clockwise(100), 0), (MotorCommand::STOP, 0)]
        );
    }

    #[test]
    fn test_out_of_turn_marker_returns_to_menu() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[b'-', 0xFB], provisioned(54321), &seq, CountingDelay::default());
        assert_eq!(
            node.serve_one(),
            Err(NodeError::Link(LinkError::Desync(ProtocolError::Unexpected {
                state: "AwaitChangeRequest",
                marker: Marker::DoorOpening,
            })))
        );
        assert_eq!(node.state(), ControlState::Menu);
    }

    #[test]
    fn test_menu_ignores_garbage() {
        let seq = DoorSequencer::new();
        let mut node = at_menu(&[0x42], provisioned(54321), &seq, CountingDelay::default());
        node.serve_one().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
        assert_eq!(sent(node).as_slice(), &[0xF1, 0xF4]);
    }

    #[test]
    fn test_unbounded_links_still_serve() {
        let seq = DoorSequencer::new();
        let config = SystemConfig {
            link: LinkTimeouts::UNBOUNDED,
            ..Default::default()
        };
        let rx = [0xFF, b'-', 0xF5, 0x31, 0xD4, 0x00, 0x00, 0x2F];
        let mut node = node(&rx, provisioned(54321), &seq, CountingDelay::default(), config);
        node.boot().unwrap();
        node.serve_one().unwrap();
        assert_eq!(node.state(), ControlState::Menu);
    }
}
