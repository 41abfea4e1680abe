//! Interface node runtime
//!
//! Drives the LCD and keypad, and leads every exchange with the Control
//! node. Screens follow the reference firmware's wording.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::String;

use doorlock_display::{DisplayExt, TextDisplay};
use doorlock_hal::timer::{PeriodicTimer, TickCounter};
use doorlock_hal::uart::SerialLink;
use doorlock_protocol::{Credential, Marker};

use super::rejected;
use crate::config::SystemConfig;
use crate::door::DoorPhase;
use crate::entry::{EntryUpdate, PasswordEntry};
use crate::error::{LinkError, NodeError, ProtocolError};
use crate::link::{Link, Wait};
use crate::lockout::{AttemptCounter, AttemptOutcome};
use crate::state::{InterfaceSignal, InterfaceState};
use crate::traits::{Key, Keypad};

/// Peripherals owned by the Interface node
pub struct InterfaceHardware<S, K, L, T, D> {
    /// UART to the Control node
    pub serial: S,
    /// 4x4 key matrix
    pub keypad: K,
    /// 16x2 character LCD
    pub display: L,
    /// Progress and countdown timer (its compare interrupt ticks the counter)
    pub timer: T,
    /// Blocking delay
    pub delay: D,
}

/// How the Control node reported itself at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootKind {
    /// Fresh device; a password was provisioned
    FirstTime,
    /// A password was already stored
    Returning,
}

/// Result of one pass through the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuOutcome {
    /// The door opened, waited and closed
    DoorCycled,
    /// A new password was stored
    PasswordChanged,
    /// The new password was never confirmed
    ChangeAbandoned,
    /// Too many wrong passwords; the lockout hold ran
    LockedOut,
    /// The key was not a menu option
    Invalid,
}

/// The requesting node: LCD and keypad
pub struct InterfaceNode<'a, S, K, L, T, D> {
    link: Link<S>,
    keypad: K,
    display: L,
    timer: T,
    delay: D,
    ticks: &'a TickCounter,
    config: SystemConfig,
    state: InterfaceState,
    wrong_attempts: AttemptCounter,
}

impl<'a, S, K, L, T, D> InterfaceNode<'a, S, K, L, T, D>
where
    S: SerialLink,
    K: Keypad,
    L: TextDisplay,
    T: PeriodicTimer,
    D: DelayNs,
{
    /// Create a node that has not booted yet
    ///
    /// `ticks` must be the handler registered for the timer interrupt.
    pub fn new(
        hw: InterfaceHardware<S, K, L, T, D>,
        ticks: &'a TickCounter,
        config: SystemConfig,
    ) -> Self {
        Self {
            link: Link::new(hw.serial, config.link.poll_ms),
            keypad: hw.keypad,
            display: hw.display,
            timer: hw.timer,
            delay: hw.delay,
            ticks,
            config,
            state: InterfaceState::AwaitBootReport,
            wrong_attempts: AttemptCounter::new(config.lockout.max_attempts),
        }
    }

    /// Current protocol state
    pub fn state(&self) -> InterfaceState {
        self.state
    }

    /// LCD
    pub fn display(&self) -> &L {
        &self.display
    }

    /// Timer
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Release the peripherals
    pub fn release(self) -> InterfaceHardware<S, K, L, T, D> {
        InterfaceHardware {
            serial: self.link.release(),
            keypad: self.keypad,
            display: self.display,
            timer: self.timer,
            delay: self.delay,
        }
    }

    /// Show the splash, find the Control node and provision if needed
    pub fn boot(&mut self) -> Result<BootKind, NodeError> {
        info!("interface node booting");
        self.state = InterfaceState::AwaitBootReport;
        let result = self.handshake();
        if let Err(e) = result {
            error!("boot failed: {:?}", e);
            self.halt_timer();
            self.state = InterfaceState::AwaitBootReport;
        }
        result
    }

    fn handshake(&mut self) -> Result<BootKind, NodeError> {
        self.display.install_bar_glyphs()?;
        self.display.show_message("DOOR LOCKER", "")?;
        self.link.send(Marker::InterfaceReady)?;

        let first_time = loop {
            let byte = self.link.recv_byte(&mut self.delay, Wait::Forever)?;
            let Some(marker) = Marker::from_byte(byte) else {
                warn!("skipping {} while waiting for boot report", byte);
                continue;
            };
            match self.apply(marker)? {
                InterfaceSignal::Reannounce => self.link.send(Marker::InterfaceReady)?,
                InterfaceSignal::BootReport { first_time } => break first_time,
                _ => warn!("skipping {:?} while waiting for boot report", marker),
            }
        };

        if first_time {
            info!("fresh device, provisioning");
            self.show_for("NEW USER", "CREATE PASS")?;
            self.provision()?;
            Ok(BootKind::FirstTime)
        } else {
            self.show_for("WELCOME", "AGAIN :)")?;
            Ok(BootKind::Returning)
        }
    }

    /// Show the menu, wait for a key and run the chosen operation
    pub fn menu_once(&mut self) -> Result<MenuOutcome, NodeError> {
        let result = self.menu();
        if let Err(e) = result {
            error!("operation aborted in {}: {:?}", self.state.name(), e);
            self.halt_timer();
            self.state = InterfaceState::Idle;
        }
        result
    }

    fn menu(&mut self) -> Result<MenuOutcome, NodeError> {
        self.display.clear()?;
        self.display.write_at(0, 0, "+ : OPEN DOOR")?;
        self.display.write_at(1, 0, "- : CHANGE PASS")?;
        let key = self.wait_key();
        self.delay.delay_ms(self.config.ui.key_press_ms);
        match key {
            Key::Plus => {
                self.link.send(Marker::CmdOpenDoor)?;
                self.door_operation()?;
                Ok(MenuOutcome::DoorCycled)
            }
            Key::Minus => {
                self.link.send(Marker::CmdChangePassword)?;
                self.change_password()
            }
            _ => {
                self.show_for("INVALID OPTION", "")?;
                Ok(MenuOutcome::Invalid)
            }
        }
    }

    /// Boot, then serve the menu forever
    pub fn run(&mut self) -> ! {
        loop {
            if self.state == InterfaceState::AwaitBootReport {
                if let Err(e) = self.boot() {
                    trace!("rebooting after {:?}", e);
                }
            } else if let Err(e) = self.menu_once() {
                trace!("back to menu after {:?}", e);
            }
        }
    }

    /// Check a received marker against the protocol state
    fn apply(&mut self, marker: Marker) -> Result<InterfaceSignal, NodeError> {
        let t = self.state.transition(marker).map_err(rejected)?;
        if t.next != self.state {
            debug!("{} -> {}", self.state.name(), t.next.name());
        }
        self.state = t.next;
        Ok(t.signal)
    }

    /// Receive the next marker of an exchange and check it
    fn exchange(&mut self) -> Result<InterfaceSignal, NodeError> {
        let wait = Wait::bounded(self.config.link.exchange_ms);
        let marker = self.link.recv_marker(&mut self.delay, wait)?;
        self.apply(marker)
    }

    fn show_for(&mut self, top: &str, bottom: &str) -> Result<(), NodeError> {
        self.display.show_message(top, bottom)?;
        self.delay.delay_ms(self.config.ui.message_ms);
        Ok(())
    }

    fn wait_key(&mut self) -> Key {
        let poll = self.config.link.poll_ms.max(1);
        loop {
            if let Some(key) = self.keypad.poll() {
                return key;
            }
            self.delay.delay_ms(poll);
        }
    }

    /// Prompt for a password, echoing each digit briefly before masking it
    fn read_password(&mut self, prompt: &str) -> Result<Credential, NodeError> {
        let ui = self.config.ui;
        self.display.clear()?;
        self.display.write_at(0, 0, prompt)?;
        self.display.set_cursor(Some((1, 0)))?;

        let mut entry = PasswordEntry::new(ui.password_len);
        while !entry.is_complete() {
            let key = self.wait_key();
            match entry.feed(key) {
                EntryUpdate::Digit { position, value } => {
                    let mut buf = [0u8; 4];
                    let digit = Key::Digit(value).to_char().encode_utf8(&mut buf);
                    self.display.write_at(1, position, digit)?;
                    self.delay.delay_ms(ui.digit_reveal_ms);
                    self.display.write_at(1, position, "*")?;
                    self.display.set_cursor(Some((1, position + 1)))?;
                }
                EntryUpdate::Erased { position } => {
                    self.display.write_at(1, position, " ")?;
                    self.display.set_cursor(Some((1, position)))?;
                }
                EntryUpdate::Submitted | EntryUpdate::Ignored => {}
            }
            self.delay.delay_ms(ui.key_press_ms);
        }
        self.display.set_cursor(None)?;
        self.delay.delay_ms(ui.message_ms / 2);
        Ok(entry.credential())
    }

    /// Read a password twice; `None` when the entries differ
    fn enter_twice(&mut self) -> Result<Option<Credential>, NodeError> {
        let first = self.read_password("ENTER PASSWORD:")?;
        let second = self.read_password("REPEAT PASSWORD")?;
        Ok((first == second).then_some(first))
    }

    fn provision(&mut self) -> Result<(), NodeError> {
        let mut mismatches = AttemptCounter::new(self.config.lockout.max_attempts);
        loop {
            if let Some(credential) = self.enter_twice()? {
                self.link.send(Marker::OperationSuccess)?;
                self.link.send_credential(credential)?;
                info!("password provisioned");
                self.show_for("PASSWORD SET :)", "")?;
                self.show_for("WELCOME", ":)")?;
                return Ok(());
            }
            self.show_for("PASSWORDS", "DO NOT MATCH :(")?;
            if mismatches.record_failure() == AttemptOutcome::Exhausted {
                self.link.send(Marker::MaxWrongPassword)?;
                self.lockout_hold()?;
                self.link.send(Marker::OperationSuccess)?;
            }
        }
    }

    fn door_operation(&mut self) -> Result<(), NodeError> {
        let door = self.config.door;
        self.link.send(Marker::InterfaceReady)?;
        self.ticks.restart(door.tick_s);
        self.timer.start(door.timer_config());
        self.state = InterfaceState::AwaitPhase(DoorPhase::Idle);
        let result = self.follow_door();
        self.halt_timer();
        result
    }

    fn follow_door(&mut self) -> Result<(), NodeError> {
        let door = self.config.door;
        let wait = Wait::bounded(
            self.config
                .link
                .exchange_ms
                .map(|ms| door.longest_phase_ms().saturating_add(ms)),
        );
        let mut phase = DoorPhase::Idle;
        loop {
            let marker = self.recv_door_marker(phase, wait)?;
            match self.apply(marker)? {
                InterfaceSignal::Phase(next) => {
                    phase = next;
                    self.display.clear()?;
                    self.display.write_at(0, 0, phase_banner(phase))?;
                    self.draw_door_progress(phase)?;
                }
                InterfaceSignal::DoorFinished => {
                    info!("door cycle finished");
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Wait for a door marker, redrawing the progress bar meanwhile
    fn recv_door_marker(&mut self, phase: DoorPhase, wait: Wait) -> Result<Marker, NodeError> {
        let poll = self.config.link.poll_ms.max(1);
        let refresh = self.config.ui.refresh_ms.max(poll);
        let mut waited = 0u32;
        let mut since_draw = 0u32;
        loop {
            if let Some(byte) = self.link.poll_byte()? {
                return Marker::from_byte(byte)
                    .ok_or(NodeError::Link(LinkError::Desync(ProtocolError::UnknownByte(byte))));
            }
            if let Wait::Millis(limit) = wait {
                if waited >= limit {
                    return Err(LinkError::Timeout.into());
                }
            }
            if since_draw >= refresh {
                self.draw_door_progress(phase)?;
                since_draw = 0;
            }
            self.delay.delay_ms(poll);
            waited = waited.saturating_add(poll);
            since_draw = since_draw.saturating_add(poll);
        }
    }

    fn draw_door_progress(&mut self, phase: DoorPhase) -> Result<(), NodeError> {
        let door = self.config.door;
        let elapsed = self.ticks.elapsed_s();
        match phase {
            DoorPhase::Opening => self.display.draw_progress(1, door.open_s, elapsed)?,
            DoorPhase::Closing => {
                let closing = elapsed.saturating_sub(door.closing_at());
                self.display.draw_progress(1, door.open_s, closing)?
            }
            _ => {}
        }
        Ok(())
    }

    fn change_password(&mut self) -> Result<MenuOutcome, NodeError> {
        loop {
            let candidate = self.read_password("ENTER OLD PASS")?;
            self.link.send(Marker::ChangePasswordRequest)?;
            self.state = InterfaceState::AwaitChangeAck;
            self.exchange()?;
            self.link.send_credential(candidate)?;
            let accepted = self.exchange()? == InterfaceSignal::Verdict(true);

            if accepted {
                self.wrong_attempts.record_success();
                self.show_for("CORRECT :)", "")?;
                return self.choose_new_password();
            }

            self.show_for("WRONG PASS", "TRY AGAIN")?;
            match self.wrong_attempts.record_failure() {
                AttemptOutcome::Retry { remaining } => {
                    warn!("wrong password, {} attempts left", remaining);
                    self.link.send(Marker::OperationSuccess)?;
                }
                AttemptOutcome::Exhausted => {
                    self.link.send(Marker::MaxWrongPassword)?;
                    self.lockout_hold()?;
                    self.link.send(Marker::OperationSuccess)?;
                    return Ok(MenuOutcome::LockedOut);
                }
            }
        }
    }

    fn choose_new_password(&mut self) -> Result<MenuOutcome, NodeError> {
        let mut mismatches = AttemptCounter::new(self.config.lockout.max_mismatches);
        loop {
            if let Some(credential) = self.enter_twice()? {
                self.link.send(Marker::OperationSuccess)?;
                self.link.send_credential(credential)?;
                info!("password changed");
                self.show_for("DONE", "PASS CHANGED :)")?;
                return Ok(MenuOutcome::PasswordChanged);
            }
            if mismatches.record_failure() == AttemptOutcome::Exhausted {
                self.link.send(Marker::OperationFail)?;
                warn!("new password never confirmed, keeping the old one");
                self.show_for("I DON'T THINK U", "HAV GOOD MEMORY")?;
                return Ok(MenuOutcome::ChangeAbandoned);
            }
            self.show_for("TRY AGAIN", "")?;
        }
    }

    /// Count down the lockout hold on screen
    fn lockout_hold(&mut self) -> Result<(), NodeError> {
        let hold_s = self.config.lockout.hold_s;
        warn!("system locked for {}s", hold_s);
        self.display.show_message("SYSTEM LOCKED", "")?;
        self.delay.delay_ms(self.config.ui.message_ms / 2);
        self.display.clear()?;
        self.display.write_at(0, 0, "UNLOCKED IN")?;

        self.ticks.restart(1);
        self.timer.start(self.config.lockout.timer_config());
        let result = self.count_down(hold_s);
        self.halt_timer();
        result
    }

    fn count_down(&mut self, hold_s: u16) -> Result<(), NodeError> {
        let refresh = self.config.ui.refresh_ms.max(1);
        loop {
            let elapsed = self.ticks.elapsed_s().min(hold_s);
            let mut remaining: String<8> = String::new();
            // "65535s " fits in 8 bytes
            let _ = write!(remaining, "{}s ", hold_s - elapsed);
            self.display.write_at(0, 12, &remaining)?;
            self.display.draw_progress(1, hold_s, elapsed)?;
            if elapsed >= hold_s {
                info!("lockout hold over");
                return Ok(());
            }
            self.delay.delay_ms(refresh);
        }
    }

    fn halt_timer(&mut self) {
        self.timer.stop();
        self.ticks.halt();
    }
}

fn phase_banner(phase: DoorPhase) -> &'static str {
    match phase {
        DoorPhase::Opening => "OPENING DOOR =>",
        DoorPhase::Waiting => "   WAITING...  ",
        DoorPhase::Closing => "<= CLOSING DOOR",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use doorlock_display::Screen;
    use doorlock_hal::interrupt::InterruptHandler;
    use doorlock_hal::timer::TimerConfig;
    use doorlock_hal::uart::{RxSlot, SlotReceiver};
    use heapless::{Deque, Vec};

    use crate::link::tests::ScriptedSerial;

    /// Virtual time shared by the test timer and delay
    struct Clock<'a> {
        now_ms: Cell<u32>,
        period_ms: Cell<Option<u32>>,
        next_ms: Cell<u32>,
        ticks: &'a TickCounter,
    }

    impl<'a> Clock<'a> {
        fn new(ticks: &'a TickCounter) -> Self {
            Self {
                now_ms: Cell::new(0),
                period_ms: Cell::new(None),
                next_ms: Cell::new(0),
                ticks,
            }
        }

        fn advance(&self, ms: u32) {
            let now = self.now_ms.get() + ms;
            self.now_ms.set(now);
            if let Some(period) = self.period_ms.get() {
                while now >= self.next_ms.get() {
                    self.ticks.on_interrupt();
                    self.next_ms.set(self.next_ms.get() + period);
                }
            }
        }
    }

    struct ClockTimer<'c, 'a>(&'c Clock<'a>);

    impl PeriodicTimer for ClockTimer<'_, '_> {
        fn start(&mut self, config: TimerConfig) {
            let period = config.period_ms.max(1);
            self.0.period_ms.set(Some(period));
            self.0.next_ms.set(self.0.now_ms.get() + period);
        }

        fn stop(&mut self) {
            self.0.period_ms.set(None);
        }

        fn is_running(&self) -> bool {
            self.0.period_ms.get().is_some()
        }
    }

    struct ClockDelay<'c, 'a>(&'c Clock<'a>);

    impl DelayNs for ClockDelay<'_, '_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.advance(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.0.advance(ms);
        }
    }

    /// Keypad that hands out a fixed key sequence
    struct ScriptedKeypad(Deque<Key, 128>);

    impl ScriptedKeypad {
        fn new(keys: &str) -> Self {
            let mut queue = Deque::new();
            for c in keys.chars() {
                queue.push_back(Key::from_char(c)).unwrap();
            }
            Self(queue)
        }
    }

    impl Keypad for ScriptedKeypad {
        fn poll(&mut self) -> Option<Key> {
            Some(self.0.pop_front().expect("keypad script exhausted"))
        }
    }

    type Node<'c, 'a> =
        InterfaceNode<'a, ScriptedSerial, ScriptedKeypad, Screen, ClockTimer<'c, 'a>, ClockDelay<'c, 'a>>;

    fn node<'c, 'a>(clock: &'c Clock<'a>, rx: &[u8], keys: &str) -> Node<'c, 'a> {
        InterfaceNode::new(
            InterfaceHardware {
                serial: ScriptedSerial::with_rx(rx),
                keypad: ScriptedKeypad::new(keys),
                display: Screen::new(),
                timer: ClockTimer(clock),
                delay: ClockDelay(clock),
            },
            clock.ticks,
            SystemConfig::default(),
        )
    }

    fn sent(node: Node<'_, '_>) -> Vec<u8, 64> {
        node.release().serial.tx
    }

    #[test]
    fn test_boot_returning() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4], "");
        assert_eq!(node.boot(), Ok(BootKind::Returning));
        assert_eq!(node.state(), InterfaceState::Idle);
        assert!(node.display().contains("WELCOME"));
        assert!(node.display().glyph(4).is_some());
        assert_eq!(sent(node).as_slice(), &[0xFF]);
    }

    #[test]
    fn test_boot_reannounces_to_late_control() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0x00, 0xF2, 0xF1, 0xF4], "");
        assert_eq!(node.boot(), Ok(BootKind::Returning));
        assert_eq!(sent(node).as_slice(), &[0xFF, 0xFF]);
    }

    #[test]
    fn test_boot_provisions() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF3], "1234512345");
        assert_eq!(node.boot(), Ok(BootKind::FirstTime));
        assert_eq!(sent(node).as_slice(), &[0xFF, 0xF2, 0x39, 0x30, 0x00, 0x00]);
    }

    #[test]
    fn test_provision_retries_after_mismatch() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF3], "12345543211234512345");
        assert_eq!(node.boot(), Ok(BootKind::FirstTime));
        assert_eq!(sent(node).as_slice(), &[0xFF, 0xF2, 0x39, 0x30, 0x00, 0x00]);
    }

    #[test]
    fn test_provision_lockout_after_three_mismatches() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let keys = "111112222211111222221111122222 1234512345";
        let keys: String<64> = keys.chars().filter(|c| *c != ' ').collect();
        let mut node = node(&clock, &[0xF3], &keys);
        assert_eq!(node.boot(), Ok(BootKind::FirstTime));
        assert!(clock.now_ms.get() >= 60_000);
        assert_eq!(
            sent(node).as_slice(),
            &[0xFF, 0xF6, 0xF2, 0xF2, 0x39, 0x30, 0x00, 0x00]
        );
    }

    #[test]
    fn test_entry_masks_digits_and_erases() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[], "12C3456");
        let credential = node.read_password("ENTER PASSWORD:").unwrap();
        assert_eq!(credential.value(), 13456);
        assert_eq!(node.display().text(1), "*****");
        assert_eq!(node.display().cursor(), None);
    }

    #[test]
    fn test_entry_early_enter() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[], "42=");
        assert_eq!(node.read_password("ENTER PASSWORD:").unwrap().value(), 42);
    }

    #[test]
    fn test_menu_invalid_key() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4], "*");
        node.boot().unwrap();
        assert_eq!(node.menu_once(), Ok(MenuOutcome::Invalid));
        assert!(node.display().contains("INVALID OPTION"));
        assert_eq!(sent(node).as_slice(), &[0xFF]);
    }

    #[test]
    fn test_door_operation() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4, 0xFB, 0xFC, 0xFD, 0xF2], "+");
        node.boot().unwrap();
        assert_eq!(node.menu_once(), Ok(MenuOutcome::DoorCycled));
        assert_eq!(node.state(), InterfaceState::Idle);
        assert!(!node.timer().is_running());
        assert!(node.display().contains("CLOSING DOOR"));
        assert_eq!(sent(node).as_slice(), &[0xFF, b'+', 0xFF]);
    }

    /// Delay that lets the RX-complete interrupt land one byte per sleep
    struct RxWire<'c, 'a, 's> {
        delay: ClockDelay<'c, 'a>,
        slot: &'s RxSlot,
        pending: Deque<u8, 16>,
    }

    impl RxWire<'_, '_, '_> {
        fn feed(&mut self) {
            if !self.slot.has_new_byte() {
                if let Some(byte) = self.pending.pop_front() {
                    self.slot.deliver(byte);
                }
            }
        }
    }

    impl DelayNs for RxWire<'_, '_, '_> {
        fn delay_ns(&mut self, ns: u32) {
            self.delay.delay_ns(ns);
            self.feed();
        }

        fn delay_ms(&mut self, ms: u32) {
            self.delay.delay_ms(ms);
            self.feed();
        }
    }

    #[test]
    fn test_door_operation_over_rx_interrupt() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let slot = RxSlot::new();
        let mut pending = Deque::new();
        for b in [0xF4, 0xFB, 0xFC, 0xFD, 0xF2] {
            pending.push_back(b).unwrap();
        }
        let mut node = InterfaceNode::new(
            InterfaceHardware {
                serial: SlotReceiver::new(ScriptedSerial::default(), &slot),
                keypad: ScriptedKeypad::new("+"),
                display: Screen::new(),
                timer: ClockTimer(&clock),
                delay: RxWire {
                    delay: ClockDelay(&clock),
                    slot: &slot,
                    pending,
                },
            },
            &ticks,
            SystemConfig::default(),
        );

        assert_eq!(node.boot(), Ok(BootKind::Returning));
        assert_eq!(node.menu_once(), Ok(MenuOutcome::DoorCycled));
        assert_eq!(node.state(), InterfaceState::Idle);

        let hw = node.release();
        assert!(hw.delay.pending.is_empty());
        assert_eq!(slot.overruns(), 0);
        assert_eq!(hw.serial.release().tx.as_slice(), &[0xFF, b'+', 0xFF]);
    }

    #[test]
    fn test_door_skipped_phase_is_desync() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4, 0xFB, 0xFD], "+");
        node.boot().unwrap();
        assert_eq!(
            node.menu_once(),
            Err(NodeError::Link(LinkError::Desync(ProtocolError::Unexpected {
                state: "AwaitPhase",
                marker: Marker::DoorClosing,
            })))
        );
        assert_eq!(node.state(), InterfaceState::Idle);
        assert!(!node.timer().is_running());
    }

    #[test]
    fn test_door_silence_times_out() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4, 0xFB], "+");
        node.boot().unwrap();
        assert_eq!(node.menu_once(), Err(NodeError::Link(LinkError::Timeout)));
    }

    #[test]
    fn test_change_password() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut node = node(&clock, &[0xF4, 0xF5, 0xF2], "-543211111111111");
        node.boot().unwrap();
        assert_eq!(node.menu_once(), Ok(MenuOutcome::PasswordChanged));
        assert_eq!(
            sent(node).as_slice(),
            &[0xFF, b'-', 0xF5, 0x31, 0xD4, 0x00, 0x00, 0xF2, 0x67, 0x2B, 0x00, 0x00]
        );
    }

    #[test]
    fn test_wrong_password_lockout() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let rx = [0xF4, 0xF5, 0x2F, 0xF5, 0x2F, 0xF5, 0x2F];
        let mut node = node(&clock, &rx, "-111111111111111");
        node.boot().unwrap();
        let before = clock.now_ms.get();
        assert_eq!(node.menu_once(), Ok(MenuOutcome::LockedOut));
        assert!(clock.now_ms.get() - before >= 60_000);
        assert!(node.display().contains("0s"));

        let wrong = [0xF5, 0x67, 0x2B, 0x00, 0x00];
        let mut expected: Vec<u8, 64> = Vec::new();
        expected.extend_from_slice(&[0xFF, b'-']).unwrap();
        expected.extend_from_slice(&wrong).unwrap();
        expected.push(0xF2).unwrap();
        expected.extend_from_slice(&wrong).unwrap();
        expected.push(0xF2).unwrap();
        expected.extend_from_slice(&wrong).unwrap();
        expected.extend_from_slice(&[0xF6, 0xF2]).unwrap();
        assert_eq!(sent(node), expected);
    }

    #[test]
    fn test_new_password_mismatches_abandon() {
        let ticks = TickCounter::new();
        let clock = Clock::new(&ticks);
        let mut keys: String<128> = String::new();
        keys.push_str("-54321").unwrap();
        for _ in 0..5 {
            keys.push_str("1111122222").unwrap();
        }
        let mut node = node(&clock, &[0xF4, 0xF5, 0xF2], &keys);
        node.boot().unwrap();
        assert_eq!(node.menu_once(), Ok(MenuOutcome::ChangeAbandoned));
        assert_eq!(sent(node).last(), Some(&0x2F));
    }
}
