//! Recording stand-ins for the node peripherals

use std::collections::VecDeque;

use doorlock_core::traits::{Alarm, DoorMotor, Key, Keypad, MotorCommand, MotorError};
use doorlock_display::{DisplayError, Screen, TextDisplay, SCREEN_ROWS};

use crate::clock::SimClock;

/// Door motor that logs every command with its virtual timestamp
pub struct RecordingMotor<'c, 'a> {
    clock: &'c SimClock<'a>,
    current: MotorCommand,
    log: Vec<(u64, MotorCommand)>,
}

impl<'c, 'a> RecordingMotor<'c, 'a> {
    /// Stopped motor timed by `clock`
    pub fn new(clock: &'c SimClock<'a>) -> Self {
        Self {
            clock,
            current: MotorCommand::STOP,
            log: Vec::new(),
        }
    }

    /// Commands received so far as `(ms, command)`
    pub fn log(&self) -> &[(u64, MotorCommand)] {
        &self.log
    }

    /// Consume the motor, keeping the log
    pub fn into_log(self) -> Vec<(u64, MotorCommand)> {
        self.log
    }
}

impl DoorMotor for RecordingMotor<'_, '_> {
    fn drive(&mut self, command: MotorCommand) -> Result<(), MotorError> {
        if command.speed_percent > 100 {
            return Err(MotorError::InvalidSpeed);
        }
        self.log.push((self.clock.now_ms(), command));
        self.current = command;
        Ok(())
    }

    fn current(&self) -> MotorCommand {
        self.current
    }
}

/// Buzzer that logs each on/off change with its virtual timestamp
pub struct RecordingAlarm<'c, 'a> {
    clock: &'c SimClock<'a>,
    on: bool,
    log: Vec<(u64, bool)>,
}

impl<'c, 'a> RecordingAlarm<'c, 'a> {
    /// Silent buzzer timed by `clock`
    pub fn new(clock: &'c SimClock<'a>) -> Self {
        Self {
            clock,
            on: false,
            log: Vec::new(),
        }
    }

    /// State changes so far as `(ms, sounding)`
    pub fn log(&self) -> &[(u64, bool)] {
        &self.log
    }

    /// Consume the buzzer, keeping the log
    pub fn into_log(self) -> Vec<(u64, bool)> {
        self.log
    }

    fn apply(&mut self, on: bool) {
        if self.on != on {
            self.log.push((self.clock.now_ms(), on));
            self.on = on;
        }
    }
}

impl Alarm for RecordingAlarm<'_, '_> {
    fn on(&mut self) {
        self.apply(true);
    }

    fn off(&mut self) {
        self.apply(false);
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// Keypad that replays a fixed sequence of presses
///
/// Each poll hands out the next key. Polling past the end panics: the
/// scenario ran longer than its script, and waiting forever for a key that
/// never comes would hang the run.
pub struct ScriptedKeypad {
    keys: VecDeque<Key>,
}

impl ScriptedKeypad {
    /// Keys decoded from the characters printed on them
    pub fn new(script: &str) -> Self {
        Self {
            keys: script
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(Key::from_char)
                .collect(),
        }
    }

    /// Presses not yet consumed
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl Keypad for ScriptedKeypad {
    fn poll(&mut self) -> Option<Key> {
        match self.keys.pop_front() {
            Some(key) => Some(key),
            None => panic!("keypad script exhausted"),
        }
    }
}

/// LCD that keeps a history of distinct screens
///
/// A snapshot is taken after every write. Progress bar glyphs are rendered
/// as `|` for a partial cell and `#` for a full one.
pub struct RecordingDisplay {
    screen: Screen,
    history: Vec<String>,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDisplay {
    /// Blank display with an empty history
    pub fn new() -> Self {
        Self {
            screen: Screen::new(),
            history: Vec::new(),
        }
    }

    /// Current contents
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Every distinct screen shown, as `"top / bottom"`
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Consume the display, keeping the history
    pub fn into_history(self) -> Vec<String> {
        self.history
    }

    fn snapshot(&mut self) {
        let rows: Vec<String> = (0..SCREEN_ROWS)
            .map(|row| render_row(self.screen.text(row)))
            .collect();
        let shot = rows.join(" / ");
        if self.history.last() != Some(&shot) {
            self.history.push(shot);
        }
    }
}

fn render_row(text: &str) -> String {
    text.chars()
        .map(|ch| match ch as u32 {
            0..=3 => '|',
            4 => '#',
            _ => ch,
        })
        .collect()
}

impl TextDisplay for RecordingDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.screen.clear()?;
        self.snapshot();
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        self.screen.write_at(row, col, text)?;
        self.snapshot();
        Ok(())
    }

    fn define_glyph(&mut self, slot: u8, pattern: &[u8; 8]) -> Result<(), DisplayError> {
        self.screen.define_glyph(slot, pattern)
    }

    fn set_cursor(&mut self, position: Option<(u8, u8)>) -> Result<(), DisplayError> {
        self.screen.set_cursor(position)
    }

    fn dimensions(&self) -> (u8, u8) {
        self.screen.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_display::DisplayExt;
    use embedded_hal::delay::DelayNs;

    use crate::clock::SimDelay;

    #[test]
    fn test_motor_log_is_timestamped() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(&clock);
        let mut motor = RecordingMotor::new(&clock);
        motor.drive(MotorCommand::clockwise(100)).unwrap();
        delay.delay_ms(15_000);
        motor.stop().unwrap();
        assert_eq!(
            motor.log(),
            &[(0, MotorCommand::clockwise(100)), (15_000, MotorCommand::STOP)]
        );
    }

    #[test]
    fn test_alarm_logs_changes_only() {
        let clock = SimClock::new();
        let mut alarm = RecordingAlarm::new(&clock);
        alarm.off();
        alarm.on();
        alarm.on();
        alarm.off();
        assert_eq!(alarm.log(), &[(0, true), (0, false)]);
    }

    #[test]
    fn test_keypad_replays_script() {
        let mut keypad = ScriptedKeypad::new("12 =+");
        assert_eq!(keypad.remaining(), 4);
        assert_eq!(keypad.poll(), Some(Key::Digit(1)));
        assert_eq!(keypad.poll(), Some(Key::Digit(2)));
        assert_eq!(keypad.poll(), Some(Key::Enter));
        assert_eq!(keypad.poll(), Some(Key::Plus));
    }

    #[test]
    #[should_panic(expected = "keypad script exhausted")]
    fn test_keypad_panics_when_exhausted() {
        let mut keypad = ScriptedKeypad::new("");
        keypad.poll();
    }

    #[test]
    fn test_display_history_dedups() {
        let mut display = RecordingDisplay::new();
        display.show_message("WELCOME", "AGAIN :)").unwrap();
        display.write_at(0, 4, "WELCOME").unwrap();
        display.draw_progress(1, 10, 5).unwrap();
        assert_eq!(
            display.history(),
            &[
                " / ".to_string(),
                "    WELCOME / ".to_string(),
                "    WELCOME /     AGAIN :)".to_string(),
                "    WELCOME / ########".to_string(),
            ]
        );
    }
}
