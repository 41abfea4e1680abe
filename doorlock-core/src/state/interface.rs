//! Interface node protocol tracking
//!
//! The Interface node drives the conversation, so most of its logic lives
//! in the runtime. This machine only checks that whatever the Control node
//! sends back is allowed at that point.

use doorlock_protocol::Marker;

use crate::door::DoorPhase;
use crate::error::ProtocolError;

/// Interface node protocol states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceState {
    /// `InterfaceReady` sent, waiting for the boot report
    AwaitBootReport,
    /// Nothing outstanding
    Idle,
    /// Door sequence running; holds the last phase seen
    AwaitPhase(DoorPhase),
    /// `ChangePasswordRequest` sent, waiting for the echo
    AwaitChangeAck,
    /// Old credential sent, waiting for the verdict
    AwaitVerdict,
}

/// What the runtime should do with a received marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceSignal {
    /// Control node booted late; send `InterfaceReady` again
    Reannounce,
    /// Boot report received
    BootReport { first_time: bool },
    /// Stale byte from before the handshake
    Skip(Marker),
    /// Door reached a new phase
    Phase(DoorPhase),
    /// Door sequence finished
    DoorFinished,
    /// Change request acknowledged
    AckReceived,
    /// Old credential verdict
    Verdict(bool),
}

/// Result of an Interface node transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceTransition {
    /// State after the marker
    pub next: InterfaceState,
    /// What the marker means
    pub signal: InterfaceSignal,
}

impl InterfaceState {
    /// State name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            InterfaceState::AwaitBootReport => "AwaitBootReport",
            InterfaceState::Idle => "Idle",
            InterfaceState::AwaitPhase(_) => "AwaitPhase",
            InterfaceState::AwaitChangeAck => "AwaitChangeAck",
            InterfaceState::AwaitVerdict => "AwaitVerdict",
        }
    }

    /// Check a marker from the Control node against the current state
    pub fn transition(self, marker: Marker) -> Result<InterfaceTransition, ProtocolError> {
        use InterfaceSignal as S;
        use InterfaceState::*;

        let (next, signal) = match (self, marker) {
            (AwaitBootReport, Marker::ControlReady) => (self, S::Reannounce),
            (AwaitBootReport, Marker::FirstTime) => (Idle, S::BootReport { first_time: true }),
            (AwaitBootReport, Marker::NotFirstTime) => (Idle, S::BootReport { first_time: false }),
            (AwaitBootReport, other) => (self, S::Skip(other)),

            (AwaitPhase(DoorPhase::Closing), Marker::OperationSuccess) => (Idle, S::DoorFinished),
            (AwaitPhase(seen), m) => match DoorPhase::from_marker(m) {
                Some(phase) if seen.next() == Some(phase) => (AwaitPhase(phase), S::Phase(phase)),
                _ => return Err(self.unexpected(m)),
            },

            (AwaitChangeAck, Marker::ChangePasswordRequest) => (AwaitVerdict, S::AckReceived),
            (AwaitVerdict, Marker::OperationSuccess) => (Idle, S::Verdict(true)),
            (AwaitVerdict, Marker::OperationFail) => (Idle, S::Verdict(false)),

            (state, m) => return Err(state.unexpected(m)),
        };
        Ok(InterfaceTransition { next, signal })
    }

    fn unexpected(self, marker: Marker) -> ProtocolError {
        ProtocolError::Unexpected {
            state: self.name(),
            marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_report() {
        let t = InterfaceState::AwaitBootReport
            .transition(Marker::FirstTime)
            .unwrap();
        assert_eq!(t.next, InterfaceState::Idle);
        assert_eq!(t.signal, InterfaceSignal::BootReport { first_time: true });

        let t = InterfaceState::AwaitBootReport
            .transition(Marker::NotFirstTime)
            .unwrap();
        assert_eq!(t.signal, InterfaceSignal::BootReport { first_time: false });
    }

    #[test]
    fn test_boot_reannounce_and_skip() {
        let t = InterfaceState::AwaitBootReport
            .transition(Marker::ControlReady)
            .unwrap();
        assert_eq!(t.next, InterfaceState::AwaitBootReport);
        assert_eq!(t.signal, InterfaceSignal::Reannounce);

        let t = InterfaceState::AwaitBootReport
            .transition(Marker::OperationSuccess)
            .unwrap();
        assert_eq!(t.signal, InterfaceSignal::Skip(Marker::OperationSuccess));
    }

    #[test]
    fn test_door_phases_in_order() {
        let mut state = InterfaceState::AwaitPhase(DoorPhase::Idle);
        for (marker, phase) in [
            (Marker::DoorOpening, DoorPhase::Opening),
            (Marker::DoorWaiting, DoorPhase::Waiting),
            (Marker::DoorClosing, DoorPhase::Closing),
        ] {
            let t = state.transition(marker).unwrap();
            assert_eq!(t.signal, InterfaceSignal::Phase(phase));
            state = t.next;
        }
        let t = state.transition(Marker::OperationSuccess).unwrap();
        assert_eq!(t.next, InterfaceState::Idle);
        assert_eq!(t.signal, InterfaceSignal::DoorFinished);
    }

    #[test]
    fn test_door_phase_skipped() {
        assert_eq!(
            InterfaceState::AwaitPhase(DoorPhase::Opening).transition(Marker::DoorClosing),
            Err(ProtocolError::Unexpected {
                state: "AwaitPhase",
                marker: Marker::DoorClosing,
            })
        );
        assert!(InterfaceState::AwaitPhase(DoorPhase::Waiting)
            .transition(Marker::OperationSuccess)
            .is_err());
    }

    #[test]
    fn test_change_exchange() {
        let t = InterfaceState::AwaitChangeAck
            .transition(Marker::ChangePasswordRequest)
            .unwrap();
        assert_eq!(t.next, InterfaceState::AwaitVerdict);
        let t = t.next.transition(Marker::OperationFail).unwrap();
        assert_eq!(t.signal, InterfaceSignal::Verdict(false));
        assert_eq!(t.next, InterfaceState::Idle);
    }

    #[test]
    fn test_idle_rejects_everything() {
        for marker in Marker::ALL {
            assert!(InterfaceState::Idle.transition(marker).is_err());
        }
    }
}
