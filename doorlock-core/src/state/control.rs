//! Control node state machine
//!
//! The Control node reacts to commands from the Interface node. Each state
//! names the single input it is waiting for ([`ControlState::input`]) and
//! every transition produces at most one [`ControlAction`].

use doorlock_protocol::{Credential, Marker};

use crate::door::DoorPhase;
use crate::error::ProtocolError;

/// Why a credential payload is being received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CredentialPurpose {
    /// First credential on a fresh device
    Provision,
    /// Replacement after a verified change request
    Replace,
}

/// Where the Control node goes once a lockout hold is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockoutResume {
    /// Back to waiting for a provisioning attempt
    Provisioning,
    /// Back to the command menu
    Menu,
}

impl LockoutResume {
    fn state(self) -> ControlState {
        match self {
            LockoutResume::Provisioning => ControlState::Provisioning,
            LockoutResume::Menu => ControlState::Menu,
        }
    }
}

/// Control node states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// `ControlReady` sent, waiting for `InterfaceReady`
    AwaitInterfaceReady,
    /// Reading the provisioned flag
    CheckProvisioned,
    /// `FirstTime` sent, waiting for a provisioning attempt
    Provisioning,
    /// Waiting for a 4-byte credential
    AwaitCredential(CredentialPurpose),
    /// Waiting for a command
    Menu,
    /// Door sequence armed, waiting for `InterfaceReady`
    DoorAwaitReady,
    /// Door sequence running; holds the last announced phase
    DoorRunning(DoorPhase),
    /// Waiting for `ChangePasswordRequest`
    AwaitChangeRequest,
    /// Request acknowledged, waiting for the old credential
    AwaitOldCredential,
    /// Comparing a received credential with the store
    Verifying(Credential),
    /// Old credential accepted, waiting for the new one or an abort
    AwaitChangeOutcome,
    /// Old credential rejected, waiting for retry or lockout
    AwaitRetryDecision,
    /// Alarm sounding until the Interface node releases it
    Lockout(LockoutResume),
}

/// How long a receive may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Patience {
    /// The peer answers after a person acts; wait indefinitely
    Human,
    /// The peer answers on its own; the exchange timeout applies
    Exchange,
}

/// Input the runtime must gather for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlInput {
    /// Next byte from the link
    Marker(Patience),
    /// A 4-byte credential payload (exchange timeout per byte)
    Credential,
    /// The provisioned flag from the store
    ProvisionedFlag,
    /// Result of comparing this credential with the store
    Verify(Credential),
    /// The sequencer moving past the given announced phase
    Phase(DoorPhase),
    /// A byte arriving while the alarm pattern plays
    LockoutRelease,
}

/// Events fed to [`ControlState::transition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// A marker arrived
    Received(Marker),
    /// A byte outside the marker alphabet arrived
    Garbage(u8),
    /// A credential payload arrived
    Credential(Credential),
    /// Provisioned flag read from the store
    Provisioned(bool),
    /// Credential comparison finished
    Verified(bool),
    /// The sequencer is ahead of the last announced phase
    PhaseDue,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlAction {
    /// Send a marker
    Send(Marker),
    /// Write a credential to the store
    Persist {
        credential: Credential,
        purpose: CredentialPurpose,
    },
    /// Arm the sequencer and start the door timer
    StartDoor,
    /// Send the phase marker and drive the motor
    Announce(DoorPhase),
    /// Send `OperationSuccess`, stop the motor and the door timer
    FinishDoor,
    /// Start the lockout alarm
    SoundAlarm,
    /// Silence the lockout alarm
    SilenceAlarm,
    /// Drop a byte that has no meaning here
    Ignore(u8),
}

/// Result of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    /// State after the event
    pub next: ControlState,
    /// Side effect to perform
    pub action: Option<ControlAction>,
}

impl Transition {
    fn to(next: ControlState) -> Self {
        Self { next, action: None }
    }

    fn with(next: ControlState, action: ControlAction) -> Self {
        Self {
            next,
            action: Some(action),
        }
    }
}

impl ControlState {
    /// State name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ControlState::AwaitInterfaceReady => "AwaitInterfaceReady",
            ControlState::CheckProvisioned => "CheckProvisioned",
            ControlState::Provisioning => "Provisioning",
            ControlState::AwaitCredential(_) => "AwaitCredential",
            ControlState::Menu => "Menu",
            ControlState::DoorAwaitReady => "DoorAwaitReady",
            ControlState::DoorRunning(_) => "DoorRunning",
            ControlState::AwaitChangeRequest => "AwaitChangeRequest",
            ControlState::AwaitOldCredential => "AwaitOldCredential",
            ControlState::Verifying(_) => "Verifying",
            ControlState::AwaitChangeOutcome => "AwaitChangeOutcome",
            ControlState::AwaitRetryDecision => "AwaitRetryDecision",
            ControlState::Lockout(_) => "Lockout",
        }
    }

    /// Input the runtime must gather before the next transition
    pub fn input(&self) -> ControlInput {
        use ControlState::*;

        match *self {
            AwaitInterfaceReady | Provisioning | Menu | AwaitChangeRequest
            | AwaitChangeOutcome => ControlInput::Marker(Patience::Human),
            DoorAwaitReady | AwaitRetryDecision => ControlInput::Marker(Patience::Exchange),
            CheckProvisioned => ControlInput::ProvisionedFlag,
            AwaitCredential(_) | AwaitOldCredential => ControlInput::Credential,
            Verifying(candidate) => ControlInput::Verify(candidate),
            DoorRunning(announced) => ControlInput::Phase(announced),
            Lockout(_) => ControlInput::LockoutRelease,
        }
    }

    /// Check whether outputs (motor, alarm, timer) may be active
    pub fn drives_outputs(&self) -> bool {
        matches!(
            self,
            ControlState::DoorAwaitReady | ControlState::DoorRunning(_) | ControlState::Lockout(_)
        )
    }

    /// Process an event and return the next state and action
    ///
    /// This is the core protocol logic of the Control node.
    pub fn transition(self, event: ControlEvent) -> Result<Transition, ProtocolError> {
        use ControlEvent::*;
        use ControlState::*;
        use Marker::*;

        let t = match (self, event) {
            // Boot handshake: anything before InterfaceReady is a leftover
            (AwaitInterfaceReady, Received(InterfaceReady)) => Transition::to(CheckProvisioned),
            (AwaitInterfaceReady, Received(other)) => {
                Transition::with(self, ControlAction::Ignore(other.to_byte()))
            }
            (AwaitInterfaceReady, Garbage(byte)) => Transition::with(self, ControlAction::Ignore(byte)),

            (CheckProvisioned, Provisioned(true)) => {
                Transition::with(Menu, ControlAction::Send(NotFirstTime))
            }
            (CheckProvisioned, Provisioned(false)) => {
                Transition::with(Provisioning, ControlAction::Send(FirstTime))
            }

            // Provisioning attempts
            (Provisioning, Received(OperationSuccess)) => {
                Transition::to(AwaitCredential(CredentialPurpose::Provision))
            }
            (Provisioning, Received(MaxWrongPassword)) => {
                Transition::with(Lockout(LockoutResume::Provisioning), ControlAction::SoundAlarm)
            }
            // Interface re-announcing itself after a late boot
            (Provisioning, Received(InterfaceReady)) => {
                Transition::with(self, ControlAction::Ignore(InterfaceReady.to_byte()))
            }

            (AwaitCredential(purpose), Credential(credential)) => {
                Transition::with(Menu, ControlAction::Persist { credential, purpose })
            }

            // Menu: only the two commands mean anything
            (Menu, Received(CmdOpenDoor)) => Transition::with(DoorAwaitReady, ControlAction::StartDoor),
            (Menu, Received(CmdChangePassword)) => Transition::to(AwaitChangeRequest),
            (Menu, Received(other)) => Transition::with(self, ControlAction::Ignore(other.to_byte())),
            (Menu, Garbage(byte)) => Transition::with(self, ControlAction::Ignore(byte)),

            // Door operation
            (DoorAwaitReady, Received(InterfaceReady)) => Transition::to(DoorRunning(DoorPhase::Idle)),
            (DoorRunning(announced), PhaseDue) => match announced.next() {
                Some(DoorPhase::Complete) | None => Transition::with(Menu, ControlAction::FinishDoor),
                Some(phase) => Transition::with(DoorRunning(phase), ControlAction::Announce(phase)),
            },

            // Change password
            (AwaitChangeRequest, Received(ChangePasswordRequest)) => Transition::with(
                AwaitOldCredential,
                ControlAction::Send(ChangePasswordRequest),
            ),
            (AwaitOldCredential, Credential(candidate)) => Transition::to(Verifying(candidate)),
            (Verifying(_), Verified(true)) => {
                Transition::with(AwaitChangeOutcome, ControlAction::Send(OperationSuccess))
            }
            (Verifying(_), Verified(false)) => {
                Transition::with(AwaitRetryDecision, ControlAction::Send(OperationFail))
            }
            (AwaitChangeOutcome, Received(OperationSuccess)) => {
                Transition::to(AwaitCredential(CredentialPurpose::Replace))
            }
            (AwaitChangeOutcome, Received(OperationFail)) => Transition::to(Menu),
            (AwaitRetryDecision, Received(OperationSuccess)) => Transition::to(AwaitChangeRequest),
            (AwaitRetryDecision, Received(MaxWrongPassword)) => {
                Transition::with(Lockout(LockoutResume::Menu), ControlAction::SoundAlarm)
            }

            // Lockout hold: only the release counts
            (Lockout(resume), Received(OperationSuccess)) => {
                Transition::with(resume.state(), ControlAction::SilenceAlarm)
            }
            (Lockout(_), Received(other)) => Transition::with(self, ControlAction::Ignore(other.to_byte())),
            (Lockout(_), Garbage(byte)) => Transition::with(self, ControlAction::Ignore(byte)),

            // Everything else is out of turn
            (state, Received(marker)) => {
                return Err(ProtocolError::Unexpected {
                    state: state.name(),
                    marker,
                })
            }
            (_, Garbage(byte)) => return Err(ProtocolError::UnknownByte(byte)),
            (state, _) => return Err(ProtocolError::OutOfTurn { state: state.name() }),
        };
        Ok(t)
    }
}
