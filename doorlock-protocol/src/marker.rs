//! Protocol marker alphabet
//!
//! Byte values are fixed by the deployed firmware and must not change.
//! `0xF5` is used both for the change-password request (Interface to
//! Control) and for its acknowledgement (Control to Interface).

/// One-byte protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Marker {
    /// Interface node is ready (boot handshake, door operation start)
    InterfaceReady = 0xFF,
    /// Control node is ready (boot handshake)
    ControlReady = 0xF1,
    /// Door started opening
    DoorOpening = 0xFB,
    /// Door is held open
    DoorWaiting = 0xFC,
    /// Door started closing
    DoorClosing = 0xFD,
    /// Operation succeeded; also "retry" and "release lockout"
    OperationSuccess = 0xF2,
    /// Operation failed
    OperationFail = 0x2F,
    /// Change-password request and its acknowledgement
    ChangePasswordRequest = 0xF5,
    /// Too many wrong attempts, enter the lockout hold
    MaxWrongPassword = 0xF6,
    /// Boot report: no credential provisioned yet
    FirstTime = 0xF3,
    /// Boot report: credential present
    NotFirstTime = 0xF4,
    /// Menu command: open the door
    CmdOpenDoor = b'+',
    /// Menu command: change the password
    CmdChangePassword = b'-',
}

impl Marker {
    /// Every marker in the alphabet
    pub const ALL: [Marker; 13] = [
        Marker::InterfaceReady,
        Marker::ControlReady,
        Marker::DoorOpening,
        Marker::DoorWaiting,
        Marker::DoorClosing,
        Marker::OperationSuccess,
        Marker::OperationFail,
        Marker::ChangePasswordRequest,
        Marker::MaxWrongPassword,
        Marker::FirstTime,
        Marker::NotFirstTime,
        Marker::CmdOpenDoor,
        Marker::CmdChangePassword,
    ];

    /// Decode a marker from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xFF => Some(Marker::InterfaceReady),
            0xF1 => Some(Marker::ControlReady),
            0xFB => Some(Marker::DoorOpening),
            0xFC => Some(Marker::DoorWaiting),
            0xFD => Some(Marker::DoorClosing),
            0xF2 => Some(Marker::OperationSuccess),
            0x2F => Some(Marker::OperationFail),
            0xF5 => Some(Marker::ChangePasswordRequest),
            0xF6 => Some(Marker::MaxWrongPassword),
            0xF3 => Some(Marker::FirstTime),
            0xF4 => Some(Marker::NotFirstTime),
            b'+' => Some(Marker::CmdOpenDoor),
            b'-' => Some(Marker::CmdChangePassword),
            _ => None,
        }
    }

    /// Wire byte for this marker
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Door phase announcements sent by the Control node
    pub fn is_door_phase(self) -> bool {
        matches!(
            self,
            Marker::DoorOpening | Marker::DoorWaiting | Marker::DoorClosing
        )
    }

    /// Menu commands sent by the Interface node
    pub fn is_command(self) -> bool {
        matches!(self, Marker::CmdOpenDoor | Marker::CmdChangePassword)
    }

    /// Boot reports sent by the Control node
    pub fn is_boot_report(self) -> bool {
        matches!(self, Marker::FirstTime | Marker::NotFirstTime)
    }
}

impl From<Marker> for u8 {
    fn from(marker: Marker) -> u8 {
        marker.to_byte()
    }
}

impl TryFrom<u8> for Marker {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Marker::from_byte(byte).ok_or(byte)
    }
}
