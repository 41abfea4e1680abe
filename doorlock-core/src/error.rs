//! Error types
//!
//! Each layer has its own error enum; the node runtimes fold them into
//! [`NodeError`].

use doorlock_display::DisplayError;
use doorlock_hal::StoreError;
use doorlock_protocol::Marker;

use crate::traits::MotorError;

/// Turn-order violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// A valid marker arrived at a point where it is not allowed
    Unexpected {
        /// Receiving state
        state: &'static str,
        /// Marker that arrived
        marker: Marker,
    },
    /// The byte is not part of the marker alphabet
    UnknownByte(u8),
    /// A local event was fed to a state that cannot accept it
    OutOfTurn {
        /// State that rejected the event
        state: &'static str,
    },
}

/// Serial link failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// No byte arrived within the allowed wait
    Timeout,
    /// The transport reported an error
    Serial,
    /// The peer is out of step with this node
    Desync(ProtocolError),
}

/// Errors surfaced by a node operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
    /// Serial link failure
    Link(LinkError),
    /// Credential EEPROM failure
    Store(StoreError),
    /// Door motor failure
    Motor(MotorError),
    /// LCD failure
    Display(DisplayError),
    /// Internal state machine misuse
    Protocol(ProtocolError),
    /// The door timer stopped advancing
    TimerStalled,
}

impl From<LinkError> for NodeError {
    fn from(e: LinkError) -> Self {
        NodeError::Link(e)
    }
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        NodeError::Store(e)
    }
}

impl From<MotorError> for NodeError {
    fn from(e: MotorError) -> Self {
        NodeError::Motor(e)
    }
}

impl From<DisplayError> for NodeError {
    fn from(e: DisplayError) -> Self {
        NodeError::Display(e)
    }
}

impl From<ProtocolError> for NodeError {
    fn from(e: ProtocolError) -> Self {
        NodeError::Protocol(e)
    }
}

impl NodeError {
    /// Check whether the peer fell out of step
    pub fn is_desync(&self) -> bool {
        matches!(self, NodeError::Link(LinkError::Desync(_)))
    }
}
