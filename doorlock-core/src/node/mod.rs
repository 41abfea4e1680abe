//! Node runtimes
//!
//! Each runtime owns its peripherals, gathers the input its state machine
//! asks for and performs the resulting actions. Timer interrupt handlers
//! live outside the node (in a `static` or on the stack of `main`) and are
//! only borrowed.

mod control;
mod interface;

pub use control::{ControlHardware, ControlNode};
pub use interface::{BootKind, InterfaceHardware, InterfaceNode, MenuOutcome};

use doorlock_protocol::Marker;

use crate::error::{LinkError, NodeError, ProtocolError};
use crate::state::ControlEvent;

/// Classify a received byte for the Control node machine
fn classify(byte: u8) -> ControlEvent {
    Marker::from_byte(byte).map_or(ControlEvent::Garbage(byte), ControlEvent::Received)
}

/// Map a rejected transition onto a node error
///
/// Anything the peer sent out of turn is a desync; an event the node fed
/// itself out of turn is an internal fault.
fn rejected(e: ProtocolError) -> NodeError {
    match e {
        ProtocolError::OutOfTurn { .. } => NodeError::Protocol(e),
        _ => NodeError::Link(LinkError::Desync(e)),
    }
}
