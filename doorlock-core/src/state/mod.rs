//! Protocol state machines
//!
//! Each node's position in the protocol is an explicit state. Transitions
//! are pure functions of the current state and an event; the node runtimes
//! in [`crate::node`] gather events and perform the resulting actions.

pub mod control;
pub mod interface;

pub use control::{
    ControlAction, ControlEvent, ControlInput, ControlState, CredentialPurpose, LockoutResume,
    Patience, Transition,
};
pub use interface::{InterfaceSignal, InterfaceState, InterfaceTransition};
