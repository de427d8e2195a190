//! Outbound application events.
//!
//! The [`ControllerService`](super::service::ControllerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Nothing here
//! is sent back to the BLE central; the protocol is fire-and-forget, so
//! events exist for logs and tests.

use crate::app::commands::Command;
use crate::error::{ProtocolError, PulseError};
use crate::pins::PinId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// All actuator pins are configured and LOW.
    Started { solenoids: usize, erms: usize },

    /// A complete frame was decoded and is about to be dispatched.
    CommandReceived(Command),

    /// A pulse sequence drove its first actuator HIGH.
    PulseStarted { index: u8, pin: PinId },

    /// One phase finished and the next actuator went HIGH.
    PulseAdvanced { from: u8, to: u8 },

    /// The last phase finished; the scheduler is idle.
    PulseFinished,

    /// A new pulse command overwrote a running sequence.
    PulseCancelled { index: u8 },

    /// A pulse sequence hit a slot with no pin and was dropped.
    PulseAborted(PulseError),

    /// The stream head is not a known opcode.
    UnknownOpcode { opcode: u8, discarded: bool },

    /// Bytes were consumed but no command came out of them.
    FrameDropped(ProtocolError),
}
