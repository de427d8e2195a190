//! Unified error types for the TrueTouch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be logged and carried in events without allocation.
//!
//! None of these errors are ever sent back over the BLE link: the protocol
//! is fire-and-forget.  They surface through `log` and
//! [`AppEvent`](crate::app::events::AppEvent)s only.

use core::fmt;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A command frame could not be decoded.
    Protocol(ProtocolError),
    /// A pulse sequence was aborted.
    Pulse(PulseError),
    /// Configuration failed validation.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Pulse(e) => write!(f, "pulse: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Leading byte is not a known opcode.
    UnknownOpcode(u8),
    /// Fewer bytes than the opcode's fixed frame size.
    /// Recoverable: wait for more bytes.
    Incomplete { needed: usize, available: usize },
    /// The transport advertised a full frame but delivered less.
    ShortRead { expected: usize, got: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(op) => write!(f, "unknown opcode 0x{op:02X}"),
            Self::Incomplete { needed, available } => {
                write!(f, "incomplete frame ({available}/{needed} bytes)")
            }
            Self::ShortRead { expected, got } => {
                write!(f, "short read ({got}/{expected} bytes)")
            }
        }
    }
}

impl core::error::Error for ProtocolError {}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Pulse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseError {
    /// The next actuator to pulse has no physical pin in the bank.
    IndexOutOfBank { index: u8, slots: usize },
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBank { index, slots } => {
                write!(f, "actuator index {index} outside bank of {slots} slots")
            }
        }
    }
}

impl core::error::Error for PulseError {}

impl From<PulseError> for Error {
    fn from(e: PulseError) -> Self {
        Self::Pulse(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let e: Error = ProtocolError::UnknownOpcode(0x7F).into();
        assert_eq!(e.to_string(), "protocol: unknown opcode 0x7F");

        let e: Error = PulseError::IndexOutOfBank { index: 31, slots: 6 }.into();
        assert_eq!(e.to_string(), "pulse: actuator index 31 outside bank of 6 slots");

        let e: Error = HwInitError::LedcTimerFailed(-1).into();
        assert_eq!(e.to_string(), "init: LEDC timer config failed (rc=-1)");
    }

    #[test]
    fn incomplete_reports_progress() {
        let e = ProtocolError::Incomplete {
            needed: 9,
            available: 4,
        };
        assert_eq!(e.to_string(), "incomplete frame (4/9 bytes)");
    }
}
