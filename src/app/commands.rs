//! Typed commands decoded from the BLE UART byte stream.
//!
//! These are what the [`FrameDecoder`](crate::protocol::decoder::FrameDecoder)
//! hands to the [`ControllerService`](super::service::ControllerService).
//! Every multi-byte field is already in host order.

use embedded_hal::digital::PinState;

use crate::bits::Bitset;

/// Commands that a BLE central can send to the glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drive the addressed solenoids to `level`.
    DigitalWrite { targets: Bitset, level: PinState },

    /// Pulse the addressed actuators one after another, highest index
    /// first, each for `duration_ms`.
    TimedPulse { targets: Bitset, duration_ms: u32 },

    /// Set the PWM intensity (0–255) of the addressed ERM motors.
    PwmSet { targets: Bitset, intensity: u8 },
}

impl Command {
    /// The actuator bitset carried by every command.
    pub fn targets(&self) -> Bitset {
        match *self {
            Self::DigitalWrite { targets, .. }
            | Self::TimedPulse { targets, .. }
            | Self::PwmSet { targets, .. } => targets,
        }
    }

    pub fn digital_write(fingers: &[Finger], level: PinState) -> Self {
        Self::DigitalWrite {
            targets: fingers_to_bitset(fingers),
            level,
        }
    }

    pub fn timed_pulse(fingers: &[Finger], duration_ms: u32) -> Self {
        Self::TimedPulse {
            targets: fingers_to_bitset(fingers),
            duration_ms,
        }
    }

    pub fn pwm_set(fingers: &[Finger], intensity: u8) -> Self {
        Self::PwmSet {
            targets: fingers_to_bitset(fingers),
            intensity,
        }
    }
}

/// Fingers the glove has actuators on.  The discriminant is the bit
/// position in a command's target bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
    Palm = 5,
}

impl Finger {
    pub const ALL: [Finger; 6] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
        Self::Palm,
    ];

    pub const fn mask(self) -> Bitset {
        1 << self as u8
    }
}

/// Fold a finger list into a target bitset.  Duplicates are harmless.
pub fn fingers_to_bitset(fingers: &[Finger]) -> Bitset {
    fingers.iter().fold(0, |acc, f| acc | f.mask())
}
