//! Fixed-size command frame codec.
//!
//! Wire format (no length prefix, no delimiter; the opcode implies the
//! frame size; multi-byte fields are big-endian):
//! ```text
//! DIGITAL_WRITE  ┌──────┬──────────────────┬───────────┐
//!                │ 0x01 │ target bitset 4B │ level 1B  │   6 bytes
//!                └──────┴──────────────────┴───────────┘
//! TIMED_PULSE    ┌──────┬──────────────────┬──────────────────┐
//!                │ 0x02 │ target bitset 4B │ duration_ms 4B   │   9 bytes
//!                └──────┴──────────────────┴──────────────────┘
//! PWM_SET        ┌──────┬──────────────────┬───────────────┐
//!                │ 0x03 │ target bitset 4B │ intensity 1B  │   6 bytes
//!                └──────┴──────────────────┴───────────────┘
//! ```
//!
//! Opcode values are frozen: deployed desktop clients send these bytes.

use embedded_hal::digital::PinState;

use crate::app::commands::Command;
use crate::error::ProtocolError;

/// Largest frame of any opcode.
pub const MAX_FRAME_SIZE: usize = 9;

/// Offset of the target bitset, right after the opcode byte.
const TARGETS_OFFSET: usize = 1;
/// Offset of the opcode-specific trailing field.
const ARG_OFFSET: usize = 5;

/// Level byte meaning "drive HIGH"; anything else drives LOW.
pub const LEVEL_HIGH: u8 = 1;
pub const LEVEL_LOW: u8 = 0;

/// Command opcodes.  Never renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    DigitalWrite = 0x01,
    TimedPulse = 0x02,
    PwmSet = 0x03,
}

impl Opcode {
    /// Total frame size including the opcode byte.
    pub const fn frame_size(self) -> usize {
        match self {
            Self::DigitalWrite | Self::PwmSet => 6,
            Self::TimedPulse => 9,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Self::DigitalWrite),
            0x02 => Ok(Self::TimedPulse),
            0x03 => Ok(Self::PwmSet),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

impl From<&Command> for Opcode {
    fn from(cmd: &Command) -> Self {
        match cmd {
            Command::DigitalWrite { .. } => Self::DigitalWrite,
            Command::TimedPulse { .. } => Self::TimedPulse,
            Command::PwmSet { .. } => Self::PwmSet,
        }
    }
}

fn read_u32_be(frame: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&frame[offset..offset + 4]);
    u32::from_be_bytes(raw)
}

/// Decode one complete frame (opcode byte first) into a host-order command.
///
/// `frame` may be longer than the opcode's frame size; trailing bytes are
/// ignored.
pub fn decode(frame: &[u8]) -> Result<Command, ProtocolError> {
    let Some(&first) = frame.first() else {
        return Err(ProtocolError::Incomplete {
            needed: 1,
            available: 0,
        });
    };
    let opcode = Opcode::try_from(first)?;
    let needed = opcode.frame_size();
    if frame.len() < needed {
        return Err(ProtocolError::Incomplete {
            needed,
            available: frame.len(),
        });
    }

    let targets = read_u32_be(frame, TARGETS_OFFSET);
    let cmd = match opcode {
        Opcode::DigitalWrite => Command::DigitalWrite {
            targets,
            level: PinState::from(frame[ARG_OFFSET] == LEVEL_HIGH),
        },
        Opcode::TimedPulse => Command::TimedPulse {
            targets,
            duration_ms: read_u32_be(frame, ARG_OFFSET),
        },
        Opcode::PwmSet => Command::PwmSet {
            targets,
            intensity: frame[ARG_OFFSET],
        },
    };
    Ok(cmd)
}

/// Encode a command into its wire frame.
///
/// Writes the frame into `out_buf` and returns the number of bytes
/// written, or `None` if `out_buf` is too small.
pub fn encode(cmd: &Command, out_buf: &mut [u8]) -> Option<usize> {
    let opcode = Opcode::from(cmd);
    let total = opcode.frame_size();
    if out_buf.len() < total {
        return None;
    }

    out_buf[0] = opcode as u8;
    out_buf[TARGETS_OFFSET..ARG_OFFSET].copy_from_slice(&cmd.targets().to_be_bytes());
    match *cmd {
        Command::DigitalWrite { level, .. } => {
            out_buf[ARG_OFFSET] = match level {
                PinState::High => LEVEL_HIGH,
                PinState::Low => LEVEL_LOW,
            };
        }
        Command::TimedPulse { duration_ms, .. } => {
            out_buf[ARG_OFFSET..total].copy_from_slice(&duration_ms.to_be_bytes());
        }
        Command::PwmSet { intensity, .. } => {
            out_buf[ARG_OFFSET] = intensity;
        }
    }

    Some(total)
}
