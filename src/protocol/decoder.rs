//! Frame reassembly on top of a [`ByteStream`].
//!
//! The decoder keeps no partial-frame buffer of its own.  It peeks the
//! opcode, waits until the stream holds the whole fixed-size frame, and
//! only then consumes it.  A frame split over any number of BLE writes
//! therefore decodes exactly like one delivered in a single write.

use log::debug;
use serde::{Deserialize, Serialize};

use super::codec::{self, MAX_FRAME_SIZE, Opcode};
use super::transport::ByteStream;
use crate::app::commands::Command;
use crate::error::ProtocolError;

/// What to do when the byte at the head of the stream is not an opcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownOpcodePolicy {
    /// Drop the offending byte and resynchronise on the next one.
    #[default]
    Discard,
    /// Leave the byte in place.  The stream is wedged until it is cleared
    /// (the BLE adapter clears it on every new connection).
    Stall,
}

/// Stateful frame decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    policy: UnknownOpcodePolicy,
    /// Opcode already reported while stalled, so it is reported once.
    stalled_on: Option<u8>,
}

impl FrameDecoder {
    pub const fn new(policy: UnknownOpcodePolicy) -> Self {
        Self {
            policy,
            stalled_on: None,
        }
    }

    pub fn policy(&self) -> UnknownOpcodePolicy {
        self.policy
    }

    /// Whether the decoder is stuck behind an unknown opcode.
    pub fn is_stalled(&self) -> bool {
        self.stalled_on.is_some()
    }

    /// Try to take one command off the stream.
    ///
    /// - `Ok(None)`: nothing to do yet (empty stream, incomplete frame, or
    ///   an already-reported stall).
    /// - `Ok(Some(cmd))`: exactly one frame was consumed.
    /// - `Err(UnknownOpcode)`: the head byte is not an opcode; under
    ///   [`UnknownOpcodePolicy::Discard`] that byte has been consumed.
    /// - `Err(ShortRead)`: the stream under-delivered; the partial frame
    ///   is gone.
    pub fn poll_once<S: ByteStream + ?Sized>(
        &mut self,
        stream: &mut S,
    ) -> Result<Option<Command>, ProtocolError> {
        let Some(head) = stream.peek() else {
            self.stalled_on = None;
            return Ok(None);
        };

        let opcode = match Opcode::try_from(head) {
            Ok(op) => {
                self.stalled_on = None;
                op
            }
            Err(e) => return self.reject(stream, head, e),
        };

        let size = opcode.frame_size();
        let available = stream.available();
        if available < size {
            debug!("PROTO | waiting for {opcode:?} frame ({available}/{size} bytes)");
            return Ok(None);
        }

        let mut frame = [0u8; MAX_FRAME_SIZE];
        let got = stream.read(&mut frame[..size]);
        if got < size {
            return Err(ProtocolError::ShortRead {
                expected: size,
                got,
            });
        }

        codec::decode(&frame[..size]).map(Some)
    }

    fn reject<S: ByteStream + ?Sized>(
        &mut self,
        stream: &mut S,
        head: u8,
        err: ProtocolError,
    ) -> Result<Option<Command>, ProtocolError> {
        match self.policy {
            UnknownOpcodePolicy::Discard => {
                let mut dropped = [0u8; 1];
                stream.read(&mut dropped);
                Err(err)
            }
            UnknownOpcodePolicy::Stall => {
                if self.stalled_on == Some(head) {
                    return Ok(None);
                }
                self.stalled_on = Some(head);
                Err(err)
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(UnknownOpcodePolicy::default())
    }
}
