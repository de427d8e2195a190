//! Sequential pulse scheduler.
//!
//! Drives a set of actuators HIGH one at a time, each for the same
//! duration, from the highest addressed slot down to the lowest.  There is
//! never a gap between phases and never more than one actuator HIGH.
//!
//! ```text
//!   targets = 0b101, duration = 50 ms
//!
//!   slot 2  ▁▁▔▔▔▔▔▔▔▔▁▁▁▁▁▁▁▁▁▁▁▁
//!   slot 0  ▁▁▁▁▁▁▁▁▁▁▔▔▔▔▔▔▔▔▁▁▁▁
//!           t=0       t=50    t=100 → Idle
//! ```
//!
//! The scheduler is advanced by [`PulseScheduler::tick`] from the service
//! loop, so phase accuracy is bounded by the loop's poll interval.

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::bank::ActuatorBank;
use crate::app::ports::PinDriver;
use crate::bits::{self, Bitset};
use crate::error::PulseError;
use crate::pins::PinId;

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

/// Scheduler state.  An idle scheduler carries no stale fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PulseState {
    #[default]
    Idle,
    Pulsing {
        /// Slots still owed a pulse, the active one included.
        pending: Bitset,
        duration_ms: u32,
        /// When the active slot went HIGH.
        phase_start_ms: u32,
    },
}

/// What a [`PulseScheduler::start`] or [`PulseScheduler::tick`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseTransition {
    /// First slot of a new sequence went HIGH.  `cancelled` is the slot
    /// of an overwritten sequence that was forced LOW first.
    Started {
        index: u8,
        pin: PinId,
        cancelled: Option<u8>,
    },
    /// Slot `from` went LOW and slot `to` went HIGH.
    Advanced { from: u8, to: u8, pin: PinId },
    /// The last slot went LOW.
    Finished { last: u8 },
    /// A running sequence was overwritten by an empty one.
    Cancelled { index: u8 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct PulseScheduler {
    state: PulseState,
}

impl PulseScheduler {
    pub const fn new() -> Self {
        Self {
            state: PulseState::Idle,
        }
    }

    pub fn state(&self) -> PulseState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, PulseState::Idle)
    }

    /// Slot currently HIGH, if any.
    pub fn active_index(&self) -> Option<u8> {
        match self.state {
            PulseState::Idle => None,
            PulseState::Pulsing { pending, .. } => bits::highest_bit(pending),
        }
    }

    /// Slots still owed a pulse (0 when idle).
    pub fn pending(&self) -> Bitset {
        match self.state {
            PulseState::Idle => 0,
            PulseState::Pulsing { pending, .. } => pending,
        }
    }

    /// Begin a new sequence, overwriting any running one.
    ///
    /// Returns `Ok(None)` for an empty `targets` on an idle scheduler.
    /// If the highest addressed slot has no pin the sequence is aborted
    /// before anything goes HIGH.
    pub fn start<P: PinDriver + ?Sized>(
        &mut self,
        targets: Bitset,
        duration_ms: u32,
        now_ms: u32,
        bank: &ActuatorBank,
        pins: &mut P,
    ) -> Result<Option<PulseTransition>, PulseError> {
        let cancelled = self.force_active_low(bank, pins);
        self.state = PulseState::Idle;

        let Some(index) = bits::highest_bit(targets) else {
            return Ok(cancelled.map(|index| PulseTransition::Cancelled { index }));
        };
        let pin = Self::drive_high(index, bank, pins)?;

        self.state = PulseState::Pulsing {
            pending: targets,
            duration_ms,
            phase_start_ms: now_ms,
        };
        debug!("PULSE | start mask=0x{targets:08X} dur={duration_ms}ms slot={index}");
        Ok(Some(PulseTransition::Started {
            index,
            pin,
            cancelled,
        }))
    }

    /// Advance the sequence if the active phase has run its course.
    ///
    /// Elapsed time uses wrapping arithmetic, so a phase spanning the
    /// `u32` millisecond rollover still lasts `duration_ms`.
    pub fn tick<P: PinDriver + ?Sized>(
        &mut self,
        now_ms: u32,
        bank: &ActuatorBank,
        pins: &mut P,
    ) -> Result<Option<PulseTransition>, PulseError> {
        let PulseState::Pulsing {
            mut pending,
            duration_ms,
            phase_start_ms,
        } = self.state
        else {
            return Ok(None);
        };

        if now_ms.wrapping_sub(phase_start_ms) < duration_ms {
            return Ok(None);
        }

        let Some(from) = bits::highest_bit(pending) else {
            self.state = PulseState::Idle;
            return Ok(None);
        };
        if let Some(pin) = bank.pin(from) {
            pins.write_digital(pin, PinState::Low);
        }
        bits::clear_highest_bit(&mut pending);

        let Some(to) = bits::highest_bit(pending) else {
            self.state = PulseState::Idle;
            return Ok(Some(PulseTransition::Finished { last: from }));
        };

        let pin = match Self::drive_high(to, bank, pins) {
            Ok(pin) => pin,
            Err(e) => {
                self.state = PulseState::Idle;
                return Err(e);
            }
        };
        self.state = PulseState::Pulsing {
            pending,
            duration_ms,
            phase_start_ms: now_ms,
        };
        Ok(Some(PulseTransition::Advanced { from, to, pin }))
    }

    /// Drop a running sequence, forcing its active slot LOW.
    pub fn cancel<P: PinDriver + ?Sized>(
        &mut self,
        bank: &ActuatorBank,
        pins: &mut P,
    ) -> Option<PulseTransition> {
        let cancelled = self.force_active_low(bank, pins);
        self.state = PulseState::Idle;
        cancelled.map(|index| PulseTransition::Cancelled { index })
    }

    fn force_active_low<P: PinDriver + ?Sized>(
        &self,
        bank: &ActuatorBank,
        pins: &mut P,
    ) -> Option<u8> {
        let index = self.active_index()?;
        if let Some(pin) = bank.pin(index) {
            pins.write_digital(pin, PinState::Low);
        }
        Some(index)
    }

    fn drive_high<P: PinDriver + ?Sized>(
        index: u8,
        bank: &ActuatorBank,
        pins: &mut P,
    ) -> Result<PinId, PulseError> {
        let pin = bank.pin(index).ok_or(PulseError::IndexOutOfBank {
            index,
            slots: bank.slot_count(),
        })?;
        pins.write_digital(pin, PinState::High);
        Ok(pin)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
