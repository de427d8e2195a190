//! Actuator banks: the mapping from a command's bit position to a pin.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::bits::{self, Bitset};
use crate::pins::PinId;

/// Upper bound on slots per bank; one per bitset position.
pub const MAX_BANK_SLOTS: usize = 32;

/// Pin list type stored in config and banks.
pub type PinList = Vec<PinId, MAX_BANK_SLOTS>;

/// Which physical bank a command family drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankId {
    Solenoid,
    Erm,
}

impl BankId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Solenoid => "solenoid",
            Self::Erm => "erm",
        }
    }
}

/// A fixed-size, ordered set of output pins.  Slot `n` answers bit `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorBank {
    id: BankId,
    pins: PinList,
}

impl ActuatorBank {
    pub fn new(id: BankId, pins: PinList) -> Self {
        Self { id, pins }
    }

    /// Build a bank from a slice, truncating past [`MAX_BANK_SLOTS`].
    pub fn from_slice(id: BankId, pins: &[PinId]) -> Self {
        let take = pins.len().min(MAX_BANK_SLOTS);
        let mut list = PinList::new();
        // Cannot fail: `take` never exceeds capacity.
        let _ = list.extend_from_slice(&pins[..take]);
        Self { id, pins: list }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn slot_count(&self) -> usize {
        self.pins.len()
    }

    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }

    /// Physical pin for a slot, or `None` if the slot does not exist.
    pub fn pin(&self, index: u8) -> Option<PinId> {
        self.pins.get(usize::from(index)).copied()
    }

    /// `(slot, pin)` pairs for every set bit of `targets` that falls inside
    /// the bank, ascending.  Bits past the slot count are skipped.
    pub fn addressed(&self, targets: Bitset) -> impl Iterator<Item = (u8, PinId)> + '_ {
        bits::set_bits(targets).filter_map(move |n| self.pin(n).map(|pin| (n, pin)))
    }
}
