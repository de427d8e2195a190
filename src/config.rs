//! Controller configuration parameters
//!
//! All tunable parameters for the TrueTouch controller.  The firmware boots
//! with [`ControllerConfig::default`]; the type is serde-ready so a board
//! variant can ship its own wiring.

use serde::{Deserialize, Serialize};

use crate::app::bank::{ActuatorBank, BankId, MAX_BANK_SLOTS, PinList};
use crate::error::ConfigError;
use crate::pins::{ERM_GPIOS, ERM_PWM_FREQ_HZ, SOLENOID_GPIOS};

pub use crate::protocol::decoder::UnknownOpcodePolicy;

/// Longest poll interval that still keeps pulse phases within a few
/// milliseconds of their requested length.
pub const MAX_POLL_INTERVAL_MS: u32 = 50;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Wiring ---
    /// Solenoid drive pins, slot order (DIGITAL_WRITE)
    pub solenoid_pins: PinList,
    /// ERM motor drive pins, slot order (PWM_SET)
    pub erm_pins: PinList,
    /// Bank driven by TIMED_PULSE
    pub pulse_bank: BankId,

    // --- Protocol ---
    /// Reaction to a byte that is not an opcode
    pub unknown_opcode: UnknownOpcodePolicy,

    // --- Timing ---
    /// Main loop poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// ERM PWM carrier frequency (Hz)
    pub pwm_frequency_hz: u32,
}

fn pin_list(pins: &[i32]) -> PinList {
    let mut list = PinList::new();
    for &p in pins.iter().take(MAX_BANK_SLOTS) {
        let _ = list.push(p);
    }
    list
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Wiring
            solenoid_pins: pin_list(&SOLENOID_GPIOS),
            erm_pins: pin_list(&ERM_GPIOS),
            pulse_bank: BankId::Erm,

            // Protocol
            unknown_opcode: UnknownOpcodePolicy::Discard,

            // Timing
            poll_interval_ms: 1,                // 1 kHz
            pwm_frequency_hz: ERM_PWM_FREQ_HZ, // inaudible
        }
    }
}

impl ControllerConfig {
    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solenoid_pins.is_empty() {
            return Err(ConfigError::ValidationFailed("solenoid_pins is empty"));
        }
        if self.erm_pins.is_empty() {
            return Err(ConfigError::ValidationFailed("erm_pins is empty"));
        }
        if self.solenoid_pins.iter().chain(self.erm_pins.iter()).any(|&p| p < 0) {
            return Err(ConfigError::ValidationFailed("negative GPIO number"));
        }

        let all: heapless::Vec<i32, { 2 * MAX_BANK_SLOTS }> = self
            .solenoid_pins
            .iter()
            .chain(self.erm_pins.iter())
            .copied()
            .collect();
        for (i, p) in all.iter().enumerate() {
            if all[i + 1..].contains(p) {
                return Err(ConfigError::ValidationFailed("GPIO assigned twice"));
            }
        }

        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be in 1..=50",
            ));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::ValidationFailed("pwm_frequency_hz must be > 0"));
        }
        Ok(())
    }

    pub fn solenoid_bank(&self) -> ActuatorBank {
        ActuatorBank::new(BankId::Solenoid, self.solenoid_pins.clone())
    }

    pub fn erm_bank(&self) -> ActuatorBank {
        ActuatorBank::new(BankId::Erm, self.erm_pins.clone())
    }
}
