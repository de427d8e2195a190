//! Portable [`PinDriver`] over `embedded-hal` 1.0 pins.
//!
//! For boards where the actuator pins are owned as typed HAL objects
//! (`esp_idf_hal::gpio::PinDriver`, `LedcDriver`, or another chip's HAL)
//! rather than addressed by raw GPIO number.  Each HAL pin is registered
//! under the [`PinId`] the actuator banks use.
//!
//! HAL errors are logged and swallowed: the port is fire-and-forget, the
//! same as the protocol above it.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use log::warn;

use crate::app::bank::MAX_BANK_SLOTS;
use crate::app::ports::{PinDriver, PinMode};
use crate::pins::{DIGITAL_FALLBACK_THRESHOLD, PinId};

/// [`PinDriver`] backed by digital outputs `D` and PWM outputs `W`.
pub struct HalPinDriver<D, W> {
    digital: Vec<(PinId, D), MAX_BANK_SLOTS>,
    pwm: Vec<(PinId, W), MAX_BANK_SLOTS>,
}

impl<D: OutputPin, W: SetDutyCycle> HalPinDriver<D, W> {
    pub fn new() -> Self {
        Self {
            digital: Vec::new(),
            pwm: Vec::new(),
        }
    }

    /// Register a digital output.  Returns the pin back if the table is full.
    pub fn add_digital(&mut self, id: PinId, pin: D) -> Result<(), D> {
        self.digital.push((id, pin)).map_err(|(_, pin)| pin)
    }

    /// Register a PWM output.  Returns the pin back if the table is full.
    pub fn add_pwm(&mut self, id: PinId, pin: W) -> Result<(), W> {
        self.pwm.push((id, pin)).map_err(|(_, pin)| pin)
    }

    fn digital_pin(&mut self, id: PinId) -> Option<&mut D> {
        self.digital.iter_mut().find(|(p, _)| *p == id).map(|(_, pin)| pin)
    }

    fn pwm_pin(&mut self, id: PinId) -> Option<&mut W> {
        self.pwm.iter_mut().find(|(p, _)| *p == id).map(|(_, pin)| pin)
    }
}

impl<D: OutputPin, W: SetDutyCycle> Default for HalPinDriver<D, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: OutputPin, W: SetDutyCycle> PinDriver for HalPinDriver<D, W> {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        // HAL output pins are outputs by type.
        if mode == PinMode::Input {
            warn!("hal: GPIO {} cannot be switched to input", pin);
        }
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        let failed = if let Some(out) = self.digital_pin(pin) {
            out.set_state(level).is_err()
        } else if let Some(out) = self.pwm_pin(pin) {
            match level {
                PinState::High => out.set_duty_cycle_fully_on().is_err(),
                PinState::Low => out.set_duty_cycle_fully_off().is_err(),
            }
        } else {
            warn!("hal: GPIO {} not registered", pin);
            return;
        };
        if failed {
            warn!("hal: GPIO {} write {:?} failed", pin, level);
        }
    }

    fn write_pwm(&mut self, pin: PinId, duty: u8) {
        let failed = if let Some(out) = self.pwm_pin(pin) {
            out.set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX))
                .is_err()
        } else if let Some(out) = self.digital_pin(pin) {
            out.set_state(PinState::from(duty >= DIGITAL_FALLBACK_THRESHOLD))
                .is_err()
        } else {
            warn!("hal: GPIO {} not registered", pin);
            return;
        };
        if failed {
            warn!("hal: GPIO {} duty {} failed", pin, duty);
        }
    }
}
