//! Hardware adapter: bridges the actuator GPIOs to the [`PinDriver`] port.
//!
//! This is the only module in the system that drives actuator pins.  On
//! non-espidf targets the underlying `hw_init` helpers are simulation
//! stubs and the adapter only tracks what it would have written.
//!
//! ERM pins own an LEDC channel, so a digital write to them is expressed
//! as 0 % / 100 % duty instead of a GPIO level (the LEDC peripheral keeps
//! driving the pin otherwise).  Their direction is never touched after
//! init either: enabling a GPIO output reroutes the pad to the plain GPIO
//! signal and detaches the LEDC channel.

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::{PinDriver, PinMode};
use crate::drivers::hw_init::{self, LEDC_FULL_DUTY, LedcChannelMap};
use crate::pins::{DIGITAL_FALLBACK_THRESHOLD, PinId};

/// Last value written to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutput {
    Digital(PinState),
    Pwm(u8),
}

/// Concrete [`PinDriver`] over ESP32 GPIO + LEDC.
pub struct GpioPinDriver {
    channels: LedcChannelMap,
    outputs: heapless::Vec<(PinId, PinOutput), 64>,
    modes: heapless::Vec<(PinId, PinMode), 64>,
}

impl GpioPinDriver {
    pub fn new(channels: LedcChannelMap) -> Self {
        Self {
            channels,
            outputs: heapless::Vec::new(),
            modes: heapless::Vec::new(),
        }
    }

    /// Last value written to `pin`, if any.
    pub fn output(&self, pin: PinId) -> Option<PinOutput> {
        self.outputs
            .iter()
            .find(|&&(p, _)| p == pin)
            .map(|&(_, out)| out)
    }

    /// Direction last applied to `pin` through [`PinDriver::set_mode`].
    pub fn mode(&self, pin: PinId) -> Option<PinMode> {
        self.modes
            .iter()
            .find(|&&(p, _)| p == pin)
            .map(|&(_, mode)| mode)
    }

    fn record(&mut self, pin: PinId, out: PinOutput) {
        if let Some(slot) = self.outputs.iter_mut().find(|(p, _)| *p == pin) {
            slot.1 = out;
        } else if self.outputs.push((pin, out)).is_err() {
            debug!("hw: output table full, GPIO {} not tracked", pin);
        }
    }
}

// ── PinDriver implementation ──────────────────────────────────

impl PinDriver for GpioPinDriver {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        if hw_init::ledc_channel_for(&self.channels, pin).is_some() {
            debug!("hw: GPIO {} is LEDC-routed, {:?} ignored", pin, mode);
            return;
        }
        hw_init::gpio_set_mode(pin, mode);
        if let Some(slot) = self.modes.iter_mut().find(|(p, _)| *p == pin) {
            slot.1 = mode;
        } else if self.modes.push((pin, mode)).is_err() {
            debug!("hw: mode table full, GPIO {} not tracked", pin);
        }
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        let high = level == PinState::High;
        match hw_init::ledc_channel_for(&self.channels, pin) {
            Some(ch) => hw_init::ledc_set(ch, if high { LEDC_FULL_DUTY } else { 0 }),
            None => hw_init::gpio_write(pin, high),
        }
        self.record(pin, PinOutput::Digital(level));
    }

    fn write_pwm(&mut self, pin: PinId, duty: u8) {
        match hw_init::ledc_channel_for(&self.channels, pin) {
            Some(ch) => hw_init::ledc_set(ch, u32::from(duty)),
            None => {
                debug!("hw: GPIO {} has no PWM channel, duty {} as on/off", pin, duty);
                hw_init::gpio_write(pin, duty >= DIGITAL_FALLBACK_THRESHOLD);
            }
        }
        self.record(pin, PinOutput::Pwm(duty));
    }
}
