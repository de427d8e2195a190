//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService (domain)
//! ```
//!
//! Driven adapters (GPIO, LEDC, clock, event sinks) implement these traits.
//! The [`ControllerService`](super::service::ControllerService) and the
//! [`PulseScheduler`](crate::scheduler::PulseScheduler) consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! The inbound byte stream port lives next to the decoder, in
//! [`protocol::transport`](crate::protocol::transport).

use embedded_hal::digital::PinState;

use crate::pins::PinId;

// ───────────────────────────────────────────────────────────────
// Pin driver port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Direction of a GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Write-side port: the domain calls this to drive actuator pins.
///
/// Pins are identified by their physical number; the mapping from command
/// slot to pin is the [`ActuatorBank`](super::bank::ActuatorBank)'s job.
pub trait PinDriver {
    /// Configure the direction of a pin.
    fn set_mode(&mut self, pin: PinId, mode: PinMode);

    /// Drive a pin HIGH or LOW.
    fn write_digital(&mut self, pin: PinId, level: PinState);

    /// Set the PWM duty of a pin (0 = off, 255 = fully on).
    fn write_pwm(&mut self, pin: PinId, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps at `u32::MAX`; every consumer
/// compares instants with `wrapping_sub`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
