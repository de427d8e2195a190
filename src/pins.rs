//! GPIO / peripheral pin assignments for the TrueTouch glove board.
//!
//! Single source of truth for the default actuator wiring.  Slot order
//! follows the finger order of [`Finger`](crate::app::commands::Finger):
//! thumb, index, middle, ring, pinky, palm.  The pin lists are copied into
//! [`ControllerConfig`](crate::config::ControllerConfig) so a board variant
//! only needs a different config, not a different build.

/// GPIO number as used by the ESP-IDF driver API.
pub type PinId = i32;

// ---------------------------------------------------------------------------
// Solenoids (digital, via low-side MOSFETs)
// ---------------------------------------------------------------------------

/// Number of solenoid slots (no palm solenoid).
pub const SOLENOID_COUNT: usize = 5;

/// Solenoid drive pins, thumb → pinky.
pub const SOLENOID_GPIOS: [PinId; SOLENOID_COUNT] = [4, 5, 6, 7, 15];

// ---------------------------------------------------------------------------
// ERM vibration motors (PWM, via motor driver)
// ---------------------------------------------------------------------------

/// Number of ERM motor slots.
pub const ERM_COUNT: usize = 6;

/// ERM drive pins, thumb → palm.
pub const ERM_GPIOS: [PinId; ERM_COUNT] = [16, 17, 18, 8, 3, 46];

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels, which
/// matches the wire `intensity` byte one-to-one.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the ERM motors (20 kHz, above hearing).
pub const ERM_PWM_FREQ_HZ: u32 = 20_000;
/// Number of LEDC channels available for actuator PWM.
pub const LEDC_CHANNEL_COUNT: usize = 8;

/// Duty at or above which a pin without a PWM output is driven HIGH.
pub const DIGITAL_FALLBACK_THRESHOLD: u8 = 128;
