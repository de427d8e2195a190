//! One-shot hardware peripheral initialization and raw pin helpers.
//!
//! Configures the actuator GPIOs and the LEDC timer/channels using raw
//! ESP-IDF sys calls. Called once from `main()` before the service loop
//! starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::PinMode;
use crate::config::ControllerConfig;
use crate::error;
use crate::pins::{LEDC_CHANNEL_COUNT, PWM_RESOLUTION_BITS, PinId};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── LEDC channel map ──────────────────────────────────────────

/// `(gpio, ledc channel)` for every PWM-capable actuator pin.
pub type LedcChannelMap = heapless::Vec<(PinId, u32), LEDC_CHANNEL_COUNT>;

/// Duty value that holds an LEDC output permanently HIGH.
pub const LEDC_FULL_DUTY: u32 = 1 << PWM_RESOLUTION_BITS;

/// Give each ERM pin its own LEDC channel, in slot order.  Pins past the
/// channel count stay plain GPIOs.
pub fn assign_ledc_channels(erm_pins: &[PinId]) -> LedcChannelMap {
    let mut map = LedcChannelMap::new();
    for (channel, &pin) in erm_pins.iter().enumerate() {
        if map.push((pin, channel as u32)).is_err() {
            warn!(
                "hw_init: no LEDC channel left for GPIO {} ({} max), PWM falls back to on/off",
                pin, LEDC_CHANNEL_COUNT
            );
        }
    }
    map
}

pub fn ledc_channel_for(map: &LedcChannelMap, pin: PinId) -> Option<u32> {
    map.iter().find(|&&(p, _)| p == pin).map(|&(_, ch)| ch)
}

// ── Entry point ───────────────────────────────────────────────

/// Validate `config` and configure every actuator peripheral from it.
///
/// Returns the LEDC channel map the pin driver needs.
pub fn bring_up(config: &ControllerConfig) -> error::Result<LedcChannelMap> {
    config.validate()?;
    Ok(init_peripherals(config)?)
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &ControllerConfig) -> Result<LedcChannelMap, HwInitError> {
    let channels = assign_ledc_channels(&config.erm_pins);
    // SAFETY: Called once from main() before the service loop; single-threaded.
    unsafe {
        init_gpio_outputs(config)?;
        init_ledc(config.pwm_frequency_hz, &channels)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(channels)
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(config: &ControllerConfig) -> Result<LedcChannelMap, HwInitError> {
    info!("hw_init(sim): peripheral init skipped");
    Ok(assign_ledc_channels(&config.erm_pins))
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(config: &ControllerConfig) -> Result<(), HwInitError> {
    let output_pins = config.solenoid_pins.iter().chain(config.erm_pins.iter());

    for &pin in output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!(
        "hw_init: GPIO outputs configured ({} solenoid, {} ERM)",
        config.solenoid_pins.len(),
        config.erm_pins.len()
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_set_mode(pin: PinId, mode: PinMode) {
    let mode = match mode {
        PinMode::Input => gpio_mode_t_GPIO_MODE_INPUT,
        PinMode::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
    };
    // SAFETY: direction register write on a board-owned pin; main loop only.
    unsafe { gpio_set_direction(pin, mode); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_mode(_pin: PinId, _mode: PinMode) {}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: PinId, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was configured during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: PinId, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc(freq_hz: u32, channels: &LedcChannelMap) -> Result<(), HwInitError> {
    // Timer 0: all ERM motors share one carrier (8-bit).
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    for &(gpio, channel) in channels {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcChannelFailed(ret)); }
    }

    info!("hw_init: LEDC configured ({} Hz, {} ERM channels)", freq_hz, channels.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u32) {}
