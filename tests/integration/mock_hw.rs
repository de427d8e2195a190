//! Mock adapters for integration tests.
//!
//! Records every pin call so tests can assert on the full write history
//! without touching real GPIO/LEDC registers.

use std::cell::Cell;

use embedded_hal::digital::PinState;
use truetouch::app::commands::Command;
use truetouch::app::events::AppEvent;
use truetouch::app::ports::{Clock, EventSink, PinDriver, PinMode};
use truetouch::pins::PinId;
use truetouch::protocol::codec;

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Mode(PinId, PinMode),
    Digital(PinId, PinState),
    Pwm(PinId, u8),
}

// ── MockPins ──────────────────────────────────────────────────

pub struct MockPins {
    pub calls: Vec<PinCall>,
}

#[allow(dead_code)]
impl MockPins {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Current level of `pin`, replaying the digital history.
    pub fn level(&self, pin: PinId) -> PinState {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match *c {
                PinCall::Digital(p, level) if p == pin => Some(level),
                _ => None,
            })
            .unwrap_or(PinState::Low)
    }

    /// Pins currently HIGH among `candidates`.
    pub fn high_pins(&self, candidates: &[PinId]) -> Vec<PinId> {
        candidates
            .iter()
            .copied()
            .filter(|&p| self.level(p) == PinState::High)
            .collect()
    }

    pub fn digital_writes(&self) -> Vec<(PinId, PinState)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                PinCall::Digital(p, l) => Some((p, l)),
                _ => None,
            })
            .collect()
    }

    pub fn pwm_writes(&self) -> Vec<(PinId, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                PinCall::Pwm(p, d) => Some((p, d)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockPins {
    fn default() -> Self {
        Self::new()
    }
}

impl PinDriver for MockPins {
    fn set_mode(&mut self, pin: PinId, mode: PinMode) {
        self.calls.push(PinCall::Mode(pin, mode));
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        self.calls.push(PinCall::Digital(pin, level));
    }

    fn write_pwm(&mut self, pin: PinId, duty: u8) {
        self.calls.push(PinCall::Pwm(pin, duty));
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock the test advances by hand.
pub struct ManualClock(Cell<u32>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self(Cell::new(start_ms))
    }

    pub fn set(&self, ms: u32) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                AppEvent::CommandReceived(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Wire bytes of a command.
#[allow(dead_code)]
pub fn frame(cmd: &Command) -> Vec<u8> {
    let mut buf = [0u8; codec::MAX_FRAME_SIZE];
    let n = codec::encode(cmd, &mut buf).expect("frame buffer large enough");
    buf[..n].to_vec()
}
