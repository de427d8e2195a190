//! Controller service: the hexagonal core.
//!
//! [`ControllerService`] owns the frame decoder, the pulse scheduler and
//! the actuator banks.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  ByteStream ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!       Clock ──▶ │    ControllerService     │
//!                 │ Decoder · PulseScheduler │ ──▶ PinDriver
//!                 └──────────────────────────┘
//! ```

use embedded_hal::digital::PinState;
use log::{debug, info};

use crate::bits::Bitset;
use crate::config::{ControllerConfig, UnknownOpcodePolicy};
use crate::error::{ProtocolError, PulseError};
use crate::protocol::decoder::FrameDecoder;
use crate::protocol::transport::ByteStream;
use crate::scheduler::{PulseScheduler, PulseTransition};

use super::bank::{ActuatorBank, BankId};
use super::commands::Command;
use super::events::AppEvent;
use super::ports::{Clock, EventSink, PinDriver, PinMode};

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

/// Decodes commands and drives the actuator banks.
pub struct ControllerService {
    decoder: FrameDecoder,
    pulses: PulseScheduler,
    solenoids: ActuatorBank,
    erms: ActuatorBank,
    pulse_bank: BankId,
}

impl ControllerService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any pin; call [`init`](Self::init) next.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(config.unknown_opcode),
            pulses: PulseScheduler::new(),
            solenoids: config.solenoid_bank(),
            erms: config.erm_bank(),
            pulse_bank: config.pulse_bank,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure every actuator pin as an output and drive it LOW.
    pub fn init(&mut self, pins: &mut impl PinDriver, sink: &mut impl EventSink) {
        for &pin in self.solenoids.pins().iter().chain(self.erms.pins()) {
            pins.set_mode(pin, PinMode::Output);
            pins.write_digital(pin, PinState::Low);
        }
        sink.emit(&AppEvent::Started {
            solenoids: self.solenoids.slot_count(),
            erms: self.erms.slot_count(),
        });
        info!(
            "ControllerService started ({} solenoids, {} ERMs, pulses on {} bank)",
            self.solenoids.slot_count(),
            self.erms.slot_count(),
            self.pulse_bank.label()
        );
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One cooperative step: advance the pulse sequence, then take at most
    /// one command off the stream.
    pub fn service(
        &mut self,
        stream: &mut impl ByteStream,
        pins: &mut impl PinDriver,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        self.tick_pulses(clock.now_ms(), pins, sink);
        self.poll_once(stream, pins, clock, sink);
    }

    /// Advance the pulse scheduler only.
    pub fn tick_pulses(&mut self, now_ms: u32, pins: &mut impl PinDriver, sink: &mut impl EventSink) {
        let bank = match self.pulse_bank {
            BankId::Solenoid => &self.solenoids,
            BankId::Erm => &self.erms,
        };
        let result = self.pulses.tick(now_ms, bank, pins);
        Self::report_pulse(result, sink);
    }

    /// Decode and dispatch at most one frame.  Returns the dispatched
    /// command, if any.
    pub fn poll_once(
        &mut self,
        stream: &mut impl ByteStream,
        pins: &mut impl PinDriver,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Option<Command> {
        match self.decoder.poll_once(stream) {
            Ok(Some(cmd)) => {
                sink.emit(&AppEvent::CommandReceived(cmd));
                self.handle_command(cmd, pins, clock, sink);
                Some(cmd)
            }
            Ok(None) => None,
            Err(ProtocolError::UnknownOpcode(opcode)) => {
                let discarded = self.decoder.policy() == UnknownOpcodePolicy::Discard;
                sink.emit(&AppEvent::UnknownOpcode { opcode, discarded });
                None
            }
            Err(e) => {
                sink.emit(&AppEvent::FrameDropped(e));
                None
            }
        }
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Route a decoded command to its handler.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        pins: &mut impl PinDriver,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            Command::DigitalWrite { targets, level } => self.digital_write(targets, level, pins),
            Command::PwmSet { targets, intensity } => self.pwm_set(targets, intensity, pins),
            Command::TimedPulse {
                targets,
                duration_ms,
            } => self.timed_pulse(targets, duration_ms, clock.now_ms(), pins, sink),
        }
    }

    fn digital_write(&self, targets: Bitset, level: PinState, pins: &mut impl PinDriver) {
        debug!("CMD | digital write mask=0x{targets:08X} level={level:?}");
        for (slot, pin) in self.solenoids.addressed(targets) {
            debug!("CMD |   solenoid {slot} (gpio {pin}) -> {level:?}");
            pins.write_digital(pin, level);
        }
    }

    fn pwm_set(&self, targets: Bitset, intensity: u8, pins: &mut impl PinDriver) {
        debug!("CMD | pwm set mask=0x{targets:08X} intensity={intensity}");
        for (slot, pin) in self.erms.addressed(targets) {
            debug!("CMD |   erm {slot} (gpio {pin}) -> {intensity}");
            pins.write_pwm(pin, intensity);
        }
    }

    fn timed_pulse(
        &mut self,
        targets: Bitset,
        duration_ms: u32,
        now_ms: u32,
        pins: &mut impl PinDriver,
        sink: &mut impl EventSink,
    ) {
        debug!("CMD | timed pulse mask=0x{targets:08X} duration={duration_ms}ms");
        let bank = match self.pulse_bank {
            BankId::Solenoid => &self.solenoids,
            BankId::Erm => &self.erms,
        };
        let previous = self.pulses.active_index();
        let result = self.pulses.start(targets, duration_ms, now_ms, bank, pins);
        // An aborted restart still forced the previous slot LOW.
        if let (Err(_), Some(index)) = (&result, previous) {
            sink.emit(&AppEvent::PulseCancelled { index });
        }
        Self::report_pulse(result, sink);
    }

    fn report_pulse(
        result: Result<Option<PulseTransition>, PulseError>,
        sink: &mut impl EventSink,
    ) {
        match result {
            Ok(None) => {}
            Ok(Some(PulseTransition::Started {
                index,
                pin,
                cancelled,
            })) => {
                if let Some(prev) = cancelled {
                    sink.emit(&AppEvent::PulseCancelled { index: prev });
                }
                sink.emit(&AppEvent::PulseStarted { index, pin });
            }
            Ok(Some(PulseTransition::Advanced { from, to, .. })) => {
                sink.emit(&AppEvent::PulseAdvanced { from, to });
            }
            Ok(Some(PulseTransition::Finished { .. })) => sink.emit(&AppEvent::PulseFinished),
            Ok(Some(PulseTransition::Cancelled { index })) => {
                sink.emit(&AppEvent::PulseCancelled { index });
            }
            Err(e) => sink.emit(&AppEvent::PulseAborted(e)),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn pulses(&self) -> &PulseScheduler {
        &self.pulses
    }
}
