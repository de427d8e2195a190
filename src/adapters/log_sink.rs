//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Per-command and per-phase records are `debug`; a 1 kHz pulse train at
//! `info` would saturate the console.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { solenoids, erms } => {
                info!("START | solenoids={} erms={}", solenoids, erms);
            }
            AppEvent::CommandReceived(cmd) => {
                debug!("CMD | {:?}", cmd);
            }
            AppEvent::PulseStarted { index, pin } => {
                debug!("PULSE | start slot={} gpio={}", index, pin);
            }
            AppEvent::PulseAdvanced { from, to } => {
                debug!("PULSE | slot {} -> {}", from, to);
            }
            AppEvent::PulseFinished => {
                debug!("PULSE | done");
            }
            AppEvent::PulseCancelled { index } => {
                info!("PULSE | cancelled at slot {}", index);
            }
            AppEvent::PulseAborted(e) => {
                error!("PULSE | aborted: {}", e);
            }
            AppEvent::UnknownOpcode { opcode, discarded } => {
                warn!(
                    "PROTO | unknown opcode 0x{:02X} ({})",
                    opcode,
                    if *discarded { "discarded" } else { "stalled" }
                );
            }
            AppEvent::FrameDropped(e) => {
                warn!("PROTO | frame dropped: {}", e);
            }
        }
    }
}
