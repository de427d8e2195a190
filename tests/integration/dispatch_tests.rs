//! Integration tests for the byte stream → decoder → dispatch → pins path.
//!
//! Frames are produced with the host-side encoder, pushed through an
//! in-memory stream, and the resulting pin writes are asserted.

use embedded_hal::digital::PinState;

use super::mock_hw::{ManualClock, MockPins, PinCall, RecordingSink, frame};
use truetouch::app::commands::{Command, Finger};
use truetouch::app::events::AppEvent;
use truetouch::app::ports::PinMode;
use truetouch::app::service::ControllerService;
use truetouch::config::{ControllerConfig, UnknownOpcodePolicy};
use truetouch::pins::{ERM_GPIOS, SOLENOID_GPIOS};
use truetouch::protocol::transport::{ByteStream, RingStream};

struct Rig {
    svc: ControllerService,
    pins: MockPins,
    clock: ManualClock,
    sink: RecordingSink,
    stream: RingStream<256>,
}

impl Rig {
    fn new(config: &ControllerConfig) -> Self {
        Self {
            svc: ControllerService::new(config),
            pins: MockPins::new(),
            clock: ManualClock::new(0),
            sink: RecordingSink::new(),
            stream: RingStream::new(),
        }
    }

    fn service(&mut self) {
        self.svc
            .service(&mut self.stream, &mut self.pins, &self.clock, &mut self.sink);
    }

    fn service_until_idle(&mut self) {
        while self.stream.available() > 0 {
            let before = self.stream.available();
            self.service();
            if self.stream.available() == before {
                break;
            }
        }
    }
}

// ── Init ──────────────────────────────────────────────────────

#[test]
fn init_configures_every_actuator_low() {
    let mut rig = Rig::new(&ControllerConfig::default());
    rig.svc.init(&mut rig.pins, &mut rig.sink);

    for &pin in SOLENOID_GPIOS.iter().chain(ERM_GPIOS.iter()) {
        assert!(rig.pins.calls.contains(&PinCall::Mode(pin, PinMode::Output)));
        assert_eq!(rig.pins.level(pin), PinState::Low);
    }
}

// ── Reassembly ────────────────────────────────────────────────

#[test]
fn byte_at_a_time_delivery_matches_whole_frames() {
    let cmds = [
        Command::digital_write(&[Finger::Thumb, Finger::Ring], PinState::High),
        Command::pwm_set(&[Finger::Palm, Finger::Index], 0x40),
        Command::digital_write(&[Finger::Thumb], PinState::Low),
    ];
    let bytes: Vec<u8> = cmds.iter().flat_map(frame).collect();

    let mut whole = Rig::new(&ControllerConfig::default());
    whole.stream.extend(&bytes);
    whole.service_until_idle();

    let mut split = Rig::new(&ControllerConfig::default());
    for &b in &bytes {
        split.stream.push(b);
        split.service();
    }

    assert_eq!(whole.sink.commands(), cmds);
    assert_eq!(split.sink.commands(), cmds);
    assert_eq!(whole.pins.calls, split.pins.calls);
}

#[test]
fn partial_frame_dispatches_nothing() {
    let mut rig = Rig::new(&ControllerConfig::default());
    let bytes = frame(&Command::pwm_set(&[Finger::Thumb], 10));
    rig.stream.extend(&bytes[..5]);

    for _ in 0..10 {
        rig.service();
    }
    assert!(rig.pins.calls.is_empty());
    assert_eq!(rig.stream.available(), 5);
}

// ── Dispatch ──────────────────────────────────────────────────

#[test]
fn digital_write_touches_exactly_addressed_solenoids() {
    let mut rig = Rig::new(&ControllerConfig::default());
    // Bits 1, 4, 5 and 20: only 1 and 4 exist in a 5-slot bank.
    let targets = (1 << 1) | (1 << 4) | (1 << 5) | (1 << 20);
    rig.stream.extend(&frame(&Command::DigitalWrite {
        targets,
        level: PinState::High,
    }));
    rig.service();

    assert_eq!(
        rig.pins.digital_writes(),
        [
            (SOLENOID_GPIOS[1], PinState::High),
            (SOLENOID_GPIOS[4], PinState::High)
        ]
    );
}

#[test]
fn pwm_set_touches_exactly_addressed_erms() {
    let mut rig = Rig::new(&ControllerConfig::default());
    rig.stream.extend(&frame(&Command::PwmSet {
        targets: 0xFFFF_FFFF,
        intensity: 128,
    }));
    rig.service();

    let expected: Vec<_> = ERM_GPIOS.iter().map(|&p| (p, 128)).collect();
    assert_eq!(rig.pins.pwm_writes(), expected);
    assert!(rig.pins.digital_writes().is_empty());
}

#[test]
fn zero_target_commands_are_no_ops() {
    let mut rig = Rig::new(&ControllerConfig::default());
    rig.stream.extend(&frame(&Command::DigitalWrite {
        targets: 0,
        level: PinState::High,
    }));
    rig.stream.extend(&frame(&Command::PwmSet {
        targets: 0,
        intensity: 255,
    }));
    rig.stream.extend(&frame(&Command::TimedPulse {
        targets: 0,
        duration_ms: 100,
    }));
    rig.service_until_idle();

    assert_eq!(rig.sink.commands().len(), 3);
    assert!(rig.pins.calls.is_empty());
    assert!(rig.svc.pulses().is_idle());
}

#[test]
fn non_one_level_byte_drives_low() {
    let mut rig = Rig::new(&ControllerConfig::default());
    rig.stream.extend(&[0x01, 0x00, 0x00, 0x00, 0x01, 0x02]);
    rig.service();
    assert_eq!(
        rig.pins.digital_writes(),
        [(SOLENOID_GPIOS[0], PinState::Low)]
    );
}

// ── Unknown opcodes ───────────────────────────────────────────

#[test]
fn discard_resynchronises_on_next_valid_frame() {
    let mut rig = Rig::new(&ControllerConfig::default());
    rig.stream.extend(&[0x00, 0xFF]);
    rig.stream
        .extend(&frame(&Command::digital_write(&[Finger::Middle], PinState::High)));
    rig.service_until_idle();

    assert_eq!(
        rig.sink
            .events
            .iter()
            .filter(|e| matches!(e, AppEvent::UnknownOpcode { discarded: true, .. }))
            .count(),
        2
    );
    assert_eq!(
        rig.pins.digital_writes(),
        [(SOLENOID_GPIOS[2], PinState::High)]
    );
}

#[test]
fn stall_policy_never_consumes() {
    let config = ControllerConfig {
        unknown_opcode: UnknownOpcodePolicy::Stall,
        ..ControllerConfig::default()
    };
    let mut rig = Rig::new(&config);
    rig.stream.push(0x42);
    rig.stream
        .extend(&frame(&Command::digital_write(&[Finger::Thumb], PinState::High)));

    for _ in 0..20 {
        rig.service();
    }
    assert_eq!(rig.stream.available(), 7);
    assert!(rig.pins.calls.is_empty());
    assert_eq!(
        rig.sink.events,
        [AppEvent::UnknownOpcode {
            opcode: 0x42,
            discarded: false
        }]
    );
}
