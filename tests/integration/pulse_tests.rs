//! Integration tests for TIMED_PULSE sequencing through the full service.

use embedded_hal::digital::PinState;

use super::mock_hw::{ManualClock, MockPins, RecordingSink, frame};
use truetouch::app::bank::BankId;
use truetouch::app::commands::Command;
use truetouch::app::events::AppEvent;
use truetouch::app::service::ControllerService;
use truetouch::config::ControllerConfig;
use truetouch::error::PulseError;
use truetouch::pins::{ERM_GPIOS, SOLENOID_GPIOS};
use truetouch::protocol::transport::RingStream;

fn make_service(config: &ControllerConfig) -> (ControllerService, MockPins, RecordingSink) {
    let mut svc = ControllerService::new(config);
    let mut pins = MockPins::new();
    let mut sink = RecordingSink::new();
    svc.init(&mut pins, &mut sink);
    pins.clear();
    sink.events.clear();
    (svc, pins, sink)
}

fn pulse(targets: u32, duration_ms: u32) -> Vec<u8> {
    frame(&Command::TimedPulse {
        targets,
        duration_ms,
    })
}

#[test]
fn sequence_runs_highest_slot_first() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b101, 50));

    // t = 0: slot 2 HIGH.
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[2]]);

    // t = 49: still slot 2.
    clock.set(49);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[2]]);

    // t = 50: slot 2 LOW, slot 0 HIGH.
    clock.set(50);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[0]]);

    // t = 100: all LOW, idle.
    clock.set(100);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert!(pins.high_pins(&ERM_GPIOS).is_empty());
    assert!(svc.pulses().is_idle());

    assert_eq!(
        pins.digital_writes(),
        [
            (ERM_GPIOS[2], PinState::High),
            (ERM_GPIOS[2], PinState::Low),
            (ERM_GPIOS[0], PinState::High),
            (ERM_GPIOS[0], PinState::Low),
        ]
    );
    assert!(sink.events.contains(&AppEvent::PulseAdvanced { from: 2, to: 0 }));
    assert_eq!(sink.events.last(), Some(&AppEvent::PulseFinished));
}

#[test]
fn never_more_than_one_actuator_high() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b11_1111, 7));

    for t in 0..60 {
        clock.set(t);
        svc.service(&mut stream, &mut pins, &clock, &mut sink);
        assert!(pins.high_pins(&ERM_GPIOS).len() <= 1, "t={t}");
    }
    assert!(svc.pulses().is_idle());
}

#[test]
fn ticks_inside_a_phase_write_nothing() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(500);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b1, 100));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    pins.clear();

    for _ in 0..99 {
        clock.advance(1);
        svc.service(&mut stream, &mut pins, &clock, &mut sink);
    }
    assert!(pins.calls.is_empty());
}

#[test]
fn new_pulse_forces_previous_active_low_first() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b1_0000, 100));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    pins.clear();

    clock.set(30);
    stream.extend(&pulse(0b10, 100));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);

    assert_eq!(
        pins.digital_writes(),
        [
            (ERM_GPIOS[4], PinState::Low),
            (ERM_GPIOS[1], PinState::High)
        ]
    );
    assert!(sink.events.contains(&AppEvent::PulseCancelled { index: 4 }));
    assert_eq!(svc.pulses().pending(), 0b10);
}

#[test]
fn bit_31_aborts_with_nothing_high() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0x8000_0003, 10));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);

    assert!(pins.high_pins(&ERM_GPIOS).is_empty());
    assert!(svc.pulses().is_idle());
    assert!(sink.events.contains(&AppEvent::PulseAborted(
        PulseError::IndexOutOfBank { index: 31, slots: 6 }
    )));
}

#[test]
fn slot_missing_from_pulse_bank_aborts() {
    // Slot 5 exists on the ERM bank but not on the 5-slot solenoid bank.
    let config = ControllerConfig {
        pulse_bank: BankId::Solenoid,
        ..ControllerConfig::default()
    };
    let (mut svc, mut pins, mut sink) = make_service(&config);
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b10_0001, 10));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);

    assert!(pins.high_pins(&SOLENOID_GPIOS).is_empty());
    assert!(svc.pulses().is_idle());
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::PulseAborted(PulseError::IndexOutOfBank { index: 5, slots: 5 }))
    ));
}

#[test]
fn phase_across_clock_wraparound() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(u32::MAX - 19);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b11, 40));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[1]]);

    // 39 ms elapsed, clock has wrapped.
    clock.advance(39);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[1]]);

    clock.advance(1);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.high_pins(&ERM_GPIOS), [ERM_GPIOS[0]]);
}

#[test]
fn aborted_restart_still_reports_the_cancelled_slot() {
    let (mut svc, mut pins, mut sink) = make_service(&ControllerConfig::default());
    let clock = ManualClock::new(0);
    let mut stream = RingStream::<64>::new();
    stream.extend(&pulse(0b1_0000, 100));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    sink.events.clear();

    clock.set(10);
    stream.extend(&pulse(0x8000_0001, 100));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);

    assert!(pins.high_pins(&ERM_GPIOS).is_empty());
    assert!(svc.pulses().is_idle());
    assert_eq!(
        sink.events[1..],
        [
            AppEvent::PulseCancelled { index: 4 },
            AppEvent::PulseAborted(PulseError::IndexOutOfBank { index: 31, slots: 6 }),
        ]
    );
}
