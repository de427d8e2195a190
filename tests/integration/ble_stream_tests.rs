//! BLE RX buffer → stream → controller, end to end on the host.
//!
//! Each test owns its own `static` buffer so tests can run in parallel.

use embedded_hal::digital::PinState;

use super::mock_hw::{ManualClock, MockPins, RecordingSink, frame};
use truetouch::adapters::ble_uart::{BleUartAdapter, BleUartStream, RX_BUFFER_SIZE, SharedRxBuffer};
use truetouch::app::commands::{Command, Finger};
use truetouch::app::service::ControllerService;
use truetouch::config::ControllerConfig;
use truetouch::pins::{ERM_GPIOS, SOLENOID_GPIOS};
use truetouch::protocol::transport::ByteStream;

fn adapter(rx: &'static SharedRxBuffer<RX_BUFFER_SIZE>) -> BleUartAdapter {
    let mut name = heapless::String::<24>::new();
    name.push_str("truetouch-it").ok();
    BleUartAdapter::new(name, rx)
}

#[test]
fn writes_split_across_packets_dispatch_once() {
    static RX: SharedRxBuffer<RX_BUFFER_SIZE> = SharedRxBuffer::new();
    let mut ble = adapter(&RX);
    ble.start();
    ble.on_central_connected();

    let mut svc = ControllerService::new(&ControllerConfig::default());
    let mut pins = MockPins::new();
    let clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();
    let mut stream = ble.stream();

    let bytes = frame(&Command::pwm_set(&[Finger::Pinky], 0x90));
    ble.on_rx_write(&bytes[..2]);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert!(pins.calls.is_empty());

    ble.on_rx_write(&bytes[2..]);
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(pins.pwm_writes(), [(ERM_GPIOS[4], 0x90)]);
    assert!(stream.peek().is_none());
}

#[test]
fn several_frames_in_one_write_dispatch_in_order() {
    static RX: SharedRxBuffer<RX_BUFFER_SIZE> = SharedRxBuffer::new();
    let mut svc = ControllerService::new(&ControllerConfig::default());
    let mut pins = MockPins::new();
    let clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();
    let mut stream = BleUartStream::new(&RX);

    let mut bytes = frame(&Command::digital_write(&[Finger::Thumb], PinState::High));
    bytes.extend(frame(&Command::digital_write(&[Finger::Thumb], PinState::Low)));
    RX.push(&bytes);

    for _ in 0..2 {
        svc.service(&mut stream, &mut pins, &clock, &mut sink);
    }
    assert_eq!(
        pins.digital_writes(),
        [
            (SOLENOID_GPIOS[0], PinState::High),
            (SOLENOID_GPIOS[0], PinState::Low)
        ]
    );
    assert!(RX.is_empty());
}

#[test]
fn overflow_drops_the_tail_and_counts_it() {
    static RX: SharedRxBuffer<8> = SharedRxBuffer::new();
    assert_eq!(RX.push(&[0u8; 5]), 5);
    assert_eq!(RX.push(&[1u8; 5]), 3);
    assert_eq!(RX.len(), 8);
    assert_eq!(RX.dropped(), 2);

    let mut buf = [0u8; 8];
    assert_eq!(RX.pop_into(&mut buf), 8);
    assert_eq!(buf, [0, 0, 0, 0, 0, 1, 1, 1]);
}

#[test]
fn reconnect_discards_stale_partial_frame() {
    static RX: SharedRxBuffer<RX_BUFFER_SIZE> = SharedRxBuffer::new();
    let mut ble = adapter(&RX);
    ble.start();
    ble.on_central_connected();

    let stale = frame(&Command::timed_pulse(&[Finger::Index], 300));
    ble.on_rx_write(&stale[..4]);
    ble.on_central_disconnected();
    ble.on_central_connected();
    assert!(RX.is_empty());

    let mut svc = ControllerService::new(&ControllerConfig::default());
    let mut pins = MockPins::new();
    let clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();
    let mut stream = ble.stream();

    ble.on_rx_write(&frame(&Command::digital_write(&[Finger::Ring], PinState::High)));
    svc.service(&mut stream, &mut pins, &clock, &mut sink);
    assert_eq!(
        pins.digital_writes(),
        [(SOLENOID_GPIOS[3], PinState::High)]
    );
}
