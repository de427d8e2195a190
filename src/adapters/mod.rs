//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements  | Connects to                          |
//! |--------------|-------------|--------------------------------------|
//! | `ble_uart`   | ByteStream  | Bluedroid NUS GATT server (RX char)  |
//! | `hardware`   | PinDriver   | ESP32 GPIO + LEDC                    |
//! | `hal_pins`   | PinDriver   | any `embedded-hal` 1.0 output / PWM  |
//! | `log_sink`   | EventSink   | Serial log output                    |
//! | `time`       | Clock       | ESP32 system timer                   |

pub mod ble_uart;
pub mod hal_pins;
pub mod hardware;
pub mod log_sink;
pub mod time;
