//! Inbound command protocol over the BLE UART byte stream.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Command path                             │
//! │                                                              │
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │ ByteStream │──▶│ FrameDecoder │──▶│ ControllerService  │  │
//! │  │ (trait)    │   │ (reassembly) │   │ (dispatch)         │  │
//! │  └────────────┘   └──────┬───────┘   └─────────┬──────────┘  │
//! │                          │                     │             │
//! │                   ┌──────▼──────┐      ┌───────▼────────┐    │
//! │                   │ codec       │      │ PulseScheduler │    │
//! │                   │ (BE fields) │      │ / PinDriver    │    │
//! │                   └─────────────┘      └────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is ever written back: there are no acks, no error replies.

pub mod codec;
pub mod decoder;
pub mod transport;
