//! Byte stream abstraction: whatever delivers command bytes.
//!
//! Concrete implementations:
//! - [`BleUartStream`](crate::adapters::ble_uart::BleUartStream): bytes
//!   written to the NUS RX characteristic
//! - [`RingStream`]: in-memory FIFO for host tools, tests and fuzzing
//! - [`NullStream`]: never has data
//!
//! The stream's own buffer is the reassembly buffer: the decoder only
//! consumes once a whole frame is available.

use heapless::Deque;

/// Non-blocking, inbound-only byte channel.
pub trait ByteStream {
    /// Number of bytes that can be read right now.
    fn available(&self) -> usize;

    /// The next byte without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read (0 when empty).
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn peek(&self) -> Option<u8> {
        (**self).peek()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }
}

/// A null stream that never has data.
/// Useful as a default when no central is connected.
pub struct NullStream;

impl ByteStream for NullStream {
    fn available(&self) -> usize {
        0
    }

    fn peek(&self) -> Option<u8> {
        None
    }

    fn read(&mut self, _buf: &mut [u8]) -> usize {
        0
    }
}

/// Fixed-capacity in-memory byte FIFO.
#[derive(Debug, Default)]
pub struct RingStream<const N: usize> {
    bytes: Deque<u8, N>,
}

impl<const N: usize> RingStream<N> {
    pub const fn new() -> Self {
        Self {
            bytes: Deque::new(),
        }
    }

    /// Append one byte.  Returns `false` if the stream is full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.bytes.push_back(byte).is_ok()
    }

    /// Append as many bytes as fit; returns how many were accepted.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        data.iter().take_while(|&&b| self.push(b)).count()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl<const N: usize> ByteStream for RingStream<N> {
    fn available(&self) -> usize {
        self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.front().copied()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.bytes.pop_front() {
                Some(b) => {
                    *slot = b;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}
