//! Fuzz target: `FrameDecoder::poll_once` under both unknown-opcode policies.
//!
//! The first input byte picks the delivery chunk size, the rest is the
//! byte stream.  The decoder must never panic, must never yield a
//! command whose re-encoding differs from the bytes it consumed, and in
//! discard mode must always drain down to a partial frame.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use truetouch::protocol::codec::{self, MAX_FRAME_SIZE};
use truetouch::protocol::decoder::{FrameDecoder, UnknownOpcodePolicy};
use truetouch::protocol::transport::{ByteStream, RingStream};

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, bytes)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk % 16) + 1;

    for policy in [UnknownOpcodePolicy::Discard, UnknownOpcodePolicy::Stall] {
        let mut stream = RingStream::<1024>::new();
        let mut decoder = FrameDecoder::new(policy);
        let mut consumed = 0usize;

        for piece in bytes.chunks(chunk) {
            stream.extend(piece);
            loop {
                let before = stream.available();
                match decoder.poll_once(&mut stream) {
                    Ok(Some(cmd)) => {
                        let mut buf = [0u8; MAX_FRAME_SIZE];
                        let n = codec::encode(&cmd, &mut buf).unwrap();
                        assert_eq!(before - stream.available(), n);
                        let start = consumed;
                        consumed += n;
                        let wire = &bytes[start..consumed];
                        // Level bytes other than 1 normalise to 0 on re-encode.
                        assert_eq!(wire[0], buf[0]);
                        assert_eq!(&wire[1..5], &buf[1..5]);
                    }
                    Ok(None) => break,
                    Err(_) => consumed += before - stream.available(),
                }
                if stream.available() == before {
                    break;
                }
            }
        }

        if policy == UnknownOpcodePolicy::Discard {
            assert!(stream.available() < MAX_FRAME_SIZE);
        }
    }
});
