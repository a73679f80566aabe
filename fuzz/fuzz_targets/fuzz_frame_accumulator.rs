#![no_main]
use libfuzzer_sys::{arbitrary, fuzz_target};
use station_core::FrameAccumulator;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    capacity: u8,
    terminators: Vec<u8>,
    bytes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut acc = FrameAccumulator::new(usize::from(input.capacity), &input.terminators);
    for b in input.bytes {
        if let Some(frame) = acc.feed(b) {
            assert!(frame.len() < acc.capacity());
        }
        assert!(acc.len() < acc.capacity());
    }
});
