//! Terminator-delimited framing of a serial byte stream.

/// One completed frame. The terminator is excluded from `payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
    /// Byte that closed the frame; 0 for a flushed partial frame.
    pub terminator: u8,
}

impl Frame {
    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Bounded accumulator. A payload holds at most `capacity - 1` bytes; bytes
/// past that are dropped until the next terminator.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
    capacity: usize,
    terminators: Vec<u8>,
    dropped: u64,
}

impl FrameAccumulator {
    /// A capacity below 2 is raised to 2.
    pub fn new(capacity: usize, terminators: &[u8]) -> Self {
        let capacity = capacity.max(2);
        Self {
            buf: Vec::with_capacity(capacity - 1),
            capacity,
            terminators: terminators.to_vec(),
            dropped: 0,
        }
    }

    /// Feed one byte. Returns the finished frame when `byte` is a terminator.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        if self.terminators.contains(&byte) {
            let payload = std::mem::replace(&mut self.buf, Vec::with_capacity(self.capacity - 1));
            return Some(Frame {
                payload,
                terminator: byte,
            });
        }
        if self.buf.len() < self.capacity - 1 {
            self.buf.push(byte);
        } else {
            self.dropped += 1;
            tracing::trace!(byte, "frame full, byte dropped");
        }
        None
    }

    /// Finalize a pending partial frame, if any.
    pub fn flush(&mut self) -> Option<Frame> {
        if self.buf.is_empty() {
            return None;
        }
        Some(Frame {
            payload: std::mem::take(&mut self.buf),
            terminator: 0,
        })
    }

    /// Discard a partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes discarded by overflow since construction.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Bytes in the pending partial frame.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn terminators(&self) -> &[u8] {
        &self.terminators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(acc: &mut FrameAccumulator, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| acc.feed(b)).collect()
    }

    #[test]
    fn back_to_back_terminators_yield_empty_frames() {
        let mut acc = FrameAccumulator::new(8, b"\r\n");
        let frames = feed_all(&mut acc, b"OK\r\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].text(), "OK");
        assert_eq!(frames[0].terminator, b'\r');
        assert!(frames[1].is_empty());
    }

    #[test]
    fn flush_returns_partial_frame_once() {
        let mut acc = FrameAccumulator::new(8, b"\r");
        feed_all(&mut acc, b"AB");
        let frame = acc.flush().unwrap();
        assert_eq!(frame.payload, b"AB");
        assert_eq!(frame.terminator, 0);
        assert!(acc.flush().is_none());
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut acc = FrameAccumulator::new(8, b"\r");
        feed_all(&mut acc, b"junk");
        acc.reset();
        let frames = feed_all(&mut acc, b"X\r");
        assert_eq!(frames[0].payload, b"X");
    }
}
