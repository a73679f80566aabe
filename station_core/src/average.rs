//! Fixed-capacity running average over raw samples.

/// Circular buffer of the last `capacity` samples with an incrementally
/// maintained sum.
///
/// Before the first wrap the average divides by the number of samples written
/// so far, so unwritten slots never bias it toward zero.
#[derive(Debug, Clone)]
pub struct RunningAverage {
    slots: Vec<i32>,
    sum: i64,
    cursor: usize,
    written: usize,
    wrapped: bool,
}

impl RunningAverage {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity.max(1)],
            sum: 0,
            cursor: 0,
            written: 0,
            wrapped: false,
        }
    }

    /// Record one sample and return the updated average.
    ///
    /// Integer division truncates toward zero.
    #[inline]
    pub fn record(&mut self, sample: i32) -> i64 {
        let old = std::mem::replace(&mut self.slots[self.cursor], sample);
        self.sum += i64::from(sample) - i64::from(old);
        self.cursor += 1;
        if self.cursor == self.slots.len() {
            self.cursor = 0;
            self.wrapped = true;
        }
        if !self.wrapped {
            self.written += 1;
        }
        self.average()
    }

    /// True right after the cursor has returned to slot 0.
    pub fn at_wrap_boundary(&self) -> bool {
        self.wrapped && self.cursor == 0
    }

    pub const fn sum(&self) -> i64 {
        self.sum
    }

    /// Current average, 0 before any sample.
    pub fn average(&self) -> i64 {
        match self.len() {
            0 => 0,
            n => self.sum / n as i64,
        }
    }

    /// Number of samples that contribute to the average.
    pub fn len(&self) -> usize {
        if self.wrapped {
            self.slots.len()
        } else {
            self.written
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub const fn has_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.sum = 0;
        self.cursor = 0;
        self.written = 0;
        self.wrapped = false;
    }
}
