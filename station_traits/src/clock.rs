use std::thread;
use std::time::{Duration, Instant};

/// Free-running millisecond counter. Wraps at `u32::MAX`.
pub type Millis = u32;

/// Monotonic clock abstraction for every duration comparison in the station.
///
/// - now_ms(): free-running millisecond counter (wraps like a hardware tick counter)
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): wraparound-safe elapsed milliseconds since `start`
pub trait Clock {
    fn now_ms(&self) -> Millis;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `start`, using wrapping subtraction.
    ///
    /// Tolerates a single wrap of the counter between `start` and now.
    fn ms_since(&self, start: Millis) -> Millis {
        self.now_ms().wrapping_sub(start)
    }
}

/// Default, real-time clock backed by `std::time::Instant`.
///
/// The counter starts at 0 when the clock is created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> Millis {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as Millis
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// Clones share the same counter, so a test can keep one handle and
    /// hand another to the driver under test.
    /// sleep(d) advances internal time by d without actually sleeping.
    #[derive(Debug, Clone, Default)]
    pub struct TestClock {
        now: Arc<Mutex<Millis>>,
    }

    impl TestClock {
        pub fn new() -> Self {
            Self::default()
        }

        /// Start the counter at `ms` (useful for wraparound tests).
        pub fn starting_at(ms: Millis) -> Self {
            let clock = Self::new();
            clock.set(ms);
            clock
        }

        /// Advance the clock by `ms`, wrapping like the hardware counter.
        pub fn advance(&self, ms: Millis) {
            if let Ok(mut now) = self.now.lock() {
                *now = now.wrapping_add(ms);
            }
        }

        /// Set the absolute counter value.
        pub fn set(&self, ms: Millis) {
            if let Ok(mut now) = self.now.lock() {
                *now = ms;
            }
        }
    }

    impl Clock for TestClock {
        fn now_ms(&self) -> Millis {
            self.now.lock().map(|g| *g).unwrap_or(0)
        }

        fn sleep(&self, d: Duration) {
            self.advance(d.as_millis() as Millis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn ms_since_survives_a_single_wrap() {
        let clock = TestClock::starting_at(u32::MAX - 9);
        let start = clock.now_ms();
        clock.advance(25);
        assert_eq!(clock.now_ms(), 15);
        assert_eq!(clock.ms_since(start), 25);
    }

    #[test]
    fn sleep_advances_test_clock() {
        let clock = TestClock::new();
        clock.sleep(Duration::from_millis(40));
        assert_eq!(clock.now_ms(), 40);
    }

    #[test]
    fn monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        assert!(clock.now_ms() < 1_000);
    }
}
