use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until the provided `is_high` predicate becomes false (i.e., line goes low),
/// or a timeout expires. Sleeps in small intervals to avoid CPU spinning.
pub fn wait_until_low_with_timeout(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Decode one HX711 conversion, bytes in clock-out order (MSB first).
///
/// The amplifier emits 24-bit two's complement. Flipping the top bit turns
/// that into offset binary, so the widened value is always non-negative and
/// zero load sits near `0x80_0000`.
#[inline]
pub fn decode_sample(bytes: [u8; 3]) -> i32 {
    let [hi, mid, lo] = bytes;
    (i32::from(hi ^ 0x80) << 16) | (i32::from(mid) << 8) | i32::from(lo)
}
