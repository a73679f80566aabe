use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{decode_sample, wait_until_low_with_timeout};

/// Bit-banged HX711 on two GPIO lines.
pub struct Hx711 {
    dt: rppal::gpio::InputPin,
    sck: rppal::gpio::OutputPin,
    gain_pulses: u8, // 1, 2, 3 extra pulses select gain/channel for the next conversion
}

impl Hx711 {
    pub fn new(
        dt_pin: rppal::gpio::InputPin,
        mut sck_pin: rppal::gpio::OutputPin,
        gain_pulses: u8,
    ) -> Result<Self> {
        sck_pin.set_low(); // clock idle low
        Ok(Self {
            dt: dt_pin,
            sck: sck_pin,
            gain_pulses,
        })
    }

    pub fn open(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input();
        let sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        Self::new(dt, sck, gain_pulses)
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        // Data ready when DT goes low
        let dt = &self.dt;
        wait_until_low_with_timeout(|| dt.is_high(), timeout, Duration::from_micros(200))
            .map_err(|_| HwError::Timeout)?;

        let mut bytes = [0u8; 3];
        for byte in &mut bytes {
            for _ in 0..8 {
                self.sck.set_high();
                spin_delay_100ns();
                *byte = (*byte << 1) | u8::from(self.dt.is_high());
                self.sck.set_low();
                spin_delay_100ns();
            }
        }

        for _ in 0..self.gain_pulses {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        let value = decode_sample(bytes);
        trace!(raw = value, "hx711 raw read");
        Ok(value)
    }

    /// Holding SCK high for more than 60 µs puts the chip to sleep.
    pub fn power_down(&mut self) {
        self.sck.set_low();
        self.sck.set_high();
        std::thread::sleep(Duration::from_micros(80));
    }

    pub fn power_up(&mut self) {
        self.sck.set_low();
    }
}

#[inline(always)]
fn spin_delay_100ns() {
    std::hint::spin_loop();
}
