pub mod error;
#[cfg(feature = "hardware")]
pub mod hx711;
pub mod util;

use station_traits::{BoxError, ByteStream, Clock, Millis, PowerSwitch, Scale};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::HwError;

/// Raw counts of an unloaded platform in the simulator (offset-binary zero).
pub const SIM_ZERO_COUNTS: i32 = 0x80_0000;

/// Virtual millisecond counter for simulated runs. `sleep` advances it
/// instead of blocking; clones share the counter.
#[derive(Clone, Default)]
pub struct SimulatedClock {
    now: Rc<Cell<Millis>>,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for SimulatedClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }

    fn sleep(&self, d: std::time::Duration) {
        self.advance(Millis::try_from(d.as_millis()).unwrap_or(Millis::MAX));
    }
}

/// Simulated load cell. Weight placed through a [`ScaleHandle`] shows up in
/// the next reading, plus a small alternating jitter.
pub struct SimulatedScale {
    grams: Rc<Cell<f32>>,
    zero_counts: i32,
    counts_per_gram: f32,
    jitter: i32,
    flip: bool,
}

/// Shared control over a [`SimulatedScale`].
#[derive(Clone)]
pub struct ScaleHandle {
    grams: Rc<Cell<f32>>,
}

impl ScaleHandle {
    pub fn place(&self, grams: f32) {
        self.grams.set(grams);
    }

    pub fn grams(&self) -> f32 {
        self.grams.get()
    }
}

impl SimulatedScale {
    pub fn new(zero_counts: i32, counts_per_gram: f32) -> Self {
        SimulatedScale {
            grams: Rc::new(Cell::new(0.0)),
            zero_counts,
            counts_per_gram,
            jitter: 0,
            flip: false,
        }
    }

    /// Alternate readings by `± counts` around the true value.
    pub fn with_jitter(mut self, counts: i32) -> Self {
        self.jitter = counts.abs();
        self
    }

    pub fn handle(&self) -> ScaleHandle {
        ScaleHandle {
            grams: self.grams.clone(),
        }
    }
}

impl Default for SimulatedScale {
    fn default() -> Self {
        Self::new(SIM_ZERO_COUNTS, 712.0)
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        self.flip = !self.flip;
        let noise = if self.flip { self.jitter } else { -self.jitter };
        let load = (self.grams.get() * self.counts_per_gram) as i32;
        let raw = self.zero_counts.saturating_add(load).saturating_add(noise);
        tracing::trace!(raw, "simulated scale read");
        Ok(raw)
    }
}

/// Replays a recorded sequence of raw samples, then reports exhaustion.
pub struct ReplayScale {
    samples: VecDeque<i32>,
}

impl ReplayScale {
    pub fn new(samples: impl IntoIterator<Item = i32>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Scale for ReplayScale {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        self.samples
            .pop_front()
            .ok_or_else(|| Box::new(HwError::Exhausted) as BoxError)
    }
}

/// Simulated power pin. Clones of the handle observe the same line.
#[derive(Clone, Default)]
pub struct SimulatedSwitch {
    on: Rc<Cell<bool>>,
    toggles: Rc<Cell<u32>>,
}

impl SimulatedSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actual level changes driven on the line.
    pub fn toggles(&self) -> u32 {
        self.toggles.get()
    }
}

impl PowerSwitch for SimulatedSwitch {
    fn set_on(&mut self) -> Result<(), BoxError> {
        if !self.on.get() {
            self.on.set(true);
            self.toggles.set(self.toggles.get() + 1);
        }
        Ok(())
    }

    fn set_off(&mut self) -> Result<(), BoxError> {
        if self.on.get() {
            self.on.set(false);
            self.toggles.set(self.toggles.get() + 1);
        }
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on.get()
    }
}

#[derive(Default)]
struct SerialLine {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

/// Simulated serial port. The device side is driven through a [`SerialHandle`].
#[derive(Default)]
pub struct SimulatedSerial {
    line: Rc<RefCell<SerialLine>>,
}

/// Device side of a [`SimulatedSerial`].
#[derive(Clone)]
pub struct SerialHandle {
    line: Rc<RefCell<SerialLine>>,
}

impl SimulatedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> SerialHandle {
        SerialHandle {
            line: self.line.clone(),
        }
    }
}

impl SerialHandle {
    /// Queue bytes as if the device had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        self.line.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    /// Drain everything the host has written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.line.borrow_mut().outbound)
    }

    pub fn pending(&self) -> usize {
        self.line.borrow().inbound.len()
    }
}

impl ByteStream for SimulatedSerial {
    fn available(&mut self) -> usize {
        self.line.borrow().inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.line.borrow_mut().inbound.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        self.line.borrow_mut().outbound.extend_from_slice(bytes);
        Ok(())
    }
}

/// Simulated SIM900-style modem answering the handful of AT commands the
/// station sends. Registration succeeds after `registration_delay` queries.
pub struct SimulatedModem {
    inbound: VecDeque<u8>,
    pending: Vec<u8>,
    registration_delay: u32,
    queries: u32,
    in_body: bool,
    sent: Vec<String>,
    message_ref: u32,
}

impl SimulatedModem {
    pub fn new(registration_delay: u32) -> Self {
        Self {
            inbound: VecDeque::new(),
            pending: Vec::new(),
            registration_delay,
            queries: 0,
            in_body: false,
            sent: Vec::new(),
            message_ref: 0,
        }
    }

    /// Bodies of every text message the modem accepted.
    pub fn sent_messages(&self) -> &[String] {
        &self.sent
    }

    fn reply(&mut self, text: &str) {
        self.inbound.extend(text.bytes());
    }

    fn handle_command(&mut self, cmd: &str) {
        tracing::trace!(cmd, "simulated modem command");
        if cmd == "AT+CREG?" {
            self.queries += 1;
            if self.queries > self.registration_delay {
                self.reply("\r\n+CREG: 0,1\r\n\r\nOK\r\n");
            } else {
                self.reply("\r\n+CREG: 0,2\r\n\r\nOK\r\n");
            }
        } else if cmd == "AT+CMGF=1" {
            self.reply("\r\nOK\r\n");
        } else if cmd.starts_with("AT+CMGS=") {
            self.in_body = true;
            self.reply("\r\n> ");
        } else {
            self.reply("\r\nERROR\r\n");
        }
    }
}

impl ByteStream for SimulatedModem {
    fn available(&mut self) -> usize {
        self.inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        for &b in bytes {
            if self.in_body {
                if b == 0x1A {
                    let body = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    self.in_body = false;
                    self.sent.push(body);
                    self.message_ref += 1;
                    let ack = format!("\r\n+CMGS: {}\r\n\r\nOK\r\n", self.message_ref);
                    self.reply(&ack);
                } else {
                    self.pending.push(b);
                }
            } else if b == b'\r' {
                let cmd = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                self.handle_command(cmd.trim());
            } else {
                self.pending.push(b);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub mod hardware {
    use super::hx711::Hx711;
    use crate::error::HwError;
    use station_traits::{BoxError, ByteStream, PowerSwitch, Scale};
    use std::time::Duration;

    pub struct HardwareScale {
        hx711: Hx711,
    }

    impl HardwareScale {
        pub fn try_new(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> Result<Self, HwError> {
            Ok(Self {
                hx711: Hx711::open(dt_pin, sck_pin, gain_pulses)?,
            })
        }
    }

    impl Scale for HardwareScale {
        fn read(&mut self, timeout: Duration) -> Result<i32, BoxError> {
            let mut attempts = 0;
            let max_attempts = 3;
            loop {
                match self.hx711.read_with_timeout(timeout) {
                    Ok(raw) => {
                        tracing::debug!(raw = raw, "hx711 sample");
                        return Ok(raw);
                    }
                    Err(HwError::Timeout) if attempts < max_attempts => {
                        attempts += 1;
                        tracing::warn!(retries = attempts, "scale timeout, retrying");
                    }
                    Err(e) => {
                        tracing::error!("Scale read error: {}", e);
                        return Err(Box::new(e));
                    }
                }
            }
        }
    }

    /// Peripheral power through a transistor on one GPIO line.
    pub struct GpioSwitch {
        pin: rppal::gpio::OutputPin,
        on: bool,
    }

    impl GpioSwitch {
        pub fn open(pin: u8) -> Result<Self, HwError> {
            let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let mut pin = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            pin.set_low();
            Ok(Self { pin, on: false })
        }
    }

    impl PowerSwitch for GpioSwitch {
        fn set_on(&mut self) -> Result<(), BoxError> {
            if !self.on {
                self.pin.set_high();
                self.on = true;
            }
            Ok(())
        }

        fn set_off(&mut self) -> Result<(), BoxError> {
            if self.on {
                self.pin.set_low();
                self.on = false;
            }
            Ok(())
        }

        fn is_on(&self) -> bool {
            self.on
        }
    }

    /// Non-blocking UART byte stream.
    pub struct UartStream {
        uart: rppal::uart::Uart,
    }

    impl UartStream {
        pub fn open(path: &str, baud: u32) -> Result<Self, HwError> {
            let mut uart = rppal::uart::Uart::with_path(path, baud, rppal::uart::Parity::None, 8, 1)
                .map_err(|e| HwError::Uart(e.to_string()))?;
            uart.set_read_mode(0, Duration::ZERO)
                .map_err(|e| HwError::Uart(e.to_string()))?;
            Ok(Self { uart })
        }
    }

    impl ByteStream for UartStream {
        fn available(&mut self) -> usize {
            self.uart.input_len().unwrap_or(0)
        }

        fn read_byte(&mut self) -> Option<u8> {
            let mut buf = [0u8; 1];
            match self.uart.read(&mut buf) {
                Ok(1) => Some(buf[0]),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "uart read failed");
                    None
                }
            }
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
            let mut written = 0;
            while written < bytes.len() {
                written += self
                    .uart
                    .write(&bytes[written..])
                    .map_err(|e| Box::new(HwError::Uart(e.to_string())) as BoxError)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn simulated_clock_advances_on_sleep() {
        let clock = SimulatedClock::new();
        let shared = clock.clone();
        clock.sleep(Duration::from_millis(250));
        shared.advance(50);
        assert_eq!(clock.now_ms(), 300);
    }

    #[test]
    fn simulated_scale_reports_placed_weight() {
        let mut scale = SimulatedScale::new(1_000, 10.0);
        let handle = scale.handle();
        assert_eq!(scale.read(Duration::from_millis(10)).unwrap(), 1_000);
        handle.place(5.0);
        assert_eq!(scale.read(Duration::from_millis(10)).unwrap(), 1_050);
    }

    #[test]
    fn simulated_scale_jitter_alternates() {
        let mut scale = SimulatedScale::new(0, 1.0).with_jitter(3);
        let a = scale.read(Duration::ZERO).unwrap();
        let b = scale.read(Duration::ZERO).unwrap();
        assert_eq!((a, b), (3, -3));
    }

    #[test]
    fn replay_scale_exhausts() {
        let mut scale = ReplayScale::new([7, 8]);
        assert_eq!(scale.read(Duration::ZERO).unwrap(), 7);
        assert_eq!(scale.read(Duration::ZERO).unwrap(), 8);
        assert!(scale.is_exhausted());
        let err = scale.read(Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("exhausted"));
    }

    #[test]
    fn switch_is_idempotent() {
        let mut sw = SimulatedSwitch::new();
        sw.set_on().unwrap();
        sw.set_on().unwrap();
        sw.set_off().unwrap();
        sw.set_off().unwrap();
        assert_eq!(sw.toggles(), 2);
        assert!(!sw.is_on());
    }

    #[test]
    fn serial_handle_round_trips_both_directions() {
        let mut port = SimulatedSerial::new();
        let dev = port.handle();
        dev.inject(b"hi");
        assert_eq!(port.available(), 2);
        assert_eq!(port.read_byte(), Some(b'h'));
        port.write(b"AT\r").unwrap();
        assert_eq!(dev.take_written(), b"AT\r".to_vec());
        assert_eq!(dev.pending(), 1);
    }

    #[test]
    fn modem_registers_after_delay_and_accepts_text() {
        let mut modem = SimulatedModem::new(1);
        modem.write(b"AT+CREG?\r").unwrap();
        let mut first = Vec::new();
        while let Some(b) = modem.read_byte() {
            first.push(b);
        }
        assert!(String::from_utf8_lossy(&first).contains("+CREG: 0,2"));

        modem.write(b"AT+CREG?\r").unwrap();
        let mut second = Vec::new();
        while let Some(b) = modem.read_byte() {
            second.push(b);
        }
        assert!(String::from_utf8_lossy(&second).contains("+CREG: 0,1"));

        modem.write(b"AT+CMGS=\"+100\"\r").unwrap();
        modem.write(b"hello\x1A").unwrap();
        assert_eq!(modem.sent_messages(), ["hello".to_string()]);
    }
}
