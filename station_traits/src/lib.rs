pub mod clock;

pub use clock::{Clock, Millis, MonotonicClock};

/// Error type carried across every hardware trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw sample source for the load-cell amplifier.
///
/// Blocks until a conversion is ready or `timeout` expires.
pub trait Scale {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

/// Two-state digital output used to power a peripheral on and off.
///
/// Implementations must treat a request for the current state as a no-op.
pub trait PowerSwitch {
    fn set_on(&mut self) -> Result<(), BoxError>;
    fn set_off(&mut self) -> Result<(), BoxError>;
    fn is_on(&self) -> bool;
}

/// Serial byte stream to a peripheral.
pub trait ByteStream {
    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> usize;
    /// Next buffered byte, if any.
    fn read_byte(&mut self) -> Option<u8>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError>;

    /// Claim the shared transport for this device.
    ///
    /// Returns false when the channel could not be claimed. Transports that
    /// are not shared can keep the default.
    fn listen(&mut self) -> bool {
        true
    }
}

impl<T: Scale + ?Sized> Scale for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        (**self).read(timeout)
    }
}

impl<T: PowerSwitch + ?Sized> PowerSwitch for Box<T> {
    fn set_on(&mut self) -> Result<(), BoxError> {
        (**self).set_on()
    }
    fn set_off(&mut self) -> Result<(), BoxError> {
        (**self).set_off()
    }
    fn is_on(&self) -> bool {
        (**self).is_on()
    }
}

impl<T: ByteStream + ?Sized> ByteStream for Box<T> {
    fn available(&mut self) -> usize {
        (**self).available()
    }
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write(bytes)
    }
    fn listen(&mut self) -> bool {
        (**self).listen()
    }
}
