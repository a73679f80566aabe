//! Per-device protocols layered over framing and the power window.
//!
//! A protocol only interprets frames and decides what to send. Power,
//! framing and I/O belong to [`crate::peripheral::Peripheral`].

pub mod handshake;
pub mod listen;

use station_traits::Millis;

use crate::frame::Frame;

pub use handshake::{HandshakeSession, ModemState};
pub use listen::ListenSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TagRead {
        tag: String,
        first_since_power_up: bool,
    },
    Registered,
    TextModeArmed,
    PromptReceived,
    MessageSent {
        reference: Option<u32>,
    },
    DeviceError,
}

impl SessionEvent {
    /// Events that earn the power window its one extension.
    pub const fn is_activity(&self) -> bool {
        matches!(self, Self::TagRead { .. } | Self::Registered)
    }
}

/// Bytes a protocol wants written, in order.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Vec<u8>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: impl Into<Vec<u8>>) {
        self.pending.push(bytes.into());
    }

    /// Queue a command line terminated by a carriage return.
    pub fn push_line(&mut self, line: &str) {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\r');
        self.pending.push(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.pending.drain(..)
    }
}

/// Device-specific interpretation of frames.
pub trait SessionProtocol {
    fn name(&self) -> &'static str;
    /// Bytes that close a frame for this device.
    fn terminators(&self) -> &[u8];
    fn frame_capacity(&self) -> usize;
    /// Default power-on window in milliseconds.
    fn on_ms(&self) -> Millis;

    /// Called after the device has been powered and the window opened.
    fn on_power_up(&mut self, now: Millis);
    /// Interpret one complete frame. Frames arrive in stream order.
    fn on_frame(&mut self, frame: &Frame, now: Millis, out: &mut Outbox) -> Option<SessionEvent>;
    /// Time-driven work, once per tick after all frames are handled.
    fn poll(&mut self, now: Millis, out: &mut Outbox);
    /// Forget in-flight state. Called when power is removed.
    fn reset(&mut self);
}

impl<T: SessionProtocol + ?Sized> SessionProtocol for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn terminators(&self) -> &[u8] {
        (**self).terminators()
    }
    fn frame_capacity(&self) -> usize {
        (**self).frame_capacity()
    }
    fn on_ms(&self) -> Millis {
        (**self).on_ms()
    }
    fn on_power_up(&mut self, now: Millis) {
        (**self).on_power_up(now);
    }
    fn on_frame(&mut self, frame: &Frame, now: Millis, out: &mut Outbox) -> Option<SessionEvent> {
        (**self).on_frame(frame, now, out)
    }
    fn poll(&mut self, now: Millis, out: &mut Outbox) {
        (**self).poll(now, out);
    }
    fn reset(&mut self) {
        (**self).reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_preserves_order_and_appends_cr() {
        let mut out = Outbox::new();
        out.push_line("AT");
        out.push(vec![0x1A]);
        let all: Vec<Vec<u8>> = out.drain().collect();
        assert_eq!(all, vec![b"AT\r".to_vec(), vec![0x1A]]);
        assert!(out.is_empty());
    }

    #[test]
    fn only_tag_and_registration_count_as_activity() {
        assert!(SessionEvent::Registered.is_activity());
        assert!(
            SessionEvent::TagRead {
                tag: "x".into(),
                first_since_power_up: true
            }
            .is_activity()
        );
        assert!(!SessionEvent::MessageSent { reference: None }.is_activity());
        assert!(!SessionEvent::DeviceError.is_activity());
    }
}
