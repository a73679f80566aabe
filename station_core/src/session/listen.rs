//! Tag reader: a listen-only device that prints one tag per line.

use station_traits::Millis;

use super::{Outbox, SessionEvent, SessionProtocol};
use crate::config::ListenCfg;
use crate::frame::Frame;

pub struct ListenSession {
    cfg: ListenCfg,
    tag: Option<String>,
    tag_read: bool,
    first_since_power_up: bool,
}

impl ListenSession {
    pub const fn new(cfg: ListenCfg) -> Self {
        Self {
            cfg,
            tag: None,
            tag_read: false,
            first_since_power_up: false,
        }
    }

    pub const fn has_tag_been_read(&self) -> bool {
        self.tag_read
    }

    /// Acknowledge the last tag. The stored tag text is kept until power-down.
    pub fn reset_tag_read(&mut self) {
        self.tag_read = false;
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub const fn is_first_tag_since_power_up(&self) -> bool {
        self.first_since_power_up
    }
}

impl SessionProtocol for ListenSession {
    fn name(&self) -> &'static str {
        "tag_reader"
    }

    fn terminators(&self) -> &[u8] {
        b"\r"
    }

    fn frame_capacity(&self) -> usize {
        self.cfg.frame_capacity
    }

    fn on_ms(&self) -> Millis {
        self.cfg.on_ms
    }

    fn on_power_up(&mut self, _now: Millis) {
        self.first_since_power_up = true;
    }

    fn on_frame(&mut self, frame: &Frame, _now: Millis, _out: &mut Outbox) -> Option<SessionEvent> {
        let tag = frame.text().trim().to_string();
        if tag.len() < self.cfg.min_tag_len {
            tracing::trace!(len = tag.len(), "short tag frame discarded");
            return None;
        }
        let first = self.first_since_power_up;
        self.first_since_power_up = false;
        self.tag_read = true;
        tracing::info!(tag = %tag, first, "tag read");
        self.tag = Some(tag.clone());
        Some(SessionEvent::TagRead {
            tag,
            first_since_power_up: first,
        })
    }

    fn poll(&mut self, _now: Millis, _out: &mut Outbox) {}

    fn reset(&mut self) {
        self.first_since_power_up = false;
        self.tag_read = false;
        self.tag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> Frame {
        Frame {
            payload: text.as_bytes().to_vec(),
            terminator: b'\r',
        }
    }

    #[test]
    fn short_frames_are_ignored() {
        let mut s = ListenSession::new(ListenCfg::default());
        s.on_power_up(0);
        assert!(s.on_frame(&frame("0123"), 0, &mut Outbox::new()).is_none());
        assert!(!s.has_tag_been_read());
        assert!(s.is_first_tag_since_power_up());
    }

    #[test]
    fn padding_does_not_count_towards_tag_length() {
        let mut s = ListenSession::new(ListenCfg::default());
        s.on_power_up(0);
        let mut out = Outbox::new();
        assert!(s.on_frame(&frame(&" ".repeat(20)), 0, &mut out).is_none());
        assert!(s.on_frame(&frame("  0415ABCDEF  "), 0, &mut out).is_none());
        assert!(!s.has_tag_been_read());
        assert!(s.tag().is_none());
    }

    #[test]
    fn reset_forgets_tag() {
        let mut s = ListenSession::new(ListenCfg::default());
        s.on_power_up(0);
        s.on_frame(&frame("0415ABCDEF012345"), 0, &mut Outbox::new());
        s.reset();
        assert!(!s.has_tag_been_read());
        assert!(s.tag().is_none());
        assert!(!s.is_first_tag_since_power_up());
    }

    #[test]
    fn only_first_read_after_power_up_is_flagged() {
        let mut s = ListenSession::new(ListenCfg::default());
        s.on_power_up(0);
        let tag = "0415ABCDEF012345";
        let mut out = Outbox::new();
        assert_eq!(
            s.on_frame(&frame(tag), 0, &mut out),
            Some(SessionEvent::TagRead {
                tag: tag.into(),
                first_since_power_up: true
            })
        );
        assert_eq!(
            s.on_frame(&frame(tag), 1, &mut out),
            Some(SessionEvent::TagRead {
                tag: tag.into(),
                first_since_power_up: false
            })
        );
        assert!(out.is_empty());
        s.reset_tag_read();
        assert!(!s.has_tag_been_read());
        assert_eq!(s.tag(), Some(tag));
    }
}
