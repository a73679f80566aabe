//! Cellular modem: registration polling and the text-message handshake.
//!
//! Sequence: `NotRegistered -> Registered -> TextModeArmed -> AwaitingPrompt
//! -> AwaitingConfirmation -> MessageSent`. Replies that match nothing are
//! ignored. An `ERROR` reply is recorded and never retried here.

use station_traits::Millis;

use super::{Outbox, SessionEvent, SessionProtocol};
use crate::config::HandshakeCfg;
use crate::frame::Frame;

/// Ctrl-Z, ends a message body.
pub const END_OF_TEXT: u8 = 0x1A;

pub const CMD_REGISTRATION: &str = "AT+CREG?";
pub const CMD_TEXT_MODE: &str = "AT+CMGF=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    NotRegistered,
    Registered,
    TextModeArmed,
    AwaitingPrompt,
    AwaitingConfirmation,
    MessageSent,
}

pub struct HandshakeSession {
    cfg: HandshakeCfg,
    terminators: [u8; 3],
    state: ModemState,
    last_check: Option<Millis>,
    text_mode_requested: bool,
    queued: Option<Vec<u8>>,
    ok_received: bool,
    error_received: bool,
    text_sent: bool,
    commands_sent: u32,
    responses_received: u32,
}

impl HandshakeSession {
    pub fn new(cfg: HandshakeCfg) -> Self {
        let terminators = [b'\r', b'\n', cfg.replies.prompt];
        Self {
            cfg,
            terminators,
            state: ModemState::NotRegistered,
            last_check: None,
            text_mode_requested: false,
            queued: None,
            ok_received: false,
            error_received: false,
            text_sent: false,
            commands_sent: 0,
            responses_received: 0,
        }
    }

    /// Queue a message body for the configured number. Returns false if a
    /// message is already waiting.
    pub fn queue_text(&mut self, body: &str) -> bool {
        if self.queued.is_some() {
            return false;
        }
        let bytes: Vec<u8> = body.bytes().filter(|&b| b != END_OF_TEXT).collect();
        tracing::debug!(len = bytes.len(), "text queued");
        self.queued = Some(bytes);
        true
    }

    pub const fn has_queued_text(&self) -> bool {
        self.queued.is_some()
    }

    pub const fn state(&self) -> ModemState {
        self.state
    }

    pub const fn is_connected(&self) -> bool {
        !matches!(self.state, ModemState::NotRegistered)
    }

    /// Text mode is on and no send is in flight.
    pub const fn is_ready_for_text(&self) -> bool {
        matches!(
            self.state,
            ModemState::TextModeArmed | ModemState::MessageSent
        )
    }

    pub const fn ok_received(&self) -> bool {
        self.ok_received
    }

    pub const fn error_received(&self) -> bool {
        self.error_received
    }

    pub fn clear_error(&mut self) {
        self.error_received = false;
    }

    pub const fn was_text_sent(&self) -> bool {
        self.text_sent
    }

    pub fn reset_text_sent(&mut self) {
        self.text_sent = false;
    }

    pub const fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    pub const fn responses_received(&self) -> u32 {
        self.responses_received
    }

    fn send(&mut self, out: &mut Outbox, line: &str) {
        tracing::debug!(cmd = line, "modem command");
        out.push_line(line);
        self.commands_sent += 1;
    }

    fn enter(&mut self, next: ModemState) {
        tracing::debug!(from = ?self.state, to = ?next, "modem state");
        self.state = next;
    }

    fn write_body(&mut self, out: &mut Outbox) {
        let mut body = self.queued.take().unwrap_or_default();
        body.push(END_OF_TEXT);
        out.push(body);
        self.commands_sent += 1;
        self.enter(ModemState::AwaitingConfirmation);
    }
}

impl SessionProtocol for HandshakeSession {
    fn name(&self) -> &'static str {
        "modem"
    }

    fn terminators(&self) -> &[u8] {
        &self.terminators
    }

    fn frame_capacity(&self) -> usize {
        self.cfg.frame_capacity
    }

    fn on_ms(&self) -> Millis {
        self.cfg.on_ms
    }

    fn on_power_up(&mut self, now: Millis) {
        self.last_check = Some(now);
    }

    fn on_frame(&mut self, frame: &Frame, _now: Millis, out: &mut Outbox) -> Option<SessionEvent> {
        if frame.terminator == self.cfg.replies.prompt {
            if self.state != ModemState::AwaitingPrompt {
                return None;
            }
            self.responses_received += 1;
            tracing::debug!("message prompt");
            self.write_body(out);
            return Some(SessionEvent::PromptReceived);
        }

        let text = frame.text();
        let reply = text.trim();
        if reply.is_empty() {
            return None;
        }
        let replies = &self.cfg.replies;

        if reply == replies.ok {
            self.responses_received += 1;
            self.ok_received = true;
            if self.state == ModemState::Registered && self.text_mode_requested {
                self.enter(ModemState::TextModeArmed);
                return Some(SessionEvent::TextModeArmed);
            }
            return None;
        }

        if reply == replies.error {
            self.responses_received += 1;
            self.error_received = true;
            tracing::warn!(state = ?self.state, "modem replied ERROR");
            return Some(SessionEvent::DeviceError);
        }

        if let Some(rest) = reply.strip_prefix(replies.sent_prefix.as_str()) {
            self.responses_received += 1;
            let reference = rest.trim().parse::<u32>().ok();
            if self.state == ModemState::AwaitingConfirmation {
                self.text_sent = true;
                self.enter(ModemState::MessageSent);
                tracing::info!(reference, "text message sent");
                return Some(SessionEvent::MessageSent { reference });
            }
            return None;
        }

        if replies.registered.iter().any(|r| r == reply) {
            self.responses_received += 1;
            if self.state == ModemState::NotRegistered {
                self.enter(ModemState::Registered);
                tracing::info!(reply, "registered on network");
                return Some(SessionEvent::Registered);
            }
            return None;
        }

        tracing::trace!(reply, "unmatched modem reply");
        None
    }

    fn poll(&mut self, now: Millis, out: &mut Outbox) {
        match self.state {
            ModemState::NotRegistered => {
                let due = self
                    .last_check
                    .is_none_or(|t| now.wrapping_sub(t) >= self.cfg.registration_check_ms);
                if due {
                    self.last_check = Some(now);
                    self.send(out, CMD_REGISTRATION);
                }
            }
            ModemState::Registered => {
                if !self.text_mode_requested {
                    self.text_mode_requested = true;
                    self.send(out, CMD_TEXT_MODE);
                }
            }
            ModemState::TextModeArmed | ModemState::MessageSent => {
                if self.queued.is_some() {
                    let cmd = format!("AT+CMGS=\"{}\"", self.cfg.phone_number);
                    self.send(out, &cmd);
                    self.enter(ModemState::AwaitingPrompt);
                }
            }
            ModemState::AwaitingPrompt | ModemState::AwaitingConfirmation => {}
        }
    }

    /// Back to a fresh session. A queued body is kept for the next window.
    fn reset(&mut self) {
        self.state = ModemState::NotRegistered;
        self.last_check = None;
        self.text_mode_requested = false;
        self.ok_received = false;
        self.error_received = false;
        self.text_sent = false;
        self.commands_sent = 0;
        self.responses_received = 0;
    }
}
