//! Visit workflow: weight arrival powers the tag reader, a tag read queues a
//! report and powers the modem, a confirmed send powers the modem down once
//! no reports are left.

use std::collections::VecDeque;

use station_core::error::Result;
use station_core::{
    HandshakeSession, ListenSession, Peripheral, PresenceEvent, Report, SessionEvent,
    WeightSensor,
};
use station_traits::{ByteStream, Clock, PowerSwitch, Scale};

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Presence(PresenceEvent),
    Session {
        device: &'static str,
        event: SessionEvent,
    },
    ReportQueued(Report),
    /// Presence was latched but the reader window closed without a tag.
    NoTag,
}

impl Outcome {
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Self::Presence(PresenceEvent::Arrived { weight_g, rise_g }) => {
                json!({ "event": "arrived", "weight_g": weight_g, "rise_g": rise_g })
            }
            Self::Presence(PresenceEvent::Departed { highest_g }) => {
                json!({ "event": "departed", "highest_g": highest_g })
            }
            Self::Session { device, event } => match event {
                SessionEvent::TagRead {
                    tag,
                    first_since_power_up,
                } => json!({
                    "event": "tag_read",
                    "device": device,
                    "tag": tag,
                    "first_since_power_up": first_since_power_up,
                }),
                SessionEvent::MessageSent { reference } => {
                    json!({ "event": "message_sent", "device": device, "reference": reference })
                }
                other => json!({ "event": format!("{other:?}"), "device": device }),
            },
            Self::ReportQueued(report) => {
                json!({ "event": "report_queued", "body": report.to_string() })
            }
            Self::NoTag => json!({ "event": "no_tag" }),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Presence(PresenceEvent::Arrived { weight_g, rise_g }) => {
                write!(f, "arrived: {weight_g:.1} g (rise {rise_g:.1} g)")
            }
            Self::Presence(PresenceEvent::Departed { highest_g }) => {
                write!(f, "presence cleared: highest {highest_g:.1} g")
            }
            Self::Session { device, event } => match event {
                SessionEvent::TagRead { tag, .. } => write!(f, "{device}: tag {tag}"),
                SessionEvent::MessageSent {
                    reference: Some(r),
                } => write!(f, "{device}: message sent (ref {r})"),
                other => write!(f, "{device}: {other:?}"),
            },
            Self::ReportQueued(report) => write!(f, "report queued: {report}"),
            Self::NoTag => f.write_str("no tag read before the reader timed out"),
        }
    }
}

/// Reports waiting behind the one handed to the modem. Oldest is dropped
/// when full.
pub const BACKLOG_CAPACITY: usize = 8;

pub struct Station<S, C, Bt, Pt, Bm, Pm> {
    weight: WeightSensor<S, C>,
    tag_reader: Peripheral<Bt, Pt, ListenSession, C>,
    modem: Peripheral<Bm, Pm, HandshakeSession, C>,
    backlog: VecDeque<Report>,
    reports_sent: u32,
}

impl<S, C, Bt, Pt, Bm, Pm> Station<S, C, Bt, Pt, Bm, Pm>
where
    S: Scale,
    C: Clock,
    Bt: ByteStream,
    Pt: PowerSwitch,
    Bm: ByteStream,
    Pm: PowerSwitch,
{
    pub fn new(
        weight: WeightSensor<S, C>,
        tag_reader: Peripheral<Bt, Pt, ListenSession, C>,
        modem: Peripheral<Bm, Pm, HandshakeSession, C>,
    ) -> Self {
        Self {
            weight,
            tag_reader,
            modem,
            backlog: VecDeque::new(),
            reports_sent: 0,
        }
    }

    /// One pass over every device. `epoch_ms` stamps any report built.
    pub fn tick(&mut self, epoch_ms: u64) -> Result<Vec<Outcome>> {
        let mut out = Vec::new();

        if let Some(event) = self.weight.update()? {
            if matches!(event, PresenceEvent::Arrived { .. }) {
                self.tag_reader.power_up()?;
            }
            out.push(Outcome::Presence(event));
        }

        let reader_was_on = self.tag_reader.is_on();
        for event in self.tag_reader.update()? {
            if let SessionEvent::TagRead { tag, .. } = &event {
                let report = Report::new(epoch_ms, tag.clone(), self.weight.highest_weight());
                out.push(Outcome::Session {
                    device: "tag_reader",
                    event: event.clone(),
                });
                self.queue_report(report, &mut out)?;
                self.tag_reader.protocol_mut().reset_tag_read();
                self.tag_reader.power_down()?;
                if let Some(cleared) = self.weight.reset_presence() {
                    out.push(Outcome::Presence(cleared));
                }
                self.weight.reset_highest();
            }
        }
        if reader_was_on && !self.tag_reader.is_on() && self.weight.is_present() {
            out.push(Outcome::NoTag);
            if let Some(cleared) = self.weight.reset_presence() {
                out.push(Outcome::Presence(cleared));
            }
            self.weight.reset_highest();
        }

        for event in self.modem.update()? {
            match &event {
                SessionEvent::MessageSent { .. } => {
                    self.reports_sent += 1;
                    self.modem.protocol_mut().reset_text_sent();
                    self.feed_modem();
                    if !self.modem.protocol().has_queued_text() {
                        self.modem.power_down()?;
                    }
                }
                SessionEvent::DeviceError => {
                    tracing::warn!("modem reported an error; leaving retry to the next window");
                    self.modem.protocol_mut().clear_error();
                }
                _ => {}
            }
            out.push(Outcome::Session {
                device: "modem",
                event,
            });
        }

        Ok(out)
    }

    /// Add a report behind any unsent ones and open a modem window for them.
    ///
    /// A body left over from a window that closed before the send goes out
    /// first.
    fn queue_report(&mut self, report: Report, out: &mut Vec<Outcome>) -> Result<()> {
        if self.backlog.len() == BACKLOG_CAPACITY
            && let Some(dropped) = self.backlog.pop_front()
        {
            tracing::warn!(body = %dropped, "report backlog full, oldest report dropped");
        }
        out.push(Outcome::ReportQueued(report.clone()));
        self.backlog.push_back(report);
        self.feed_modem();
        self.modem.power_up()
    }

    /// Hand the next backlog entry to the modem session if it is free.
    fn feed_modem(&mut self) {
        if self.modem.protocol().has_queued_text() {
            return;
        }
        if let Some(next) = self.backlog.pop_front() {
            let body = next.to_string();
            if self.modem.protocol_mut().queue_text(&body) {
                tracing::debug!(body = %body, backlog = self.backlog.len(), "report handed to modem");
            }
        }
    }

    /// Reports not yet confirmed by the modem.
    pub fn pending_reports(&self) -> usize {
        self.backlog.len() + usize::from(self.modem.protocol().has_queued_text())
    }

    pub fn begin_calibration(&mut self) {
        self.weight.begin_calibration();
    }

    pub const fn is_calibration_complete(&self) -> bool {
        self.weight.is_calibration_complete()
    }

    pub const fn reports_sent(&self) -> u32 {
        self.reports_sent
    }

    pub const fn is_idle(&self) -> bool {
        !self.tag_reader.is_on() && !self.modem.is_on()
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.tag_reader.power_down()?;
        self.modem.power_down()?;
        self.weight.power_down()
    }
}
