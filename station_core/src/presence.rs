//! Presence detection on calibrated weight with two-rate polling.

use crate::config::PresenceCfg;

/// Poll rate selected by the presence flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresenceEvent {
    /// Weight rose by more than the trigger between two readings.
    Arrived { weight_g: f32, rise_g: f32 },
    /// Presence was acknowledged and cleared by the caller.
    Departed { highest_g: f32 },
}

/// Latches presence on a sharp rise in weight.
///
/// A falling reading never clears presence; only `reset_presence` does.
#[derive(Debug, Clone)]
pub struct PresenceDetector {
    cfg: PresenceCfg,
    previous: f32,
    current: f32,
    highest: f32,
    detected: bool,
}

impl PresenceDetector {
    pub const fn new(cfg: PresenceCfg) -> Self {
        Self {
            cfg,
            previous: 0.0,
            current: 0.0,
            highest: 0.0,
            detected: false,
        }
    }

    /// Feed the latest weight. Returns `Arrived` on the idle-to-active edge.
    pub fn tick(&mut self, weight_g: f32) -> Option<PresenceEvent> {
        self.previous = self.current;
        self.current = weight_g;
        let rise = self.current - self.previous;

        let mut event = None;
        if rise > self.cfg.trigger_g && !self.detected {
            self.detected = true;
            tracing::info!(weight_g, rise_g = rise, "presence detected");
            event = Some(PresenceEvent::Arrived {
                weight_g,
                rise_g: rise,
            });
        }
        if self.detected && weight_g > self.highest {
            self.highest = weight_g;
        }
        event
    }

    /// Acknowledge presence. Emits `Departed` only if presence was latched.
    pub fn reset_presence(&mut self) -> Option<PresenceEvent> {
        if !self.detected {
            return None;
        }
        self.detected = false;
        tracing::debug!(highest_g = self.highest, "presence reset");
        Some(PresenceEvent::Departed {
            highest_g: self.highest,
        })
    }

    pub fn reset_highest(&mut self) {
        self.highest = 0.0;
    }

    pub const fn is_present(&self) -> bool {
        self.detected
    }

    pub const fn poll_state(&self) -> PollState {
        if self.detected {
            PollState::Active
        } else {
            PollState::Idle
        }
    }

    pub const fn poll_interval_ms(&self) -> u32 {
        match self.poll_state() {
            PollState::Active => self.cfg.active_poll_ms,
            PollState::Idle => self.cfg.idle_poll_ms,
        }
    }

    pub const fn current(&self) -> f32 {
        self.current
    }

    pub const fn highest(&self) -> f32 {
        self.highest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rise_while_active_only_moves_watermark() {
        let mut det = PresenceDetector::new(PresenceCfg::default());
        assert!(det.tick(30.0).is_some());
        assert!(det.tick(80.0).is_none());
        assert_eq!(det.highest(), 80.0);
        assert!(det.tick(10.0).is_none());
        assert!(det.is_present());
        assert_eq!(det.highest(), 80.0);
    }

    #[test]
    fn reset_without_presence_is_silent() {
        let mut det = PresenceDetector::new(PresenceCfg::default());
        assert_eq!(det.reset_presence(), None);
        det.tick(40.0);
        assert_eq!(
            det.reset_presence(),
            Some(PresenceEvent::Departed { highest_g: 40.0 })
        );
        assert_eq!(det.poll_state(), PollState::Idle);
        det.reset_highest();
        assert_eq!(det.highest(), 0.0);
    }
}
