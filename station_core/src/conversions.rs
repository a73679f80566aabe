//! `From` implementations bridging `station_config` types to `station_core` types.

use crate::config::{CalibrationCfg, HandshakeCfg, ListenCfg, PresenceCfg, ReplyPatterns, Timeouts};

// ── CalibrationCfg ───────────────────────────────────────────────────────────

impl From<&station_config::WeightCfg> for CalibrationCfg {
    fn from(c: &station_config::WeightCfg) -> Self {
        Self {
            window: c.window,
            scale_factor: c.scale_factor,
            adjust_counts: c.adjust_counts,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&station_config::WeightCfg> for Timeouts {
    fn from(c: &station_config::WeightCfg) -> Self {
        Self {
            sensor_ms: c.read_timeout_ms,
        }
    }
}

// ── PresenceCfg ──────────────────────────────────────────────────────────────

impl From<&station_config::PresenceCfg> for PresenceCfg {
    fn from(c: &station_config::PresenceCfg) -> Self {
        Self {
            trigger_g: c.trigger_g,
            idle_poll_ms: c.idle_poll_ms,
            active_poll_ms: c.active_poll_ms,
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

impl From<&station_config::TagReaderCfg> for ListenCfg {
    fn from(c: &station_config::TagReaderCfg) -> Self {
        Self {
            on_ms: c.on_ms,
            frame_capacity: c.frame_capacity,
            min_tag_len: c.min_tag_len,
        }
    }
}

impl From<&station_config::Replies> for ReplyPatterns {
    fn from(c: &station_config::Replies) -> Self {
        // Validation rejects non-ASCII prompts; fall back to the stock prompt.
        let prompt = u8::try_from(c.prompt).unwrap_or(b'>');
        Self {
            ok: c.ok.clone(),
            error: c.error.clone(),
            prompt,
            sent_prefix: c.sent_prefix.clone(),
            registered: c.registered.clone(),
        }
    }
}

impl From<&station_config::ModemCfg> for HandshakeCfg {
    fn from(c: &station_config::ModemCfg) -> Self {
        Self {
            on_ms: c.on_ms,
            frame_capacity: c.frame_capacity,
            registration_check_ms: c.registration_check_ms,
            phone_number: c.phone_number.trim().to_string(),
            replies: ReplyPatterns::from(&c.replies),
        }
    }
}
