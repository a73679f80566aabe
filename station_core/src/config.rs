//! Runtime configuration for the station components.
//!
//! These are the structs the core consumes. They are separate from the
//! TOML-deserialized config in `station_config`; see `conversions`.

/// Raw-to-grams conversion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCfg {
    /// Running-average window. A baseline is captured when it first wraps.
    pub window: usize,
    /// Raw counts per gram.
    pub scale_factor: f32,
    /// Counts subtracted from the wrap average to form the baseline.
    pub adjust_counts: i64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            window: 16,
            scale_factor: 712.0,
            adjust_counts: 534,
        }
    }
}

/// Presence threshold and the two poll rates it switches between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceCfg {
    /// Minimum rise (grams) between consecutive readings to count as arrival.
    pub trigger_g: f32,
    pub idle_poll_ms: u32,
    pub active_poll_ms: u32,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            trigger_g: 25.0,
            idle_poll_ms: 1_000,
            active_poll_ms: 200,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 150 }
    }
}

/// Tag reader session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenCfg {
    /// Default power-on window.
    pub on_ms: u32,
    pub frame_capacity: usize,
    /// Frames shorter than this are discarded.
    pub min_tag_len: usize,
}

impl Default for ListenCfg {
    fn default() -> Self {
        Self {
            on_ms: 30_000,
            frame_capacity: 48,
            min_tag_len: 16,
        }
    }
}

/// Expected modem replies.
///
/// Status replies are compared exactly against the trimmed frame text; the
/// send acknowledgement is matched by prefix. The prompt is recognised by the
/// byte that terminated the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPatterns {
    pub ok: String,
    pub error: String,
    pub prompt: u8,
    pub sent_prefix: String,
    pub registered: Vec<String>,
}

impl Default for ReplyPatterns {
    fn default() -> Self {
        Self {
            ok: "OK".into(),
            error: "ERROR".into(),
            prompt: b'>',
            sent_prefix: "+CMGS:".into(),
            registered: vec![
                "+CREG: 0,1".into(),
                "+CREG: 0,5".into(),
                "+CREG: 1".into(),
                "+CREG: 5".into(),
            ],
        }
    }
}

/// Modem session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeCfg {
    /// Default power-on window.
    pub on_ms: u32,
    pub frame_capacity: usize,
    /// Minimum spacing between `AT+CREG?` queries.
    pub registration_check_ms: u32,
    pub phone_number: String,
    pub replies: ReplyPatterns,
}

impl Default for HandshakeCfg {
    fn default() -> Self {
        Self {
            on_ms: 300_000,
            frame_capacity: 30,
            registration_check_ms: 10_000,
            phone_number: "+15005550006".into(),
            replies: ReplyPatterns::default(),
        }
    }
}
