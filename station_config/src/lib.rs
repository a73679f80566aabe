#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and sample-trace parsing for the field station.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults matching the deployed station, so an empty
//!   file is a valid configuration.
//! - Sample traces are CSV files of raw load-cell readings used for replay.
use serde::Deserialize;

/// Raw sample trace schema.
///
/// Expected header:
/// raw
///
/// Example:
/// raw
/// 8389142
/// 8389150
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SampleRow {
    pub raw: i64,
}

/// GPIO and UART assignment. Only read by hardware builds.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    pub tag_power: u8,
    pub modem_power: u8,
    pub tag_uart: String,
    pub modem_uart: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeightCfg {
    /// Running-average window (samples). Also the calibration lap length.
    pub window: usize,
    /// Raw counts per gram.
    pub scale_factor: f32,
    /// Counts subtracted from the averaged baseline when it is captured.
    pub adjust_counts: i64,
    /// Max time to wait for HX711 data-ready before giving up on a tick.
    pub read_timeout_ms: u64,
    /// Extra clock pulses after each conversion (1 = channel A, gain 128).
    pub gain_pulses: u8,
}

impl Default for WeightCfg {
    fn default() -> Self {
        Self {
            window: 16,
            scale_factor: 712.0,
            adjust_counts: 534,
            read_timeout_ms: 150,
            gain_pulses: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceCfg {
    /// Rise in grams between consecutive readings that counts as an arrival.
    pub trigger_g: f32,
    /// Poll interval while nothing is on the platform.
    pub idle_poll_ms: u32,
    /// Poll interval once presence has been detected.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TagReaderCfg {
    /// Power-on window in milliseconds.
    pub on_ms: u32,
    pub frame_capacity: usize,
    /// Shortest payload accepted as a tag.
    pub min_tag_len: usize,
    pub baud: u32,
}

impl Default for TagReaderCfg {
    fn default() -> Self {
        Self {
            on_ms: 30_000,
            frame_capacity: 48,
            min_tag_len: 16,
            baud: 9_600,
        }
    }
}

/// Expected modem replies. Status replies match exactly (after trimming
/// whitespace); `sent_prefix` matches the start of the send acknowledgement.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Replies {
    pub ok: String,
    pub error: String,
    pub prompt: char,
    pub sent_prefix: String,
    pub registered: Vec<String>,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            ok: "OK".into(),
            error: "ERROR".into(),
            prompt: '>',
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModemCfg {
    /// Power-on window in milliseconds.
    pub on_ms: u32,
    pub frame_capacity: usize,
    /// Minimum spacing between network registration queries.
    pub registration_check_ms: u32,
    /// Destination of report messages.
    pub phone_number: String,
    pub baud: u32,
    pub replies: Replies,
}

impl Default for ModemCfg {
    fn default() -> Self {
        Self {
            on_ms: 300_000,
            frame_capacity: 30,
            registration_check_ms: 10_000,
            phone_number: "+15005550006".into(),
            baud: 19_200,
            replies: Replies::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Option<Pins>,
    pub weight: WeightCfg,
    pub presence: PresenceCfg,
    pub tag_reader: TagReaderCfg,
    pub modem: ModemCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Weight
        if self.weight.window == 0 {
            eyre::bail!("weight.window must be >= 1");
        }
        if self.weight.window > 1024 {
            eyre::bail!("weight.window is unreasonably large (>1024)");
        }
        if !(self.weight.scale_factor.is_finite() && self.weight.scale_factor > 0.0) {
            eyre::bail!("weight.scale_factor must be > 0");
        }
        if self.weight.adjust_counts.abs() > 0xFF_FFFF {
            eyre::bail!("weight.adjust_counts must fit in 24 bits");
        }
        if self.weight.read_timeout_ms == 0 {
            eyre::bail!("weight.read_timeout_ms must be >= 1");
        }
        if !(1..=3).contains(&self.weight.gain_pulses) {
            eyre::bail!("weight.gain_pulses must be in [1, 3]");
        }

        // Presence
        if !(self.presence.trigger_g.is_finite() && self.presence.trigger_g > 0.0) {
            eyre::bail!("presence.trigger_g must be > 0");
        }
        if self.presence.idle_poll_ms == 0 || self.presence.active_poll_ms == 0 {
            eyre::bail!("presence poll intervals must be >= 1 ms");
        }
        if self.presence.active_poll_ms > self.presence.idle_poll_ms {
            eyre::bail!("presence.active_poll_ms must not exceed presence.idle_poll_ms");
        }

        // Tag reader
        if self.tag_reader.on_ms == 0 {
            eyre::bail!("tag_reader.on_ms must be >= 1");
        }
        if self.tag_reader.frame_capacity < 2 {
            eyre::bail!("tag_reader.frame_capacity must be >= 2");
        }
        if self.tag_reader.min_tag_len >= self.tag_reader.frame_capacity {
            eyre::bail!("tag_reader.min_tag_len must be < tag_reader.frame_capacity");
        }

        // Modem
        if self.modem.on_ms == 0 {
            eyre::bail!("modem.on_ms must be >= 1");
        }
        if self.modem.frame_capacity < 2 {
            eyre::bail!("modem.frame_capacity must be >= 2");
        }
        if self.modem.registration_check_ms == 0 {
            eyre::bail!("modem.registration_check_ms must be >= 1");
        }
        if self.modem.registration_check_ms >= self.modem.on_ms {
            eyre::bail!("modem.registration_check_ms must be shorter than modem.on_ms");
        }
        let number = self.modem.phone_number.trim();
        if number.is_empty()
            || !number
                .trim_start_matches('+')
                .chars()
                .all(|c| c.is_ascii_digit())
        {
            eyre::bail!("modem.phone_number must be digits with an optional leading '+'");
        }
        let replies = &self.modem.replies;
        if !replies.prompt.is_ascii() {
            eyre::bail!("modem.replies.prompt must be an ASCII character");
        }
        if replies.ok.is_empty() || replies.error.is_empty() || replies.sent_prefix.is_empty() {
            eyre::bail!("modem.replies patterns must not be empty");
        }
        if replies.registered.is_empty() {
            eyre::bail!("modem.replies.registered must list at least one reply");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Load a raw sample trace (strict `raw` header) for replay.
pub fn load_sample_trace(path: &std::path::Path) -> eyre::Result<Vec<i32>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open sample trace {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw"];
    let actual: Vec<String> = headers.iter().map(|s| s.trim().to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "sample trace CSV must have header 'raw', got: {}",
            actual.join(",")
        );
    }

    let mut samples = Vec::new();
    for (idx, rec) in rdr.deserialize::<SampleRow>().enumerate() {
        match rec {
            Ok(row) => {
                let raw = i32::try_from(row.raw).map_err(|_| {
                    eyre::eyre!("sample trace row {}: raw value {} out of range", idx + 2, row.raw)
                })?;
                samples.push(raw);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    if samples.is_empty() {
        eyre::bail!("sample trace {:?} contains no samples", path);
    }
    Ok(samples)
}
