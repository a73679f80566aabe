//! Text-message body carrying one visit: `timestamp,tag,temperature,weight`.

use std::fmt;

use thiserror::Error;

/// Readings outside this range are sensor faults.
pub const TEMPERATURE_RANGE_C: std::ops::RangeInclusive<f32> = -10.0..=60.0;

const FIELDS: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportParseError {
    #[error("expected {FIELDS} comma-separated fields, got {0}")]
    FieldCount(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub tag: String,
    pub temperature_c: Option<f32>,
    pub weight_g: f32,
}

/// A report body as received. Fields that failed to parse are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedReport {
    pub timestamp_ms: Option<u64>,
    pub tag: Option<String>,
    pub temperature_c: Option<f32>,
    pub weight_g: Option<f32>,
}

impl Report {
    pub fn new(timestamp_ms: u64, tag: impl Into<String>, weight_g: f32) -> Self {
        Self {
            timestamp_ms,
            tag: tag.into(),
            temperature_c: None,
            weight_g,
        }
    }

    pub fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature_c = Some(celsius);
        self
    }

    pub fn parse(body: &str) -> Result<ReceivedReport, ReportParseError> {
        let fields: Vec<&str> = body.trim().split(',').map(str::trim).collect();
        if fields.len() != FIELDS {
            return Err(ReportParseError::FieldCount(fields.len()));
        }
        let tag = Some(fields[1]).filter(|t| !t.is_empty()).map(str::to_string);
        Ok(ReceivedReport {
            timestamp_ms: fields[0].parse().ok(),
            tag,
            temperature_c: fields[2].parse().ok(),
            weight_g: fields[3].parse().ok(),
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},", self.timestamp_ms, self.tag)?;
        if let Some(t) = self.temperature_c {
            write!(f, "{t:.1}")?;
        }
        write!(f, ",{:.1}", self.weight_g)
    }
}

impl ReceivedReport {
    /// Every field present and physically plausible.
    pub fn is_complete(&self) -> bool {
        self.timestamp_ms.is_some_and(|t| t > 0)
            && self.tag.is_some()
            && self
                .temperature_c
                .is_some_and(|t| TEMPERATURE_RANGE_C.contains(&t))
            && self.weight_g.is_some_and(|w| w >= 0.0)
    }

    /// Convert to a `Report`; temperature stays optional, the rest is required.
    pub fn into_report(self) -> Option<Report> {
        Some(Report {
            timestamp_ms: self.timestamp_ms?,
            tag: self.tag?,
            temperature_c: self.temperature_c,
            weight_g: self.weight_g?,
        })
    }
}
