//! Raw-to-grams conversion with a self-established zero baseline.

use crate::average::RunningAverage;
use crate::config::CalibrationCfg;

/// Converts raw amplifier counts to grams.
///
/// Until a baseline exists the engine reports deviation from the running
/// average. The baseline is captured once, the first time the averaging
/// window wraps while unset, as `average - adjust_counts`.
#[derive(Debug, Clone)]
pub struct WeightCalibration {
    cfg: CalibrationCfg,
    average: RunningAverage,
    baseline: Option<i64>,
    armed: bool,
    complete: bool,
    last_raw: Option<i32>,
    last_weight: f32,
}

impl WeightCalibration {
    pub fn new(cfg: CalibrationCfg) -> Self {
        Self {
            average: RunningAverage::new(cfg.window),
            cfg,
            baseline: None,
            armed: false,
            complete: false,
            last_raw: None,
            last_weight: 0.0,
        }
    }

    /// Drop the baseline and capture a new one on the next window wrap.
    pub fn begin_calibration(&mut self) {
        tracing::debug!("calibration armed");
        self.baseline = None;
        self.armed = true;
        self.complete = false;
    }

    /// Feed one raw sample and return the calibrated weight in grams.
    pub fn ingest(&mut self, raw: i32) -> f32 {
        let avg = self.average.record(raw);
        if self.baseline.is_none() && self.average.at_wrap_boundary() {
            let baseline = avg - self.cfg.adjust_counts;
            self.baseline = Some(baseline);
            tracing::debug!(baseline, average = avg, "baseline established");
            if self.armed {
                self.armed = false;
                self.complete = true;
                tracing::info!(baseline, "calibration complete");
            }
        }
        let grams = self.to_grams(raw);
        self.last_raw = Some(raw);
        self.last_weight = grams;
        tracing::trace!(raw, grams, "weight sample");
        grams
    }

    /// Convert without touching the averaging window.
    pub fn to_grams(&self, raw: i32) -> f32 {
        let zero = self.baseline.unwrap_or_else(|| self.average.average());
        let counts = (i64::from(raw) - zero).abs();
        counts as f32 / self.cfg.scale_factor
    }

    /// True once a deliberately armed calibration cycle has captured a baseline.
    pub const fn is_calibration_complete(&self) -> bool {
        self.complete
    }

    pub const fn baseline(&self) -> Option<i64> {
        self.baseline
    }

    pub fn average(&self) -> i64 {
        self.average.average()
    }

    pub const fn last_raw(&self) -> Option<i32> {
        self.last_raw
    }

    pub const fn last_weight(&self) -> f32 {
        self.last_weight
    }

    pub const fn config(&self) -> &CalibrationCfg {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(window: usize) -> CalibrationCfg {
        CalibrationCfg {
            window,
            scale_factor: 10.0,
            adjust_counts: 0,
        }
    }

    #[test]
    fn reports_deviation_from_average_before_baseline() {
        let mut cal = WeightCalibration::new(cfg(4));
        assert_eq!(cal.ingest(100), 0.0);
        // average of 100 and 200 is 150
        assert!((cal.ingest(200) - 5.0).abs() < 1e-6);
        assert!(cal.baseline().is_none());
    }

    #[test]
    fn baseline_captured_on_first_wrap_only() {
        let mut cal = WeightCalibration::new(CalibrationCfg {
            adjust_counts: 5,
            ..cfg(2)
        });
        cal.ingest(100);
        cal.ingest(110);
        assert_eq!(cal.baseline(), Some(100));
        cal.ingest(500);
        cal.ingest(500);
        assert_eq!(cal.baseline(), Some(100));
    }

    #[test]
    fn incidental_baseline_does_not_complete_calibration() {
        let mut cal = WeightCalibration::new(cfg(2));
        cal.ingest(1);
        cal.ingest(1);
        assert!(cal.baseline().is_some());
        assert!(!cal.is_calibration_complete());
    }

    #[test]
    fn grams_are_never_negative() {
        let mut cal = WeightCalibration::new(cfg(1));
        cal.ingest(1_000);
        assert!((cal.to_grams(900) - 10.0).abs() < 1e-6);
        assert!((cal.to_grams(1_100) - 10.0).abs() < 1e-6);
    }
}
