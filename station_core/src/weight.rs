//! Load-cell driver: paced sampling, calibration and presence detection.

use std::time::Duration;

use eyre::WrapErr;
use station_traits::{Clock, Millis, PowerSwitch, Scale};

use crate::calibration::WeightCalibration;
use crate::config::{CalibrationCfg, PresenceCfg, Timeouts};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::presence::{PresenceDetector, PresenceEvent};

pub struct WeightSensor<S, C> {
    scale: S,
    clock: C,
    calibration: WeightCalibration,
    presence: PresenceDetector,
    timeouts: Timeouts,
    amp_power: Option<Box<dyn PowerSwitch>>,
    last_poll: Option<Millis>,
}

impl<S: Scale, C: Clock> WeightSensor<S, C> {
    pub fn new(scale: S, clock: C, calibration: CalibrationCfg, presence: PresenceCfg) -> Self {
        Self {
            scale,
            clock,
            calibration: WeightCalibration::new(calibration),
            presence: PresenceDetector::new(presence),
            timeouts: Timeouts::default(),
            amp_power: None,
            last_poll: None,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Route `power_up`/`power_down` to a switch on the amplifier supply.
    pub fn with_amp_power(mut self, power: Box<dyn PowerSwitch>) -> Self {
        self.amp_power = Some(power);
        self
    }

    /// Sample if the current poll interval has elapsed.
    ///
    /// A sensor timeout skips the tick; other scale errors propagate.
    pub fn update(&mut self) -> Result<Option<PresenceEvent>> {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_poll
            && now.wrapping_sub(last) < self.presence.poll_interval_ms()
        {
            return Ok(None);
        }
        self.last_poll = Some(now);

        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let raw = match self.scale.read(timeout) {
            Ok(raw) => raw,
            Err(e) => {
                let mapped = map_hw_error(&*e);
                if mapped.is_transient() {
                    tracing::warn!(error = %mapped, "scale read timed out, skipping tick");
                    return Ok(None);
                }
                return Err(eyre::Report::new(mapped)).wrap_err("reading scale");
            }
        };
        Ok(self.step_from_raw(raw))
    }

    /// Feed one raw sample through calibration and presence detection.
    pub fn step_from_raw(&mut self, raw: i32) -> Option<PresenceEvent> {
        let grams = self.calibration.ingest(raw);
        self.presence.tick(grams)
    }

    pub fn begin_calibration(&mut self) {
        self.calibration.begin_calibration();
    }

    pub const fn is_calibration_complete(&self) -> bool {
        self.calibration.is_calibration_complete()
    }

    pub fn reset_presence(&mut self) -> Option<PresenceEvent> {
        self.presence.reset_presence()
    }

    pub fn reset_highest(&mut self) {
        self.presence.reset_highest();
    }

    pub const fn is_present(&self) -> bool {
        self.presence.is_present()
    }

    pub const fn current_weight(&self) -> f32 {
        self.calibration.last_weight()
    }

    pub const fn highest_weight(&self) -> f32 {
        self.presence.highest()
    }

    pub const fn poll_interval_ms(&self) -> u32 {
        self.presence.poll_interval_ms()
    }

    pub const fn calibration(&self) -> &WeightCalibration {
        &self.calibration
    }

    pub fn power_up(&mut self) -> Result<()> {
        if let Some(power) = self.amp_power.as_mut() {
            power
                .set_on()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("amplifier power on")?;
        }
        Ok(())
    }

    pub fn power_down(&mut self) -> Result<()> {
        if let Some(power) = self.amp_power.as_mut() {
            power
                .set_off()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("amplifier power off")?;
        }
        Ok(())
    }

    pub fn scale_mut(&mut self) -> &mut S {
        &mut self.scale
    }
}

