use std::time::Duration;

use station_core::{CalibrationCfg, PresenceCfg, PresenceEvent, StationError, WeightSensor};
use station_hardware::error::HwError;
use station_hardware::{SIM_ZERO_COUNTS, SimulatedScale, SimulatedSwitch};
use station_traits::clock::test_clock::TestClock;
use station_traits::{BoxError, PowerSwitch, Scale};

fn calibrated_sensor() -> (
    WeightSensor<SimulatedScale, TestClock>,
    station_hardware::ScaleHandle,
    TestClock,
) {
    let scale = SimulatedScale::default();
    let handle = scale.handle();
    let clock = TestClock::new();
    let mut sensor = WeightSensor::new(
        scale,
        clock.clone(),
        CalibrationCfg::default(),
        PresenceCfg::default(),
    );
    sensor.begin_calibration();
    for _ in 0..16 {
        sensor.update().unwrap();
        clock.advance(1_000);
    }
    assert!(sensor.is_calibration_complete());
    (sensor, handle, clock)
}

#[test]
fn samples_are_paced_by_poll_interval() {
    let scale = SimulatedScale::default();
    let handle = scale.handle();
    let clock = TestClock::new();
    let mut sensor = WeightSensor::new(
        scale,
        clock.clone(),
        CalibrationCfg::default(),
        PresenceCfg::default(),
    );
    sensor.update().unwrap();
    handle.place(500.0);
    clock.advance(999);
    sensor.update().unwrap();
    // Too early: the heavier load has not been sampled yet.
    assert_eq!(sensor.calibration().last_raw(), Some(SIM_ZERO_COUNTS));
    clock.advance(1);
    sensor.update().unwrap();
    assert_eq!(sensor.calibration().last_raw(), Some(SIM_ZERO_COUNTS + 356_000));
}

#[test]
fn empty_platform_reads_adjustment_offset() {
    let (sensor, _handle, _clock) = calibrated_sensor();
    let expected = 534.0 / 712.0;
    assert!((sensor.current_weight() - expected).abs() < 1e-3);
    assert_eq!(
        sensor.calibration().baseline(),
        Some(i64::from(SIM_ZERO_COUNTS) - 534)
    );
}

#[test]
fn arrival_switches_to_fast_polling() {
    let (mut sensor, handle, clock) = calibrated_sensor();
    handle.place(100.0);
    let event = sensor.update().unwrap();
    let Some(PresenceEvent::Arrived { weight_g, rise_g }) = event else {
        panic!("expected arrival, got {event:?}");
    };
    assert!((weight_g - 100.75).abs() < 0.01);
    assert!((rise_g - 100.0).abs() < 0.01);
    assert_eq!(sensor.poll_interval_ms(), 200);

    handle.place(140.0);
    clock.advance(200);
    assert_eq!(sensor.update().unwrap(), None);
    assert!((sensor.highest_weight() - 140.75).abs() < 0.01);

    handle.place(0.0);
    clock.advance(200);
    sensor.update().unwrap();
    assert!(sensor.is_present());
    assert!(matches!(
        sensor.reset_presence(),
        Some(PresenceEvent::Departed { .. })
    ));
    assert_eq!(sensor.poll_interval_ms(), 1_000);
}

struct FlakyScale {
    error: fn() -> HwError,
}

impl Scale for FlakyScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        Err(Box::new((self.error)()))
    }
}

#[test]
fn timeout_skips_the_tick() {
    let mut sensor = WeightSensor::new(
        FlakyScale {
            error: || HwError::DataReadyTimeout,
        },
        TestClock::new(),
        CalibrationCfg::default(),
        PresenceCfg::default(),
    );
    assert_eq!(sensor.update().unwrap(), None);
    assert_eq!(sensor.calibration().last_raw(), None);
}

#[test]
fn hardware_fault_propagates_with_context() {
    let mut sensor = WeightSensor::new(
        FlakyScale {
            error: || HwError::Gpio("line busy".into()),
        },
        TestClock::new(),
        CalibrationCfg::default(),
        PresenceCfg::default(),
    );
    let err = sensor.update().unwrap_err();
    assert!(format!("{err}").contains("reading scale"));
    assert!(matches!(
        err.downcast_ref::<StationError>(),
        Some(StationError::HardwareFault(_))
    ));
}

#[test]
fn amplifier_power_is_forwarded() {
    let switch = SimulatedSwitch::new();
    let mut sensor = WeightSensor::new(
        SimulatedScale::default(),
        TestClock::new(),
        CalibrationCfg::default(),
        PresenceCfg::default(),
    )
    .with_amp_power(Box::new(switch.clone()));
    sensor.power_up().unwrap();
    assert!(switch.is_on());
    sensor.power_down().unwrap();
    assert!(!switch.is_on());
    assert_eq!(switch.toggles(), 2);
}
