//! Subcommand bodies.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;
use station_config::Config;
use station_core::{
    HandshakeSession, ListenSession, Peripheral, PresenceEvent, SessionEvent,
};
use station_hardware::{
    ReplayScale, SIM_ZERO_COUNTS, SimulatedClock, SimulatedModem, SimulatedScale,
    SimulatedSerial, SimulatedSwitch,
};
use station_traits::{Clock, MonotonicClock};

use crate::station::{Outcome, Station};

/// Loop period for `run`.
const TICK_MS: u64 = 10;
/// Virtual step for `simulate`.
const SIM_STEP_MS: u32 = 50;
/// Wall-clock stand-in for simulated reports (2017-07-14T02:40:00Z).
const SIM_EPOCH_MS: u64 = 1_500_000_000_000;

fn emit(outcome: &Outcome, json: bool) {
    if json {
        println!("{}", outcome.to_json());
    } else {
        println!("{outcome}");
    }
}

fn epoch_now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

pub fn replay(cfg: &Config, trace: &Path, calibrate: bool, json: bool) -> eyre::Result<()> {
    let samples = station_config::load_sample_trace(trace)?;
    let total = samples.len();
    let clock = SimulatedClock::new();
    let mut sensor = crate::devices::weight_sensor(cfg, ReplayScale::new(samples), clock.clone());
    if calibrate {
        sensor.begin_calibration();
    }

    let mut arrivals = 0usize;
    while !sensor.scale_mut().is_exhausted() {
        if let Some(event) = sensor.update()? {
            if matches!(event, PresenceEvent::Arrived { .. }) {
                arrivals += 1;
            }
            emit(&Outcome::Presence(event), json);
        }
        clock.advance(sensor.poll_interval_ms());
    }

    let baseline = sensor.calibration().baseline();
    if json {
        println!(
            "{}",
            json!({
                "event": "summary",
                "samples": total,
                "arrivals": arrivals,
                "baseline": baseline,
                "calibrated": sensor.is_calibration_complete(),
                "highest_g": sensor.highest_weight(),
                "elapsed_ms": clock.now_ms(),
            })
        );
    } else {
        println!(
            "replayed {total} samples over {} ms: {arrivals} arrival(s), highest {:.1} g",
            clock.now_ms(),
            sensor.highest_weight()
        );
        match baseline {
            Some(b) => println!("baseline {b} counts, calibrated: {}", sensor.is_calibration_complete()),
            None => println!("no baseline (trace shorter than one window)"),
        }
    }
    Ok(())
}

pub fn simulate(
    cfg: &Config,
    grams: f32,
    tag: &str,
    registration_delay: u32,
    json: bool,
) -> eyre::Result<()> {
    if tag.len() < cfg.tag_reader.min_tag_len {
        eyre::bail!(
            "tag must be at least {} characters (tag_reader.min_tag_len)",
            cfg.tag_reader.min_tag_len
        );
    }

    let clock = SimulatedClock::new();
    let scale = SimulatedScale::new(SIM_ZERO_COUNTS, cfg.weight.scale_factor).with_jitter(40);
    let platform = scale.handle();
    let reader_port = SimulatedSerial::new();
    let reader = reader_port.handle();

    let weight = crate::devices::weight_sensor(cfg, scale, clock.clone());
    let tag_reader = Peripheral::new(
        reader_port,
        SimulatedSwitch::new(),
        ListenSession::new((&cfg.tag_reader).into()),
        clock.clone(),
    );
    let modem = Peripheral::new(
        SimulatedModem::new(registration_delay),
        SimulatedSwitch::new(),
        HandshakeSession::new((&cfg.modem).into()),
        clock.clone(),
    );
    let mut station = Station::new(weight, tag_reader, modem);
    station.begin_calibration();

    let window = u32::try_from(cfg.weight.window).unwrap_or(u32::MAX);
    let deadline = cfg
        .presence
        .idle_poll_ms
        .saturating_mul(window.saturating_add(2))
        .saturating_add(cfg.tag_reader.on_ms)
        .saturating_add(cfg.modem.on_ms.saturating_mul(2));

    let mut placed = false;
    let mut tag_presented = false;
    loop {
        let now = clock.now_ms();
        for outcome in station.tick(SIM_EPOCH_MS + u64::from(now))? {
            if matches!(outcome, Outcome::Presence(PresenceEvent::Arrived { .. }))
                && !tag_presented
            {
                reader.inject(format!("{tag}\r").as_bytes());
                tag_presented = true;
            }
            if let Outcome::Session {
                event: SessionEvent::DeviceError,
                ..
            } = outcome
            {
                eyre::bail!("simulated modem rejected a command at {now} ms");
            }
            emit(&outcome, json);
        }

        if !placed && station.is_calibration_complete() {
            tracing::info!(grams, at_ms = now, "placing weight");
            platform.place(grams);
            placed = true;
        }
        if station.reports_sent() > 0 && station.is_idle() {
            break;
        }
        if now > deadline {
            eyre::bail!("simulation did not deliver a report within {deadline} ms");
        }
        clock.advance(SIM_STEP_MS);
    }

    if json {
        println!(
            "{}",
            json!({ "event": "summary", "reports_sent": station.reports_sent(), "elapsed_ms": clock.now_ms() })
        );
    } else {
        println!(
            "simulation complete: {} report(s) sent in {} ms",
            station.reports_sent(),
            clock.now_ms()
        );
    }
    Ok(())
}

pub fn run(
    cfg: &Config,
    max_ms: Option<u64>,
    calibrate: bool,
    json: bool,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let devices = crate::devices::open(cfg)?;
    let mut station = crate::devices::build(cfg, devices, clock);
    if calibrate {
        station.begin_calibration();
    }
    tracing::info!(max_ms, "station loop started");

    let started = Instant::now();
    let result = loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break Ok(());
        }
        if max_ms.is_some_and(|limit| started.elapsed() >= Duration::from_millis(limit)) {
            break Ok(());
        }
        match station.tick(epoch_now_ms()) {
            Ok(outcomes) => outcomes.iter().for_each(|o| emit(o, json)),
            Err(e) => break Err(e),
        }
        clock.sleep(Duration::from_millis(TICK_MS));
    };

    if let Err(e) = station.shutdown() {
        tracing::warn!(error = %e, "power down on exit failed");
    }
    if !json {
        println!(
            "{} report(s) sent, {} pending",
            station.reports_sent(),
            station.pending_reports()
        );
    }
    result
}
