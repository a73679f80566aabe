//! Device assembly: simulated by default, real GPIO/UART with `--features hardware`.

use station_config::Config;
use station_core::{
    HandshakeSession, ListenSession, Peripheral, WeightSensor, hw_error::map_hw_error,
};
use station_traits::{ByteStream, Clock, PowerSwitch, Scale};

use crate::station::Station;

/// Trait-object devices so both backends share one station type.
pub struct Devices {
    pub scale: Box<dyn Scale>,
    pub tag_stream: Box<dyn ByteStream>,
    pub tag_power: Box<dyn PowerSwitch>,
    pub modem_stream: Box<dyn ByteStream>,
    pub modem_power: Box<dyn PowerSwitch>,
}

pub type DynStation<C> = Station<
    Box<dyn Scale>,
    C,
    Box<dyn ByteStream>,
    Box<dyn PowerSwitch>,
    Box<dyn ByteStream>,
    Box<dyn PowerSwitch>,
>;

#[cfg(not(feature = "hardware"))]
pub fn open(cfg: &Config) -> eyre::Result<Devices> {
    use station_hardware::{
        SIM_ZERO_COUNTS, SimulatedModem, SimulatedScale, SimulatedSerial, SimulatedSwitch,
    };
    tracing::info!("using simulated devices");
    Ok(Devices {
        scale: Box::new(SimulatedScale::new(SIM_ZERO_COUNTS, cfg.weight.scale_factor)),
        tag_stream: Box::new(SimulatedSerial::new()),
        tag_power: Box::new(SimulatedSwitch::new()),
        modem_stream: Box::new(SimulatedModem::new(1)),
        modem_power: Box::new(SimulatedSwitch::new()),
    })
}

#[cfg(feature = "hardware")]
pub fn open(cfg: &Config) -> eyre::Result<Devices> {
    use eyre::WrapErr;
    use station_hardware::hardware::{GpioSwitch, HardwareScale, UartStream};

    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| eyre::eyre!("invalid configuration: [pins] is required for hardware"))?;
    let scale = HardwareScale::try_new(pins.hx711_dt, pins.hx711_sck, cfg.weight.gain_pulses)
        .wrap_err("open hx711")?;
    let tag_power = GpioSwitch::open(pins.tag_power).wrap_err("open tag reader power pin")?;
    let modem_power = GpioSwitch::open(pins.modem_power).wrap_err("open modem power pin")?;
    let tag_stream =
        UartStream::open(&pins.tag_uart, cfg.tag_reader.baud).wrap_err("open tag reader uart")?;
    let modem_stream =
        UartStream::open(&pins.modem_uart, cfg.modem.baud).wrap_err("open modem uart")?;
    tracing::info!(
        hx711_dt = pins.hx711_dt,
        hx711_sck = pins.hx711_sck,
        tag_uart = %pins.tag_uart,
        modem_uart = %pins.modem_uart,
        "hardware opened"
    );
    Ok(Devices {
        scale: Box::new(scale),
        tag_stream: Box::new(tag_stream),
        tag_power: Box::new(tag_power),
        modem_stream: Box::new(modem_stream),
        modem_power: Box::new(modem_power),
    })
}

/// Weight pipeline for `scale` with every `[weight]` and `[presence]` setting applied.
pub fn weight_sensor<S: Scale, C: Clock>(cfg: &Config, scale: S, clock: C) -> WeightSensor<S, C> {
    WeightSensor::new(scale, clock, (&cfg.weight).into(), (&cfg.presence).into())
        .with_timeouts((&cfg.weight).into())
}

/// Wire opened devices into a station sharing `clock`.
pub fn build<C: Clock + Clone>(cfg: &Config, devices: Devices, clock: C) -> DynStation<C> {
    let weight = weight_sensor(cfg, devices.scale, clock.clone());
    let tag_reader = Peripheral::new(
        devices.tag_stream,
        devices.tag_power,
        ListenSession::new((&cfg.tag_reader).into()),
        clock.clone(),
    );
    let modem = Peripheral::new(
        devices.modem_stream,
        devices.modem_power,
        HandshakeSession::new((&cfg.modem).into()),
        clock,
    );
    Station::new(weight, tag_reader, modem)
}

/// Open every device and take one scale reading.
pub fn self_check(cfg: &Config) -> eyre::Result<i32> {
    use eyre::WrapErr;
    let mut devices = open(cfg)?;
    let timeout = std::time::Duration::from_millis(cfg.weight.read_timeout_ms);
    let raw = devices
        .scale
        .read(timeout)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("self-check scale read")?;
    for (name, power) in [
        ("tag reader", &mut devices.tag_power),
        ("modem", &mut devices.modem_power),
    ] {
        power
            .set_off()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("self-check {name} power"))?;
    }
    Ok(raw)
}
