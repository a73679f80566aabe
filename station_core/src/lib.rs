#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Field station core (hardware-agnostic).
//!
//! Everything here is tick-driven and single-threaded. Hardware is reached
//! only through the `station_traits` seams (`Scale`, `PowerSwitch`,
//! `ByteStream`, `Clock`).
//!
//! ## Architecture
//!
//! - **Weight**: `RunningAverage` → `WeightCalibration` → `PresenceDetector`,
//!   driven by `WeightSensor`
//! - **Serial peripherals**: `FrameAccumulator` + `DutyCycleWindow` + a
//!   `SessionProtocol` (`ListenSession` for the tag reader,
//!   `HandshakeSession` for the modem), driven by `Peripheral`
//! - **Reports**: the CSV text-message body (`report`)
//! - **Configuration**: runtime config structs (`config`) and conversions
//!   from `station_config`

pub mod average;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod duty_cycle;
pub mod error;
pub mod frame;
pub mod hw_error;
pub mod peripheral;
pub mod presence;
pub mod report;
pub mod session;
pub mod weight;

pub use average::RunningAverage;
pub use calibration::WeightCalibration;
pub use config::{CalibrationCfg, HandshakeCfg, ListenCfg, PresenceCfg, ReplyPatterns, Timeouts};
pub use duty_cycle::{DutyCycleWindow, WindowState};
pub use error::{Result, StationError};
pub use frame::{Frame, FrameAccumulator};
pub use peripheral::Peripheral;
pub use presence::{PollState, PresenceDetector, PresenceEvent};
pub use report::{ReceivedReport, Report, ReportParseError};
pub use session::{
    HandshakeSession, ListenSession, ModemState, Outbox, SessionEvent, SessionProtocol,
};
pub use weight::WeightSensor;
