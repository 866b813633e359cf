#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core pit-controller logic (hardware-agnostic).
//!
//! This crate provides the deterministic control and monitoring kernel for a
//! blower/damper barbecue-pit controller. All hardware interactions go
//! through the `pitctl_traits` port traits, so the whole kernel runs on the
//! host with in-memory fakes and a manual clock.
//!
//! ## Architecture
//!
//! - **Probes**: ADC conditioning, Steinhart-Hart conversion, open/short
//!   classification (`probe` module)
//! - **Regulation**: PID with lid-open suppression (`pid`), split-range
//!   mapping (`split`), fan and damper actuators (`fan`, `damper`)
//! - **Monitoring**: alarm state machine (`alarm`), fault monitor with
//!   fire-out detection (`faults`), meat-completion predictor (`predictor`)
//! - **Recording**: circular cook-session recorder with crash recovery
//!   (`session`)
//! - **Orchestration**: `PitController` owns everything and runs the
//!   cooperative ~100 Hz tick (`controller`, `builder`)
//!
//! ## Units
//!
//! Temperatures flow as `f32` degrees in the configured unit; the session
//! recorder stores deci-degrees (`i16`, x10) for a 13-byte data point. See
//! `fixed_point`.

pub mod alarm;
pub mod builder;
pub mod config;
pub mod controller;
pub mod damper;
pub mod error;
pub mod fan;
pub mod faults;
pub mod fixed_point;
pub mod hw_error;
pub mod mocks;
pub mod pid;
pub mod predictor;
pub mod probe;
pub mod session;
pub mod snapshot;
pub mod split;

pub use alarm::{AlarmCenter, AlarmInputs, AlarmKind, MAX_ACTIVE_ALARMS};
pub use builder::{BoxedController, PitBuilder, build_controller};
pub use config::{
    AlarmCfg, CoreConfig, DamperCfg, FanCfg, FireOutCfg, LidCfg, PidCfg, PredictorCfg, ProbeCfg,
    SamplerCfg, SessionCfg, Unit,
};
pub use controller::{Command, CommandSender, PitController};
pub use damper::DamperDrive;
pub use error::{BuildError, CoreError, Result};
pub use fan::FanDrive;
pub use faults::{FaultEntry, FaultKind, FaultMonitor, MAX_FAULTS};
pub use pid::PitPid;
pub use predictor::{EtaPredictor, MIN_SAMPLES, WINDOW_SLOTS};
pub use probe::{MeatProbe, ProbeId, ProbeReading, ProbeSampler, ProbeStatus};
pub use session::{CookSession, DATA_POINT_LEN, DataPoint, SessionSample};
pub use snapshot::StateSnapshot;
pub use split::{SplitOutput, split_output};
