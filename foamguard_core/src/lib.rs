#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Reservoir foam control core (hardware-agnostic).
//!
//! All hardware goes through `foamguard_traits::{LevelSwitches, FoamProbe, Pump}`.
//!
//! ## Architecture
//!
//! - **Sampling**: level quantization and foam filtering (`sampler`, `level`, `filter`)
//! - **Control**: auto/manual arbitration with hysteresis and shutdown latch (`arbiter`)
//! - **Commands**: channel payloads normalized to one command set (`command`)
//! - **Fan-out**: change detection and per-channel cadences (`fanout`)
//! - **Outbound**: one bounded worker thread per channel (`outbound`)
//! - **Runtime**: `ControlCore::tick` and the cooperative `Runner`
//!
//! The core itself is single-threaded and lock-free; only outbound sinks and
//! inbound readers live on other threads.

pub mod arbiter;
pub mod builder;
pub mod button;
pub mod command;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod fanout;
pub mod filter;
pub mod hw_error;
pub mod level;
pub mod mocks;
pub mod outbound;
pub mod runner;
pub mod sampler;
pub mod snapshot;
pub mod util;

pub use arbiter::{ControlMode, ManualAction, Transition, TransitionReason};
pub use builder::{CoreBuilder, DynCore, Missing, Set, build_core};
pub use command::{CanonicalCommand, CommandChannel, HELP_TEXT, InboundCommand, normalize};
pub use config::{ControlCfg, FoamKind, OutboundCfg, RunnerCfg, SamplerCfg, ScheduleCfg};
pub use core::{CommandReply, ControlCore, TickOutcome};
pub use error::{BuildError, CommandError, CoreError, Result};
pub use fanout::{Emission, FanOut, OutboundChannel, Report, ReportKind};
pub use level::{LevelPolicy, WaterLevel, compute_water_level};
pub use outbound::{Backpressure, OutboundHub, OutboundWorker, Sink, WorkerStats};
pub use runner::{Inbound, RunStats, Runner};
pub use sampler::{FoamState, SensorReading, SensorSampler};
pub use snapshot::StatusSnapshot;
