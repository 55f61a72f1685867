#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the reservoir controller.
//!
//! - `Config` and its sections are deserialized from TOML; every section has
//!   defaults so a minimal file only names what differs.
//! - `Config::validate` enforces ranges before the core is built.
use serde::Deserialize;

/// BCM pin numbers. Pins are only used by the `hardware` backend but are
/// always parsed so a config can move between rigs unchanged.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub level_low: u8,
    pub level_mid: u8,
    pub level_high: u8,
    /// Digital foam switch input (used when `sampler.foam_mode = "digital"`).
    pub foam: u8,
    /// MCP3008 channel for the analog foam probe.
    pub foam_adc_channel: u8,
    pub pump: u8,
    pub shutdown_button: Option<u8>,
    /// Inputs read low when asserted (pull-up wiring).
    pub active_low: bool,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            level_low: 13,
            level_mid: 12,
            level_high: 14,
            foam: 27,
            foam_adc_channel: 0,
            pump: 26,
            shutdown_button: Some(4),
            active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FoamMode {
    #[default]
    Analog,
    Digital,
}

/// What to do with switch combinations that are not on the level ladder.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LevelPolicy {
    /// Level of the highest asserted switch.
    #[default]
    Highest,
    /// 25 % per asserted switch.
    Count,
    /// Treat the combination as an invalid reading.
    Reject,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampler {
    pub interval_ms: u64,
    pub foam_mode: FoamMode,
    /// Running-average taps for the analog foam probe.
    pub window: usize,
    /// Minimum change (percentage points) before a new analog value is accepted.
    pub min_delta_pct: u8,
    /// Hold time for the digital foam probe.
    pub debounce_ms: u64,
    /// ADC full scale for the analog foam probe.
    pub adc_max: u16,
    pub level_policy: LevelPolicy,
    /// Per-read timeout handed to the foam probe.
    pub read_timeout_ms: u64,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            foam_mode: FoamMode::Analog,
            window: 10,
            min_delta_pct: 3,
            debounce_ms: 50,
            adc_max: 4095,
            level_policy: LevelPolicy::Highest,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Foam percentage at which the pump starts.
    pub threshold_pct: u8,
    /// The pump stops below `threshold_pct - hysteresis_pct`.
    pub hysteresis_pct: u8,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            threshold_pct: 50,
            hysteresis_pct: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    #[default]
    DropOldest,
    DropNewest,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Channels {
    /// Period of the external log emission (seconds).
    pub log_interval_s: u64,
    /// Period of the messaging report (minutes, 0 disables).
    pub report_interval_min: u16,
    pub outbound_timeout_ms: u64,
    pub queue_capacity: usize,
    pub backpressure: Backpressure,
    /// CSV file for external log rows; unset drops them.
    pub log_csv: Option<String>,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            log_interval_s: 300,
            report_interval_min: 30,
            outbound_timeout_ms: 3000,
            queue_capacity: 16,
            backpressure: Backpressure::DropOldest,
            log_csv: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Button {
    pub debounce_ms: u64,
}

impl Default for Button {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Runner {
    /// Period of one cooperative loop iteration.
    pub loop_ms: u64,
}

impl Default for Runner {
    fn default() -> Self {
        Self { loop_ms: 10 }
    }
}

/// Local HTTP API (`GET /status`, `POST /control`).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Web {
    /// Socket address to listen on, e.g. "127.0.0.1:8080"; unset disables it.
    pub listen: Option<String>,
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
    pub pins: Pins,
    pub sampler: Sampler,
    pub control: Control,
    pub channels: Channels,
    pub button: Button,
    pub runner: Runner,
    pub web: Web,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampler
        if !(100..=10_000).contains(&self.sampler.interval_ms) {
            eyre::bail!("sampler.interval_ms must be in [100, 10000]");
        }
        if self.sampler.window == 0 || self.sampler.window > 64 {
            eyre::bail!("sampler.window must be in [1, 64]");
        }
        if self.sampler.min_delta_pct > 50 {
            eyre::bail!("sampler.min_delta_pct must be <= 50");
        }
        if self.sampler.debounce_ms >= self.sampler.interval_ms.saturating_mul(10) {
            eyre::bail!("sampler.debounce_ms must be shorter than ten sample intervals");
        }
        if self.sampler.adc_max == 0 {
            eyre::bail!("sampler.adc_max must be > 0");
        }
        if self.sampler.read_timeout_ms == 0 {
            eyre::bail!("sampler.read_timeout_ms must be >= 1");
        }

        // Control
        if self.control.threshold_pct > 100 {
            eyre::bail!("control.threshold_pct must be in [0, 100]");
        }
        if self.sampler.foam_mode == FoamMode::Analog && self.control.hysteresis_pct == 0 {
            eyre::bail!("control.hysteresis_pct must be > 0 for an analog foam probe");
        }
        if self.control.hysteresis_pct > 100 {
            eyre::bail!("control.hysteresis_pct must be in [0, 100]");
        }

        // Channels
        if !(10..=86_400).contains(&self.channels.log_interval_s) {
            eyre::bail!("channels.log_interval_s must be in [10, 86400]");
        }
        if self.channels.report_interval_min > 1440 {
            eyre::bail!("channels.report_interval_min must be in [0, 1440]");
        }
        if self.channels.outbound_timeout_ms == 0 || self.channels.outbound_timeout_ms > 60_000 {
            eyre::bail!("channels.outbound_timeout_ms must be in [1, 60000]");
        }
        if self.channels.queue_capacity == 0 {
            eyre::bail!("channels.queue_capacity must be >= 1");
        }

        // Button
        if self.button.debounce_ms == 0 || self.button.debounce_ms > 5_000 {
            eyre::bail!("button.debounce_ms must be in [1, 5000]");
        }

        // Runner
        if self.runner.loop_ms == 0 || self.runner.loop_ms > self.sampler.interval_ms {
            eyre::bail!("runner.loop_ms must be in [1, sampler.interval_ms]");
        }

        // Web
        if let Some(addr) = self.web.listen.as_deref()
            && addr.parse::<std::net::SocketAddr>().is_err()
        {
            eyre::bail!("web.listen must be a socket address like 127.0.0.1:8080");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
