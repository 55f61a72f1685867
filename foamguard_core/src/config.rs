//! Runtime configuration types used by `ControlCore` and the runner.
//!
//! These are separate from the TOML-deserialized config in `foamguard_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

use crate::level::LevelPolicy;
use crate::outbound::Backpressure;

/// How the foam probe is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoamKind {
    /// Running average of ADC counts, mapped to percent, with a noise floor.
    Analog {
        window: usize,
        min_delta_pct: u8,
        adc_max: u16,
    },
    /// Presence switch, accepted after a stable hold time.
    Digital { hold: Duration },
}

#[derive(Debug, Clone)]
pub struct SamplerCfg {
    /// Sampling cadence.
    pub interval: Duration,
    pub foam: FoamKind,
    pub level_policy: LevelPolicy,
    /// Timeout handed to each foam probe read.
    pub read_timeout: Duration,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            foam: FoamKind::Analog {
                window: 10,
                min_delta_pct: 3,
                adc_max: 4095,
            },
            level_policy: LevelPolicy::Highest,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Automatic foam control parameters. Both are mutable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCfg {
    /// Pump starts when foam reaches this percentage.
    pub threshold_pct: u8,
    /// Pump stops only once foam drops below `threshold_pct - hysteresis_pct`.
    pub hysteresis_pct: u8,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            threshold_pct: 50,
            hysteresis_pct: 15,
        }
    }
}

/// Cadences of the periodic outbound channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleCfg {
    pub log_interval: Duration,
    /// Messaging report period in minutes; 0 disables periodic reports.
    pub report_interval_min: u16,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            log_interval: Duration::from_secs(300),
            report_interval_min: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundCfg {
    /// Budget handed to each delivery attempt.
    pub timeout: Duration,
    /// Queue depth per channel.
    pub capacity: usize,
    pub backpressure: Backpressure,
}

impl Default for OutboundCfg {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            capacity: 16,
            backpressure: Backpressure::DropOldest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerCfg {
    /// Period of one cooperative loop iteration.
    pub loop_period: Duration,
    /// Hold time for the physical shutdown button.
    pub button_debounce: Duration,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            loop_period: Duration::from_millis(10),
            button_debounce: Duration::from_millis(50),
        }
    }
}
