//! `From` implementations bridging `foamguard_config` types to core types.

use std::time::Duration;

use crate::config::{ControlCfg, FoamKind, OutboundCfg, RunnerCfg, SamplerCfg, ScheduleCfg};
use crate::level::LevelPolicy;
use crate::outbound::Backpressure;

// ── Sampler ──────────────────────────────────────────────────────────────────

impl From<foamguard_config::LevelPolicy> for LevelPolicy {
    fn from(p: foamguard_config::LevelPolicy) -> Self {
        match p {
            foamguard_config::LevelPolicy::Highest => LevelPolicy::Highest,
            foamguard_config::LevelPolicy::Count => LevelPolicy::Count,
            foamguard_config::LevelPolicy::Reject => LevelPolicy::Reject,
        }
    }
}

impl From<&foamguard_config::Sampler> for SamplerCfg {
    fn from(c: &foamguard_config::Sampler) -> Self {
        let foam = match c.foam_mode {
            foamguard_config::FoamMode::Analog => FoamKind::Analog {
                window: c.window.max(1),
                min_delta_pct: c.min_delta_pct,
                adc_max: c.adc_max.max(1),
            },
            foamguard_config::FoamMode::Digital => FoamKind::Digital {
                hold: Duration::from_millis(c.debounce_ms),
            },
        };
        Self {
            interval: Duration::from_millis(c.interval_ms),
            foam,
            level_policy: c.level_policy.into(),
            read_timeout: Duration::from_millis(c.read_timeout_ms),
        }
    }
}

// ── Control ──────────────────────────────────────────────────────────────────

impl From<&foamguard_config::Control> for ControlCfg {
    fn from(c: &foamguard_config::Control) -> Self {
        Self {
            threshold_pct: c.threshold_pct.min(100),
            hysteresis_pct: c.hysteresis_pct.min(100),
        }
    }
}

// ── Channels ─────────────────────────────────────────────────────────────────

impl From<&foamguard_config::Channels> for ScheduleCfg {
    fn from(c: &foamguard_config::Channels) -> Self {
        Self {
            log_interval: Duration::from_secs(c.log_interval_s),
            report_interval_min: c.report_interval_min,
        }
    }
}

impl From<foamguard_config::Backpressure> for Backpressure {
    fn from(b: foamguard_config::Backpressure) -> Self {
        match b {
            foamguard_config::Backpressure::DropOldest => Backpressure::DropOldest,
            foamguard_config::Backpressure::DropNewest => Backpressure::DropNewest,
        }
    }
}

impl From<&foamguard_config::Channels> for OutboundCfg {
    fn from(c: &foamguard_config::Channels) -> Self {
        Self {
            timeout: Duration::from_millis(c.outbound_timeout_ms),
            capacity: c.queue_capacity.max(1),
            backpressure: c.backpressure.into(),
        }
    }
}

// ── Runner ───────────────────────────────────────────────────────────────────

impl From<&foamguard_config::Config> for RunnerCfg {
    fn from(c: &foamguard_config::Config) -> Self {
        Self {
            loop_period: Duration::from_millis(c.runner.loop_ms.max(1)),
            button_debounce: Duration::from_millis(c.button.debounce_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_mode_maps_debounce_to_hold() {
        let cfg = foamguard_config::load_toml(
            "[sampler]\nfoam_mode = \"digital\"\ndebounce_ms = 60\ninterval_ms = 300",
        )
        .expect("parse");
        let s = SamplerCfg::from(&cfg.sampler);
        assert_eq!(s.interval, Duration::from_millis(300));
        assert_eq!(
            s.foam,
            FoamKind::Digital {
                hold: Duration::from_millis(60)
            }
        );
    }

    #[test]
    fn channel_defaults_carry_over() {
        let cfg = foamguard_config::Config::default();
        let sched = ScheduleCfg::from(&cfg.channels);
        assert_eq!(sched, ScheduleCfg::default());
        let out = OutboundCfg::from(&cfg.channels);
        assert_eq!(out, OutboundCfg::default());
        assert_eq!(RunnerCfg::from(&cfg), RunnerCfg::default());
    }
}
