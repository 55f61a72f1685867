//! Sensor sampler: reads the level switches and the foam probe, filters and
//! quantizes them, and keeps the last accepted derived values.
//!
//! Read failures are surfaced as `None` in the returned reading and logged;
//! they never overwrite an accepted value.
use std::time::Instant;

use foamguard_traits::{FoamProbe, FoamRaw, LevelSwitches};
use serde::Serialize;

use crate::config::{FoamKind, SamplerCfg};
use crate::filter::{AnalogFoamFilter, Debouncer};
use crate::hw_error::{HwSite, map_hw_error};
use crate::level::{WaterLevel, compute_water_level};

/// Accepted foam condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FoamState {
    /// Analog probe, 0..=100 %.
    Percent(u8),
    /// Digital presence switch.
    Present(bool),
}

impl std::fmt::Display for FoamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FoamState::Percent(p) => write!(f, "{p}%"),
            FoamState::Present(true) => f.write_str("present"),
            FoamState::Present(false) => f.write_str("absent"),
        }
    }
}

/// One sampling pass. Raw inputs are `None` when the read failed; derived
/// values are the latest accepted ones (possibly from an earlier pass).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    pub at: Instant,
    pub switches: Option<[bool; 3]>,
    pub foam_raw: Option<FoamRaw>,
    pub level: Option<WaterLevel>,
    pub foam: Option<FoamState>,
    pub level_changed: bool,
    pub foam_changed: bool,
    /// Switches failed or produced a rejected combination on this pass.
    pub level_fault: bool,
}

impl SensorReading {
    /// Foam state usable for control on this pass: `None` if the probe read
    /// failed, even when an older value is still held.
    pub fn foam_for_control(&self) -> Option<FoamState> {
        self.foam_raw.and(self.foam)
    }

    pub fn sensor_fault(&self) -> bool {
        self.level_fault || self.foam_raw.is_none()
    }
}

#[derive(Debug, Clone)]
enum FoamFilter {
    Analog(AnalogFoamFilter),
    Digital(Debouncer),
}

pub struct SensorSampler<L, F> {
    switches: L,
    probe: F,
    cfg: SamplerCfg,
    filter: FoamFilter,
    level: Option<WaterLevel>,
    foam: Option<FoamState>,
    last_sample: Option<Instant>,
}

impl<L: LevelSwitches, F: FoamProbe> SensorSampler<L, F> {
    pub fn new(switches: L, probe: F, cfg: SamplerCfg) -> Self {
        let filter = match cfg.foam {
            FoamKind::Analog {
                window,
                min_delta_pct,
                adc_max,
            } => FoamFilter::Analog(AnalogFoamFilter::new(window, adc_max, min_delta_pct)),
            FoamKind::Digital { hold } => FoamFilter::Digital(Debouncer::new(hold)),
        };
        Self {
            switches,
            probe,
            cfg,
            filter,
            level: None,
            foam: None,
            last_sample: None,
        }
    }

    /// True when the sampling interval has elapsed (or nothing was sampled yet).
    pub fn is_due(&self, now: Instant) -> bool {
        crate::util::is_due(self.last_sample, now, self.cfg.interval)
    }

    pub fn level(&self) -> Option<WaterLevel> {
        self.level
    }

    pub fn foam(&self) -> Option<FoamState> {
        self.foam
    }

    pub fn cfg(&self) -> &SamplerCfg {
        &self.cfg
    }

    /// Take one reading of every input.
    pub fn sample(&mut self, now: Instant) -> SensorReading {
        self.last_sample = Some(now);

        let switches = match self.switches.read() {
            Ok(s) => Some(s),
            Err(e) => {
                let err = map_hw_error(HwSite::LevelSwitches, e.as_ref());
                tracing::warn!(error = %err, "level read failed");
                None
            }
        };
        let (level_changed, level_fault) = match switches {
            None => (false, true),
            Some(bits) => match compute_water_level(bits, self.cfg.level_policy) {
                Some(level) => {
                    let changed = self.level != Some(level);
                    if changed {
                        tracing::debug!(%level, ?bits, "level accepted");
                    }
                    self.level = Some(level);
                    (changed, false)
                }
                None => {
                    tracing::warn!(?bits, "inconsistent level switch combination rejected");
                    (false, true)
                }
            },
        };

        let foam_raw = match self.probe.read(self.cfg.read_timeout) {
            Ok(raw) => Some(raw),
            Err(e) => {
                let err = map_hw_error(HwSite::FoamProbe, e.as_ref());
                tracing::warn!(error = %err, "foam read failed");
                None
            }
        };
        let foam_changed = foam_raw.is_some_and(|raw| self.accept_foam(raw, now));

        SensorReading {
            at: now,
            switches,
            foam_raw,
            level: self.level,
            foam: self.foam,
            level_changed,
            foam_changed,
            level_fault,
        }
    }

    fn accept_foam(&mut self, raw: FoamRaw, now: Instant) -> bool {
        let next = match (&mut self.filter, raw) {
            (FoamFilter::Analog(f), FoamRaw::Analog(counts)) => {
                let (pct, changed) = f.update(counts);
                changed.then_some(FoamState::Percent(pct))
            }
            (FoamFilter::Digital(d), FoamRaw::Digital(present)) => {
                d.update(present, now).map(FoamState::Present)
            }
            (_, other) => {
                tracing::warn!(?other, "foam probe kind does not match configuration");
                None
            }
        };
        match next {
            Some(state) if self.foam != Some(state) => {
                tracing::debug!(foam = %state, "foam accepted");
                self.foam = Some(state);
                true
            }
            _ => false,
        }
    }
}
