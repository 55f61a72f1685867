//! Type-state builder for `ControlCore` and the generic `build_core` constructor.
//!
//! The builder enforces at compile time that switches, foam probe and pump are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;

use foamguard_traits::{FoamProbe, LevelSwitches, Pump};

use crate::arbiter::Arbiter;
use crate::config::{ControlCfg, FoamKind, SamplerCfg, ScheduleCfg};
use crate::core::ControlCore;
use crate::error::{BuildError, CoreError, Result};
use crate::fanout::FanOut;
use crate::sampler::SensorSampler;

/// Boxed core used by the CLI, where the backend is chosen at runtime.
pub type DynCore = ControlCore<Box<dyn LevelSwitches>, Box<dyn FoamProbe>, Box<dyn Pump>>;

impl DynCore {
    /// Start building a boxed core.
    pub fn builder() -> CoreBuilder<Missing, Missing, Missing> {
        CoreBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct CoreBuilder<S, F, P> {
    switches: Option<Box<dyn LevelSwitches>>,
    probe: Option<Box<dyn FoamProbe>>,
    pump: Option<Box<dyn Pump>>,
    sampler: Option<SamplerCfg>,
    control: Option<ControlCfg>,
    schedule: Option<ScheduleCfg>,
    _s: PhantomData<S>,
    _f: PhantomData<F>,
    _p: PhantomData<P>,
}

impl Default for CoreBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            switches: None,
            probe: None,
            pump: None,
            sampler: None,
            control: None,
            schedule: None,
            _s: PhantomData,
            _f: PhantomData,
            _p: PhantomData,
        }
    }
}

/// Validate configuration and construct a `ControlCore`.
///
/// Single source of truth for validation, used by both
/// `CoreBuilder::try_build()` and `build_core()`.
fn validate_and_build<L: LevelSwitches, F: FoamProbe, P: Pump>(
    switches: L,
    probe: F,
    pump: P,
    sampler: SamplerCfg,
    control: ControlCfg,
    schedule: ScheduleCfg,
) -> Result<ControlCore<L, F, P>> {
    let invalid = |msg: &str| eyre::Report::new(CoreError::Config(msg.to_string()));
    if sampler.interval.is_zero() {
        return Err(invalid("sampling interval must be > 0"));
    }
    if control.threshold_pct > 100 {
        return Err(invalid("threshold must be in [0, 100]"));
    }
    if control.hysteresis_pct > 100 {
        return Err(invalid("hysteresis must be in [0, 100]"));
    }
    if let FoamKind::Analog {
        window, adc_max, ..
    } = sampler.foam
    {
        if window == 0 {
            return Err(invalid("foam window must be >= 1"));
        }
        if adc_max == 0 {
            return Err(invalid("adc_max must be > 0"));
        }
    }
    if schedule.log_interval.is_zero() {
        return Err(invalid("log interval must be > 0"));
    }

    tracing::debug!(
        threshold = control.threshold_pct,
        hysteresis = control.hysteresis_pct,
        interval_ms = sampler.interval.as_millis() as u64,
        "control core configured"
    );
    Ok(ControlCore::from_parts(
        SensorSampler::new(switches, probe, sampler),
        Arbiter::new(pump, control),
        FanOut::new(schedule),
    ))
}

/// Statically dispatched constructor for callers that know their backends.
pub fn build_core<L: LevelSwitches, F: FoamProbe, P: Pump>(
    switches: L,
    probe: F,
    pump: P,
    sampler: SamplerCfg,
    control: ControlCfg,
    schedule: ScheduleCfg,
) -> Result<ControlCore<L, F, P>> {
    validate_and_build(switches, probe, pump, sampler, control, schedule)
}

impl<S, F, P> CoreBuilder<S, F, P> {
    /// Fallible build available in any type-state; returns a detailed error
    /// for missing pieces.
    pub fn try_build(self) -> Result<DynCore> {
        let switches = self
            .switches
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSwitches))?;
        let probe = self
            .probe
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFoamProbe))?;
        let pump = self
            .pump
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPump))?;
        validate_and_build(
            switches,
            probe,
            pump,
            self.sampler.unwrap_or_default(),
            self.control.unwrap_or_default(),
            self.schedule.unwrap_or_default(),
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<S, F, P> CoreBuilder<S, F, P> {
    pub fn with_sampler(mut self, sampler: SamplerCfg) -> Self {
        self.sampler = Some(sampler);
        self
    }
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }
    pub fn with_schedule(mut self, schedule: ScheduleCfg) -> Self {
        self.schedule = Some(schedule);
        self
    }
    /// Take sampler, control and schedule settings from a loaded config.
    pub fn apply_config(self, cfg: &foamguard_config::Config) -> Self {
        self.with_sampler((&cfg.sampler).into())
            .with_control((&cfg.control).into())
            .with_schedule((&cfg.channels).into())
    }
}

// Setters that advance type-state
impl<F, P> CoreBuilder<Missing, F, P> {
    pub fn with_switches(self, switches: impl LevelSwitches + 'static) -> CoreBuilder<Set, F, P> {
        CoreBuilder {
            switches: Some(Box::new(switches)),
            probe: self.probe,
            pump: self.pump,
            sampler: self.sampler,
            control: self.control,
            schedule: self.schedule,
            _s: PhantomData,
            _f: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S, P> CoreBuilder<S, Missing, P> {
    pub fn with_foam_probe(self, probe: impl FoamProbe + 'static) -> CoreBuilder<S, Set, P> {
        CoreBuilder {
            switches: self.switches,
            probe: Some(Box::new(probe)),
            pump: self.pump,
            sampler: self.sampler,
            control: self.control,
            schedule: self.schedule,
            _s: PhantomData,
            _f: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S, F> CoreBuilder<S, F, Missing> {
    pub fn with_pump(self, pump: impl Pump + 'static) -> CoreBuilder<S, F, Set> {
        CoreBuilder {
            switches: self.switches,
            probe: self.probe,
            pump: Some(Box::new(pump)),
            sampler: self.sampler,
            control: self.control,
            schedule: self.schedule,
            _s: PhantomData,
            _f: PhantomData,
            _p: PhantomData,
        }
    }
}

impl CoreBuilder<Set, Set, Set> {
    /// Infallible in type-state terms; still validates configuration.
    pub fn build(self) -> Result<DynCore> {
        self.try_build()
    }
}
