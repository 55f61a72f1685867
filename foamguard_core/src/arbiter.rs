//! Control arbiter: `{Auto, Manual} × {Running, Shutdown}` plus the pump.
//!
//! Every pump write goes through one guard: it is applied only when the
//! requested state differs from the current one and the system is not shut
//! down (the forced stop on shutdown is the single exception).
use foamguard_traits::Pump;
use serde::Serialize;

use crate::command::CommandChannel;
use crate::config::ControlCfg;
use crate::hw_error::{HwSite, map_hw_error};
use crate::sampler::FoamState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Auto,
    Manual,
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ControlMode::Auto => "auto",
            ControlMode::Manual => "manual",
        })
    }
}

/// Why the pump changed state. Observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    FoamHigh,
    FoamCleared,
    Manual(CommandChannel),
    Shutdown,
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionReason::FoamHigh => f.write_str("foam high"),
            TransitionReason::FoamCleared => f.write_str("foam cleared"),
            TransitionReason::Manual(ch) => write!(f, "manual ({ch})"),
            TransitionReason::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// An applied pump transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub on: bool,
    pub reason: TransitionReason,
}

/// Explicit pump request from an operator channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    On,
    Off,
    Toggle,
}

pub struct Arbiter<P> {
    pump: P,
    mode: ControlMode,
    shutdown: bool,
    pump_on: bool,
    control: ControlCfg,
}

impl<P: Pump> Arbiter<P> {
    /// The pump is assumed stopped at construction.
    pub fn new(pump: P, control: ControlCfg) -> Self {
        Self {
            pump,
            mode: ControlMode::Auto,
            shutdown: false,
            pump_on: false,
            control,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn pump_on(&self) -> bool {
        self.pump_on
    }

    pub fn control(&self) -> ControlCfg {
        self.control
    }

    pub fn set_threshold(&mut self, pct: u8) {
        let pct = pct.min(100);
        if pct != self.control.threshold_pct {
            tracing::info!(
                from = self.control.threshold_pct,
                to = pct,
                "foam threshold changed"
            );
        }
        self.control.threshold_pct = pct;
    }

    /// Automatic evaluation for one accepted foam state.
    ///
    /// Does nothing in manual mode or with no usable foam reading. While
    /// shut down it only retries a stop that previously failed.
    pub fn evaluate(&mut self, foam: Option<FoamState>) -> Option<Transition> {
        if self.shutdown {
            if self.pump_on {
                return self.write(false, TransitionReason::Shutdown);
            }
            return None;
        }
        if self.mode != ControlMode::Auto {
            return None;
        }
        let Some(foam) = foam else {
            tracing::debug!("foam unavailable; evaluation skipped");
            return None;
        };
        let target = match foam {
            FoamState::Percent(pct) => {
                let off_below = self
                    .control
                    .threshold_pct
                    .saturating_sub(self.control.hysteresis_pct);
                if pct >= self.control.threshold_pct {
                    true
                } else if pct < off_below {
                    false
                } else {
                    self.pump_on
                }
            }
            FoamState::Present(present) => present,
        };
        let reason = if target {
            TransitionReason::FoamHigh
        } else {
            TransitionReason::FoamCleared
        };
        self.request(target, reason)
    }

    /// Manual pump command: switches to manual mode, then requests the
    /// transition (rejected while shut down).
    pub fn manual(&mut self, action: ManualAction, channel: CommandChannel) -> Option<Transition> {
        if self.mode != ControlMode::Manual {
            tracing::info!(%channel, "mode -> manual");
            self.mode = ControlMode::Manual;
        }
        let target = match action {
            ManualAction::On => true,
            ManualAction::Off => false,
            ManualAction::Toggle => !self.pump_on,
        };
        self.request(target, TransitionReason::Manual(channel))
    }

    /// Back to automatic control. No immediate transition.
    pub fn set_auto(&mut self) {
        if self.mode != ControlMode::Auto {
            tracing::info!("mode -> auto");
            self.mode = ControlMode::Auto;
        }
    }

    /// Latch or release the system shutdown. Latching forces the pump off
    /// first; releasing leaves the pump as it is.
    pub fn set_shutdown(&mut self, on: bool) -> Option<Transition> {
        if on == self.shutdown {
            return None;
        }
        let forced = if on && self.pump_on {
            self.write(false, TransitionReason::Shutdown)
        } else {
            None
        };
        self.shutdown = on;
        tracing::info!(shutdown = on, "system shutdown changed");
        forced
    }

    fn request(&mut self, on: bool, reason: TransitionReason) -> Option<Transition> {
        if self.shutdown {
            tracing::debug!(on, %reason, "ActuatorWriteRejected: system shut down");
            return None;
        }
        if on == self.pump_on {
            tracing::debug!(on, %reason, "ActuatorWriteRejected: already in requested state");
            return None;
        }
        self.write(on, reason)
    }

    fn write(&mut self, on: bool, reason: TransitionReason) -> Option<Transition> {
        let res = if on { self.pump.start() } else { self.pump.stop() };
        match res {
            Ok(()) => {
                self.pump_on = on;
                tracing::info!(pump = on, %reason, "pump transition");
                Some(Transition { on, reason })
            }
            Err(e) => {
                let err = map_hw_error(HwSite::Pump, e.as_ref());
                tracing::error!(error = %err, requested = on, "pump write failed");
                None
            }
        }
    }
}
