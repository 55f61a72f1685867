//! Simulated reservoir: level switches, foam probe and pump share one model.
//!
//! Foam rises on every probe read while the pump is stopped and falls while
//! it runs, so the automatic control loop can be exercised end to end
//! without hardware.
use std::sync::{Arc, Mutex, MutexGuard};

use foamguard_traits::{FoamProbe, FoamRaw, HwResult, LevelSwitches, Pump};

use crate::error::HwError;

/// How the simulated foam probe reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFoamKind {
    /// ADC counts in `0..=adc_max`.
    Analog { adc_max: u16 },
    /// Presence once foam reaches `present_at_pct`.
    Digital { present_at_pct: u8 },
}

#[derive(Debug, Clone)]
struct Model {
    level_pct: u8,
    foam_pct: f32,
    pump_on: bool,
    rise_per_read: f32,
    fall_per_read: f32,
    switches_fault: bool,
    foam_fault: bool,
    pump_writes: u32,
}

/// Handle on the shared model. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SimReservoir {
    model: Arc<Mutex<Model>>,
}

impl Default for SimReservoir {
    fn default() -> Self {
        Self::new()
    }
}

impl SimReservoir {
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(Model {
                level_pct: 50,
                foam_pct: 0.0,
                pump_on: false,
                rise_per_read: 4.0,
                fall_per_read: 6.0,
                switches_fault: false,
                foam_fault: false,
                pump_writes: 0,
            })),
        }
    }

    /// Foam change per probe read: `rise` while the pump is off, `fall` while on.
    pub fn with_rates(self, rise: f32, fall: f32) -> Self {
        if let Ok(mut m) = self.model.lock() {
            m.rise_per_read = rise.max(0.0);
            m.fall_per_read = fall.max(0.0);
        }
        self
    }

    pub fn set_level_pct(&self, pct: u8) {
        if let Ok(mut m) = self.model.lock() {
            m.level_pct = pct.min(100);
        }
    }

    pub fn set_foam_pct(&self, pct: f32) {
        if let Ok(mut m) = self.model.lock() {
            m.foam_pct = pct.clamp(0.0, 100.0);
        }
    }

    /// Make the next switch reads fail.
    pub fn set_switches_fault(&self, fault: bool) {
        if let Ok(mut m) = self.model.lock() {
            m.switches_fault = fault;
        }
    }

    /// Make the next foam reads fail.
    pub fn set_foam_fault(&self, fault: bool) {
        if let Ok(mut m) = self.model.lock() {
            m.foam_fault = fault;
        }
    }

    pub fn pump_on(&self) -> bool {
        self.model.lock().map(|m| m.pump_on).unwrap_or(false)
    }

    /// Number of start/stop calls the pump received.
    pub fn pump_writes(&self) -> u32 {
        self.model.lock().map(|m| m.pump_writes).unwrap_or(0)
    }

    pub fn switches(&self) -> SimSwitches {
        SimSwitches {
            reservoir: self.clone(),
        }
    }

    pub fn foam_probe(&self, kind: SimFoamKind) -> SimFoamProbe {
        SimFoamProbe {
            reservoir: self.clone(),
            kind,
        }
    }

    pub fn pump(&self) -> SimPump {
        SimPump {
            reservoir: self.clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Model>, HwError> {
        self.model
            .lock()
            .map_err(|_| HwError::Fault("simulation model poisoned"))
    }
}

/// Switch `i` (0 = low) closes once the level reaches `25 * (i + 1)` percent.
pub struct SimSwitches {
    reservoir: SimReservoir,
}

impl LevelSwitches for SimSwitches {
    fn read(&mut self) -> HwResult<[bool; 3]> {
        let m = self.reservoir.lock()?;
        if m.switches_fault {
            return Err(Box::new(HwError::Fault("level switch harness open")));
        }
        let lvl = m.level_pct;
        Ok([lvl >= 25, lvl >= 50, lvl >= 75])
    }
}

pub struct SimFoamProbe {
    reservoir: SimReservoir,
    kind: SimFoamKind,
}

impl FoamProbe for SimFoamProbe {
    fn read(&mut self, _timeout: std::time::Duration) -> HwResult<FoamRaw> {
        let mut m = self.reservoir.lock()?;
        if m.foam_fault {
            return Err(Box::new(HwError::Timeout));
        }
        let delta = if m.pump_on {
            -m.fall_per_read
        } else {
            m.rise_per_read
        };
        m.foam_pct = (m.foam_pct + delta).clamp(0.0, 100.0);
        let pct = m.foam_pct;
        tracing::trace!(foam_pct = pct, pump_on = m.pump_on, "simulated foam read");
        Ok(match self.kind {
            SimFoamKind::Analog { adc_max } => {
                FoamRaw::Analog(((pct / 100.0) * f32::from(adc_max)).round() as u16)
            }
            SimFoamKind::Digital { present_at_pct } => {
                FoamRaw::Digital(pct >= f32::from(present_at_pct))
            }
        })
    }
}

pub struct SimPump {
    reservoir: SimReservoir,
}

impl Pump for SimPump {
    fn start(&mut self) -> HwResult<()> {
        let mut m = self.reservoir.lock()?;
        m.pump_on = true;
        m.pump_writes = m.pump_writes.saturating_add(1);
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        let mut m = self.reservoir.lock()?;
        m.pump_on = false;
        m.pump_writes = m.pump_writes.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn switches_follow_level() {
        let res = SimReservoir::new();
        let mut sw = res.switches();
        res.set_level_pct(0);
        assert_eq!(sw.read().unwrap(), [false, false, false]);
        res.set_level_pct(60);
        assert_eq!(sw.read().unwrap(), [true, true, false]);
        res.set_level_pct(100);
        assert_eq!(sw.read().unwrap(), [true, true, true]);
    }

    #[test]
    fn foam_rises_until_pump_runs() {
        let res = SimReservoir::new().with_rates(10.0, 20.0);
        let mut probe = res.foam_probe(SimFoamKind::Analog { adc_max: 1000 });
        let mut pump = res.pump();
        assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Analog(100));
        assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Analog(200));
        pump.start().unwrap();
        assert_eq!(probe.read(Duration::ZERO).unwrap(), FoamRaw::Analog(0));
        assert!(res.pump_on());
        assert_eq!(res.pump_writes(), 1);
    }

    #[test]
    fn injected_faults_surface_as_errors() {
        let res = SimReservoir::new();
        res.set_switches_fault(true);
        res.set_foam_fault(true);
        assert!(res.switches().read().is_err());
        let err = res
            .foam_probe(SimFoamKind::Digital { present_at_pct: 50 })
            .read(Duration::ZERO)
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
