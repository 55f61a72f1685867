//! Hardware seams shared by the core and the adapters.
//!
//! Every trait returns `Box<dyn Error + Send + Sync>` at the boundary; the
//! core maps those into its own typed errors.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Raw foam signal as delivered by the probe, before any filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoamRaw {
    /// ADC counts from an analog probe.
    Analog(u16),
    /// Surface presence from a digital probe (already polarity-corrected).
    Digital(bool),
}

/// The three discrete level switches, bottom to top.
pub trait LevelSwitches {
    /// Returns `[low, mid, high]`, `true` meaning liquid detected.
    fn read(&mut self) -> HwResult<[bool; 3]>;
}

pub trait FoamProbe {
    fn read(&mut self, timeout: std::time::Duration) -> HwResult<FoamRaw>;
}

/// The single pump actuator.
pub trait Pump {
    fn start(&mut self) -> HwResult<()>;
    fn stop(&mut self) -> HwResult<()>;
}

impl<T: LevelSwitches + ?Sized> LevelSwitches for Box<T> {
    fn read(&mut self) -> HwResult<[bool; 3]> {
        (**self).read()
    }
}

impl<T: FoamProbe + ?Sized> FoamProbe for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> HwResult<FoamRaw> {
        (**self).read(timeout)
    }
}

impl<T: Pump + ?Sized> Pump for Box<T> {
    fn start(&mut self) -> HwResult<()> {
        (**self).start()
    }

    fn stop(&mut self) -> HwResult<()> {
        (**self).stop()
    }
}
