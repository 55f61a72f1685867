//! Maps `Box<dyn Error>` from trait boundaries to typed `CoreError`.
//!
//! The traits in `foamguard_traits` return `Box<dyn Error + Send + Sync>`;
//! this module converts those to our error enum, downcasting
//! `foamguard_hardware::error::HwError` when the feature is enabled.

use crate::error::CoreError;

/// What the failing call was talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwSite {
    LevelSwitches,
    FoamProbe,
    Pump,
}

impl HwSite {
    fn label(self) -> &'static str {
        match self {
            HwSite::LevelSwitches => "level switches",
            HwSite::FoamProbe => "foam probe",
            HwSite::Pump => "pump",
        }
    }
}

/// Map a trait-boundary error to a typed `CoreError`.
pub fn map_hw_error(site: HwSite, e: &(dyn std::error::Error + 'static)) -> CoreError {
    #[cfg(feature = "hardware-errors")]
    {
        use foamguard_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            let detail = match hw {
                HwError::Timeout => format!("{} read timed out", site.label()),
                other => format!("{}: {other}", site.label()),
            };
            return match site {
                HwSite::Pump => CoreError::ActuatorWrite(detail),
                _ => CoreError::SensorUnavailable(detail),
            };
        }
    }

    let detail = format!("{}: {e}", site.label());
    match site {
        HwSite::Pump => CoreError::ActuatorWrite(detail),
        HwSite::LevelSwitches | HwSite::FoamProbe => CoreError::SensorUnavailable(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_errors_become_actuator_errors() {
        let e = std::io::Error::other("relay stuck");
        match map_hw_error(HwSite::Pump, &e) {
            CoreError::ActuatorWrite(msg) => assert!(msg.contains("relay stuck")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sensor_errors_become_unavailable() {
        let e = std::io::Error::other("open circuit");
        let mapped = map_hw_error(HwSite::LevelSwitches, &e);
        assert_eq!(
            mapped,
            CoreError::SensorUnavailable("level switches: open circuit".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_timeout_is_named() {
        let e = foamguard_hardware::error::HwError::Timeout;
        let mapped = map_hw_error(HwSite::FoamProbe, &e);
        assert_eq!(
            mapped,
            CoreError::SensorUnavailable("foam probe read timed out".into())
        );
    }
}
