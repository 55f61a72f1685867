//! Status snapshot broadcast to outbound channels and returned to callers.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::arbiter::ControlMode;
use crate::level::WaterLevel;
use crate::sampler::FoamState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Last accepted level; `None` until the switches were read once.
    pub level: Option<WaterLevel>,
    pub foam: Option<FoamState>,
    pub pump: bool,
    pub shutdown: bool,
    pub mode: ControlMode,
    /// Raw `[low, mid, high]` switch states from the last successful read.
    pub sensors: Option<[bool; 3]>,
    pub threshold: u8,
    pub hysteresis: u8,
    pub report_interval_min: u16,
    pub sensor_fault: bool,
}

/// The fields whose change triggers a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeKey {
    pub level: Option<WaterLevel>,
    pub foam: Option<FoamState>,
    pub pump: bool,
    pub shutdown: bool,
}

impl StatusSnapshot {
    pub fn change_key(&self) -> ChangeKey {
        ChangeKey {
            level: self.level,
            foam: self.foam,
            pump: self.pump,
            shutdown: self.shutdown,
        }
    }

    /// Multi-line human summary for the messaging channel.
    pub fn summary(&self) -> String {
        let level = self
            .level
            .map_or_else(|| "unknown".to_string(), |l| l.to_string());
        let foam = self
            .foam
            .map_or_else(|| "unknown".to_string(), |f| f.to_string());
        let mut out = format!(
            "level: {level}\nfoam: {foam} (threshold {}%, margin {}%)\npump: {}\nmode: {}\nsystem: {}",
            self.threshold,
            self.hysteresis,
            if self.pump { "on" } else { "off" },
            self.mode,
            if self.shutdown { "shut down" } else { "running" },
        );
        if self.sensor_fault {
            out.push_str("\nsensor fault on last sample");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap() -> StatusSnapshot {
        StatusSnapshot {
            timestamp: Utc::now(),
            level: crate::level::compute_water_level(
                [true, true, false],
                crate::level::LevelPolicy::Highest,
            ),
            foam: Some(FoamState::Percent(42)),
            pump: true,
            shutdown: false,
            mode: ControlMode::Auto,
            sensors: Some([true, true, false]),
            threshold: 50,
            hysteresis: 15,
            report_interval_min: 30,
            sensor_fault: false,
        }
    }

    #[test]
    fn serializes_flat_values() {
        let v = serde_json::to_value(snap()).expect("serialize");
        assert_eq!(v["level"], 50);
        assert_eq!(v["foam"], 42);
        assert_eq!(v["pump"], true);
        assert_eq!(v["mode"], "auto");
        assert_eq!(v["sensors"], serde_json::json!([true, true, false]));
    }

    #[test]
    fn timestamp_is_not_part_of_change_key() {
        let a = snap();
        let mut b = a.clone();
        b.timestamp = b.timestamp + chrono::Duration::seconds(5);
        b.threshold = 70;
        assert_eq!(a.change_key(), b.change_key());
    }

    #[test]
    fn summary_mentions_pump_and_mode() {
        let s = snap().summary();
        assert!(s.contains("pump: on"));
        assert!(s.contains("mode: auto"));
    }
}
