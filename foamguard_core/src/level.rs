//! Level quantization from the three discrete float switches.
//!
//! Switches are ordered `[low, mid, high]`. The five combinations a rising
//! liquid can produce map onto a fixed ladder; anything else is resolved by
//! the configured `LevelPolicy`.
use serde::Serialize;

/// Quantized water level in percent. Only ever 0, 25, 50, 75 or 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WaterLevel(u8);

impl WaterLevel {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Level for `n` quarters (clamped to 4).
    const fn quarters(n: u8) -> Self {
        let n = if n > 4 { 4 } else { n };
        Self(n * 25)
    }

    pub const fn pct(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for WaterLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Resolution of switch combinations that are not on the ladder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelPolicy {
    /// Level of the highest asserted switch (`low→25`, `mid→50`, `high→75`).
    #[default]
    Highest,
    /// 25 % per asserted switch.
    Count,
    /// Combination is treated as an invalid reading.
    Reject,
}

/// Quantize switch states to a level.
///
/// Returns `None` only for off-ladder combinations under `LevelPolicy::Reject`;
/// callers keep the previously accepted level in that case.
pub fn compute_water_level(switches: [bool; 3], policy: LevelPolicy) -> Option<WaterLevel> {
    match switches {
        [false, false, false] => Some(WaterLevel::EMPTY),
        [true, false, false] => Some(WaterLevel::quarters(1)),
        [true, true, false] => Some(WaterLevel::quarters(2)),
        [false, true, true] => Some(WaterLevel::quarters(3)),
        [true, true, true] => Some(WaterLevel::FULL),
        [low, mid, high] => match policy {
            LevelPolicy::Highest => Some(if high {
                WaterLevel::quarters(3)
            } else if mid {
                WaterLevel::quarters(2)
            } else {
                WaterLevel::quarters(u8::from(low))
            }),
            LevelPolicy::Count => Some(WaterLevel::quarters(
                u8::from(low) + u8::from(mid) + u8::from(high),
            )),
            LevelPolicy::Reject => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_percent_sign() {
        assert_eq!(WaterLevel::FULL.to_string(), "100%");
    }

    #[test]
    fn ladder_ignores_policy() {
        for policy in [LevelPolicy::Highest, LevelPolicy::Count, LevelPolicy::Reject] {
            assert_eq!(
                compute_water_level([true, true, false], policy),
                Some(WaterLevel(50))
            );
        }
    }
}
