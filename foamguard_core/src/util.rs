//! Common time/period helpers for foamguard_core.
use std::time::{Duration, Instant};

/// Number of seconds in one minute.
pub const SECS_PER_MIN: u64 = 60;

/// True when `period` has elapsed since `since`, or when nothing ran yet.
#[inline]
pub fn is_due(since: Option<Instant>, now: Instant, period: Duration) -> bool {
    match since {
        None => true,
        Some(t) => now.saturating_duration_since(t) >= period,
    }
}

/// Report cadence in minutes as a `Duration`; `None` when disabled (0).
#[inline]
pub fn report_period(minutes: u16) -> Option<Duration> {
    (minutes > 0).then(|| Duration::from_secs(u64::from(minutes) * SECS_PER_MIN))
}

/// Map a mean ADC reading onto 0..=100 %, rounding to nearest.
/// - Clamps `adc_max` to at least 1 to avoid division by zero.
/// - Readings above full scale saturate at 100.
#[inline]
pub fn counts_to_pct(mean_counts: f32, adc_max: u16) -> u8 {
    if !mean_counts.is_finite() || mean_counts <= 0.0 {
        return 0;
    }
    let pct = (mean_counts * 100.0 / f32::from(adc_max.max(1))).round();
    if pct >= 100.0 { 100 } else { pct as u8 }
}
