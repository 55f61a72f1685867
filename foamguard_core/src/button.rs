//! Debounced shutdown push-button.
use std::time::{Duration, Instant};

use crate::filter::Debouncer;

/// Turns a raw "pressed" signal into one toggle per accepted press.
///
/// The signal must be stable for the hold time before a press or release is
/// accepted; holding the button down does not repeat the toggle.
#[derive(Debug, Clone)]
pub struct ShutdownButton {
    debouncer: Debouncer,
}

impl ShutdownButton {
    pub fn new(hold: Duration) -> Self {
        Self {
            debouncer: Debouncer::with_initial(hold, false),
        }
    }

    /// Feed one raw sample; true when a press edge was accepted.
    pub fn poll(&mut self, pressed: bool, now: Instant) -> bool {
        self.debouncer.update(pressed, now) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::short_blip(&[(0, true), (20, false), (40, false)], 0)]
    #[case::held_press(&[(0, true), (50, true), (500, true), (900, true)], 1)]
    #[case::press_release_press(
        &[(0, true), (60, true), (100, false), (160, false), (200, true), (260, true)],
        2
    )]
    #[case::bounce_then_hold(&[(0, true), (10, false), (20, true), (60, true), (70, true)], 1)]
    fn toggles_once_per_accepted_press(#[case] samples: &[(u64, bool)], #[case] toggles: usize) {
        let t0 = Instant::now();
        let mut b = ShutdownButton::new(Duration::from_millis(50));
        let n = samples
            .iter()
            .filter(|(ms, p)| b.poll(*p, t0 + Duration::from_millis(*ms)))
            .count();
        assert_eq!(n, toggles);
    }
}
