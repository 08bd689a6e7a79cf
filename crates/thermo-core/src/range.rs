//! Smoothed display-range estimation from observed frame extrema.

/// Temperature bounds the color scale maps between, °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub min: f32,
    pub max: f32,
}

impl DisplayRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Spread between the bounds.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Exponential smoothing factor per frame; ~20-frame adaptation scale.
pub const SMOOTHING: f32 = 0.05;

/// Minimum allowed spread between the bounds, °C. Keeps near-uniform scenes
/// from collapsing the scale into amplified noise.
pub const MIN_SPREAD: f32 = 10.0;

/// Owns and smooths the display range across frames.
///
/// Only used while auto-ranging is enabled; with a user-controlled range the
/// estimator is bypassed entirely and its state left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRange {
    range: DisplayRange,
}

impl AutoRange {
    pub const fn new(initial: DisplayRange) -> Self {
        Self { range: initial }
    }

    pub fn range(&self) -> DisplayRange {
        self.range
    }

    /// Reset the smoothed state, e.g. when the user re-enables auto-ranging
    /// after editing manual bounds.
    pub fn reset(&mut self, range: DisplayRange) {
        self.range = range;
    }

    /// Fold one frame's observed extrema into the smoothed range.
    ///
    /// Each bound moves by [`SMOOTHING`] toward the observation. If the
    /// smoothed bounds end up closer than [`MIN_SPREAD`], both are
    /// re-centered around the smoothed average, offset by half the floor.
    /// (Centering on the smoothed rather than the observed average is the
    /// shipped behavior; kept as-is.)
    pub fn update(&mut self, observed_min: f32, observed_max: f32) -> DisplayRange {
        let mut min = self.range.min * (1.0 - SMOOTHING) + observed_min * SMOOTHING;
        let mut max = self.range.max * (1.0 - SMOOTHING) + observed_max * SMOOTHING;

        if max - min < MIN_SPREAD {
            let center = (max + min) / 2.0;
            min = center - MIN_SPREAD / 2.0;
            max = center + MIN_SPREAD / 2.0;
        }

        self.range = DisplayRange::new(min, max);
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_toward_constant_observation() {
        let mut auto = AutoRange::new(DisplayRange::new(0.0, 100.0));

        let mut previous = auto.range();
        for _ in 0..400 {
            let range = auto.update(20.0, 30.0);
            // Monotonic approach from the outside.
            assert!(range.min >= previous.min);
            assert!(range.max <= previous.max);
            previous = range;
        }

        // Converged onto the observation, held apart by the spread floor.
        let range = auto.range();
        assert!((range.min - 20.0).abs() < 1.5);
        assert!((range.max - 30.0).abs() < 1.5);
        assert!(range.span() >= MIN_SPREAD - 1e-3);
    }

    #[test]
    fn test_spread_never_collapses_below_floor() {
        let mut auto = AutoRange::new(DisplayRange::new(0.0, 100.0));

        // A near-uniform scene: 2 degrees of real spread.
        for _ in 0..1000 {
            let range = auto.update(24.0, 26.0);
            assert!(range.span() >= MIN_SPREAD - 1e-3);
        }

        // Window settled around the scene average.
        let range = auto.range();
        assert!((range.min - 20.0).abs() < 0.5);
        assert!((range.max - 30.0).abs() < 0.5);
    }

    #[test]
    fn test_single_update_moves_by_smoothing_factor() {
        let mut auto = AutoRange::new(DisplayRange::new(0.0, 100.0));
        let range = auto.update(20.0, 30.0);
        assert!((range.min - 1.0).abs() < 1e-5);
        assert!((range.max - 96.5).abs() < 1e-4);
    }

    #[test]
    fn test_reset_discards_history() {
        let mut auto = AutoRange::new(DisplayRange::new(0.0, 100.0));
        auto.update(20.0, 30.0);
        auto.reset(DisplayRange::new(-10.0, 50.0));
        assert_eq!(auto.range(), DisplayRange::new(-10.0, 50.0));
    }
}
