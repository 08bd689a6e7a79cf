//! Temperature-to-color mapping.
//!
//! A 256-entry `Rgb565` gradient table is built once from a small ordered
//! list of control points and is immutable afterwards. Mapping a temperature
//! is then a clamp, a linear scale into the index range, and a table lookup;
//! pure and stateless once the table and range are fixed.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::range::DisplayRange;

/// Number of gradient entries.
pub const SCALE_ENTRIES: usize = 256;

/// One gradient control point.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    /// Index in `0..=255`. Stops must be sorted, starting at 0 and ending
    /// at 255.
    pub position: u8,
    pub color: Rgb565,
}

/// The ironbow-style default palette: cold blue through hot magenta.
pub const DEFAULT_STOPS: &[ColorStop] = &[
    ColorStop { position: 0, color: Rgb565::BLUE },
    ColorStop { position: 51, color: Rgb565::CYAN },
    ColorStop { position: 76, color: Rgb565::GREEN },
    ColorStop { position: 127, color: Rgb565::YELLOW },
    ColorStop { position: 204, color: Rgb565::RED },
    ColorStop { position: 255, color: Rgb565::MAGENTA },
];

/// Mix two colors per channel; `mix` = 255 selects `second` entirely.
fn mix_color(second: Rgb565, first: Rgb565, mix: u16) -> Rgb565 {
    let channel = |s: u8, f: u8| -> u8 {
        ((u16::from(s) * mix + u16::from(f) * (255 - mix)) / 255) as u8
    };
    Rgb565::new(
        channel(second.r(), first.r()),
        channel(second.g(), first.g()),
        channel(second.b(), first.b()),
    )
}

/// Fixed 256-entry gradient lookup table.
pub struct ColorScale {
    table: [Rgb565; SCALE_ENTRIES],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::build(DEFAULT_STOPS)
    }
}

impl ColorScale {
    /// Populate the table from sorted control points.
    ///
    /// Requires at least two stops with the first at position 0 and the
    /// last at 255; each index interpolates linearly between its bracketing
    /// pair, located by advancing a cursor monotonically.
    pub fn build(stops: &[ColorStop]) -> Self {
        debug_assert!(stops.len() >= 2);
        debug_assert_eq!(stops[0].position, 0);
        debug_assert_eq!(stops[stops.len() - 1].position, 255);

        let mut table = [Rgb565::BLACK; SCALE_ENTRIES];

        let mut first_index = 0;
        let mut second_index = 1;
        for (i, entry) in table.iter_mut().enumerate() {
            let i = i as u16;
            if i > u16::from(stops[second_index].position) {
                first_index += 1;
                second_index += 1;
            }

            let first = stops[first_index];
            let second = stops[second_index];
            let mix = 255 * (i - u16::from(first.position))
                / u16::from(second.position - first.position);
            *entry = mix_color(second.color, first.color, mix);
        }

        Self { table }
    }

    /// Table entry at `index`.
    pub fn entry(&self, index: u8) -> Rgb565 {
        self.table[usize::from(index)]
    }

    /// Map a temperature into the gradient for the given display range.
    ///
    /// Values at or below `range.min` take entry 0, at or above `range.max`
    /// entry 255; clamped, never extrapolated. A degenerate range maps
    /// everything to entry 0.
    pub fn lookup(&self, temperature: f32, range: DisplayRange) -> Rgb565 {
        let span = range.span();
        if span <= 0.0 {
            return self.table[0];
        }

        let clamped = temperature.clamp(range.min, range.max);
        let index = ((clamped - range.min) / span * 255.0) as usize;
        self.table[index.min(SCALE_ENTRIES - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_hit_the_outer_stops() {
        let scale = ColorScale::default();
        assert_eq!(scale.entry(0), Rgb565::BLUE);
        assert_eq!(scale.entry(255), Rgb565::MAGENTA);
    }

    #[test]
    fn test_stop_positions_are_exact() {
        let scale = ColorScale::default();
        assert_eq!(scale.entry(51), Rgb565::CYAN);
        assert_eq!(scale.entry(76), Rgb565::GREEN);
        assert_eq!(scale.entry(204), Rgb565::RED);
    }

    #[test]
    fn test_lookup_clamps_at_boundaries() {
        let scale = ColorScale::default();
        let range = DisplayRange::new(20.0, 30.0);

        assert_eq!(scale.lookup(20.0, range), scale.entry(0));
        assert_eq!(scale.lookup(-100.0, range), scale.entry(0));
        assert_eq!(scale.lookup(30.0, range), scale.entry(255));
        assert_eq!(scale.lookup(1000.0, range), scale.entry(255));
    }

    #[test]
    fn test_lookup_scales_linearly() {
        let scale = ColorScale::default();
        let range = DisplayRange::new(0.0, 255.0);
        // With a one-to-one range, the temperature is the index.
        assert_eq!(scale.lookup(51.0, range), scale.entry(51));
        assert_eq!(scale.lookup(204.0, range), scale.entry(204));
    }

    #[test]
    fn test_degenerate_range_maps_to_entry_zero() {
        let scale = ColorScale::default();
        let range = DisplayRange::new(25.0, 25.0);
        assert_eq!(scale.lookup(30.0, range), scale.entry(0));
    }

    #[test]
    fn test_gradient_between_stops_moves_monotonically() {
        let scale = ColorScale::default();
        // Blue falls off toward cyan while green rises.
        for i in 1..=51u8 {
            assert!(scale.entry(i).g() >= scale.entry(i - 1).g());
        }
    }
}
