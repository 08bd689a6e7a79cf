//! Raw temperature frame and in-place geometric transforms.

/// Columns in one thermal frame.
pub const THERMAL_COLS: usize = 16;

/// Rows in one thermal frame.
pub const THERMAL_ROWS: usize = 12;

/// Total pixels in one thermal frame.
pub const THERMAL_PIXELS: usize = THERMAL_COLS * THERMAL_ROWS;

/// One complete frame of per-pixel temperatures in °C, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalFrame {
    pub pixels: [f32; THERMAL_PIXELS],
}

impl Default for ThermalFrame {
    fn default() -> Self {
        Self {
            pixels: [0.0; THERMAL_PIXELS],
        }
    }
}

impl ThermalFrame {
    /// Pixel at the given row and column.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.pixels[row * THERMAL_COLS + col]
    }

    /// The center-spot reading shown alongside the frame extrema.
    pub fn center(&self) -> f32 {
        self.at(THERMAL_ROWS / 2, THERMAL_COLS / 2)
    }

    /// Pixel-wise minimum and maximum, in one pass.
    pub fn extents(&self) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &pixel in &self.pixels {
            if pixel < min {
                min = pixel;
            }
            if pixel > max {
                max = pixel;
            }
        }
        (min, max)
    }

    /// Swap each row's columns about its center, in place.
    pub fn flip_horizontal(&mut self) {
        for row in 0..THERMAL_ROWS {
            self.pixels[row * THERMAL_COLS..(row + 1) * THERMAL_COLS].reverse();
        }
    }

    /// Swap whole rows about the frame's vertical center, in place.
    pub fn flip_vertical(&mut self) {
        for row in 0..THERMAL_ROWS / 2 {
            let opposite = THERMAL_ROWS - 1 - row;
            for col in 0..THERMAL_COLS {
                self.pixels
                    .swap(row * THERMAL_COLS + col, opposite * THERMAL_COLS + col);
            }
        }
    }

    /// Apply the configured mirror flags.
    pub fn orient(&mut self, flip_hor: bool, flip_ver: bool) {
        if flip_hor {
            self.flip_horizontal();
        }
        if flip_ver {
            self.flip_vertical();
        }
    }
}
