//! Synthetic sensor for the simulator and tests.
//!
//! Generates a drifting hot spot over a cool background so the whole
//! pipeline (auto-ranging included) can be exercised without hardware. The
//! ambient reference fluctuates between 25.0 and 25.9 °C, which makes the
//! live reflected-temperature display visibly change in automatic mode.

use super::{SensorError, ThermalSensor};
use crate::frame::{THERMAL_COLS, THERMAL_PIXELS, THERMAL_ROWS, ThermalFrame};

const BACKGROUND_TEMP: f32 = 21.0;
const HOT_SPOT_SPAN: f32 = 18.0;

/// Deterministic fake MLX-style sensor.
///
/// Subpage indices alternate 0/1 on every read, so two reads are needed
/// before the adapter produces the first frame, just like real hardware.
#[derive(Debug, Default)]
pub struct SyntheticSensor {
    /// Counts subpage reads; drives both the subpage index and the hot-spot
    /// position.
    phase: u32,
}

impl SyntheticSensor {
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Triangle-wave coordinate in `0..limit` for the current phase.
    fn sweep(phase: u32, limit: usize) -> f32 {
        let period = 2 * (limit as u32 - 1);
        let step = phase % period;
        let position = if step < limit as u32 {
            step
        } else {
            period - step
        };
        position as f32
    }
}

impl ThermalSensor for SyntheticSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn data_ready(&mut self) -> Result<bool, SensorError> {
        Ok(true)
    }

    fn read_subpage(&mut self) -> Result<u8, SensorError> {
        let subpage = (self.phase % 2) as u8;
        self.phase = self.phase.wrapping_add(1);
        Ok(subpage)
    }

    fn ambient_temperature(&mut self) -> f32 {
        25.0 + (self.phase % 10) as f32 / 10.0
    }

    fn calculate_to(&mut self, emissivity: f32, _reflected: f32, frame: &mut ThermalFrame) {
        let spot_col = Self::sweep(self.phase / 2, THERMAL_COLS);
        let spot_row = Self::sweep(self.phase / 3, THERMAL_ROWS);

        for i in 0..THERMAL_PIXELS {
            let row = (i / THERMAL_COLS) as f32;
            let col = (i % THERMAL_COLS) as f32;
            let d2 = (row - spot_row) * (row - spot_row) + (col - spot_col) * (col - spot_col);
            // Rational falloff; no libm needed.
            frame.pixels[i] = BACKGROUND_TEMP + emissivity * HOT_SPOT_SPAN / (1.0 + 0.4 * d2);
        }
    }

    fn refresh_hz(&self) -> u32 {
        8
    }
}
