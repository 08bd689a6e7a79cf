//! Per-tick frame processing: acquisition, orientation, ranging, coloring.
//!
//! One `tick` per control-loop iteration. When the acquisition adapter has
//! no complete frame, nothing else runs that tick. When it does, the frame
//! is mirrored per the user's flip flags, its extrema feed the auto-range
//! estimator (or the user's fixed bounds are used), and every pixel is
//! mapped through the gradient table for the renderer.

use crate::colorscale::ColorScale;
use crate::frame::{THERMAL_PIXELS, ThermalFrame};
use crate::materials::effective_emissivity;
use crate::range::{AutoRange, DisplayRange};
use crate::sensor::{Acquisition, AmbientMode, FrameAcquisition, SensorError, ThermalSensor};
use crate::settings::Settings;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// A color-mapped frame plus the scalar readings the UI displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    /// Row-major mapped colors, same layout as the temperature frame.
    pub colors: [Rgb565; THERMAL_PIXELS],
    /// Coldest pixel, °C.
    pub min: f32,
    /// Center-spot reading, °C.
    pub center: f32,
    /// Hottest pixel, °C.
    pub max: f32,
    /// Reflected temperature that fed the calibration, °C.
    pub reflected: f32,
    /// Display range the colors were mapped against.
    pub range: DisplayRange,
}

/// Owns all cross-tick pipeline state: subpage bookkeeping, the smoothed
/// display range, the gradient table, and the working frame buffer.
pub struct ThermalPipeline {
    acquisition: FrameAcquisition,
    auto_range: AutoRange,
    scale: ColorScale,
    frame: ThermalFrame,
}

impl ThermalPipeline {
    pub fn new<S: ThermalSensor>(sensor: &S, settings: &Settings) -> Self {
        Self {
            acquisition: FrameAcquisition::new(sensor.refresh_hz()),
            auto_range: AutoRange::new(DisplayRange::new(settings.min_temp, settings.max_temp)),
            scale: ColorScale::default(),
            frame: ThermalFrame::default(),
        }
    }

    /// The most recent calibrated temperature frame.
    pub fn frame(&self) -> &ThermalFrame {
        &self.frame
    }

    /// Run one pipeline tick.
    ///
    /// Returns `Ok(None)` when no complete frame was available. On automatic
    /// ambient mode the derived reflected temperature is written back into
    /// `settings`, and while auto-ranging the smoothed bounds are mirrored
    /// into `settings.min_temp`/`max_temp`, so the UI always shows the
    /// values actually in use.
    pub fn tick<S: ThermalSensor>(
        &mut self,
        sensor: &mut S,
        now_ms: u64,
        settings: &mut Settings,
    ) -> Result<Option<ProcessedFrame>, SensorError> {
        let emissivity = effective_emissivity(settings.material_index, settings.custom_emissivity);
        let ambient = if settings.auto_ambient {
            AmbientMode::Automatic
        } else {
            AmbientMode::Manual(settings.reflected_temperature)
        };

        let reflected = match self
            .acquisition
            .tick(sensor, now_ms, emissivity, ambient, &mut self.frame)?
        {
            Acquisition::NoFrame => return Ok(None),
            Acquisition::Frame { reflected } => reflected,
        };

        if settings.auto_ambient {
            settings.reflected_temperature = reflected;
        }

        self.frame.orient(settings.flip_hor, settings.flip_ver);

        let (min, max) = self.frame.extents();
        let range = if settings.auto_range {
            let range = self.auto_range.update(min, max);
            settings.min_temp = range.min;
            settings.max_temp = range.max;
            range
        } else {
            // User-controlled bounds; the estimator state is left untouched.
            DisplayRange::new(settings.min_temp, settings.max_temp)
        };

        let mut colors = [Rgb565::BLACK; THERMAL_PIXELS];
        for (color, &temperature) in colors.iter_mut().zip(self.frame.pixels.iter()) {
            *color = self.scale.lookup(temperature, range);
        }

        Ok(Some(ProcessedFrame {
            colors,
            min,
            center: self.frame.center(),
            max,
            reflected,
            range,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SyntheticSensor;

    fn run_until_frame(
        pipeline: &mut ThermalPipeline,
        sensor: &mut SyntheticSensor,
        now_ms: &mut u64,
        settings: &mut Settings,
    ) -> ProcessedFrame {
        for _ in 0..16 {
            *now_ms += 125;
            if let Some(frame) = pipeline.tick(sensor, *now_ms, settings).unwrap() {
                return frame;
            }
        }
        panic!("synthetic sensor never produced a frame");
    }

    #[test]
    fn test_first_tick_has_no_frame_second_does() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings::default();
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);

        assert!(pipeline.tick(&mut sensor, 0, &mut settings).unwrap().is_none());
        assert!(pipeline.tick(&mut sensor, 125, &mut settings).unwrap().is_some());
    }

    #[test]
    fn test_auto_ambient_writes_back_reflected() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings::default();
        settings.reflected_temperature = -1000.0;
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;

        let frame = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);
        assert_eq!(settings.reflected_temperature, frame.reflected);
        assert_ne!(settings.reflected_temperature, -1000.0);
    }

    #[test]
    fn test_manual_ambient_is_left_alone() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings {
            auto_ambient: false,
            reflected_temperature: 18.5,
            ..Settings::default()
        };
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;

        let frame = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);
        assert_eq!(frame.reflected, 18.5);
        assert_eq!(settings.reflected_temperature, 18.5);
    }

    #[test]
    fn test_auto_range_mirrors_bounds_into_settings() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings::default();
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;

        let frame = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);
        assert_eq!(settings.min_temp, frame.range.min);
        assert_eq!(settings.max_temp, frame.range.max);
    }

    #[test]
    fn test_manual_range_is_used_and_untouched() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings {
            auto_range: false,
            min_temp: 0.0,
            max_temp: 100.0,
            ..Settings::default()
        };
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;

        let frame = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);
        assert_eq!(frame.range, DisplayRange::new(0.0, 100.0));
        assert_eq!(settings.min_temp, 0.0);
        assert_eq!(settings.max_temp, 100.0);
    }

    #[test]
    fn test_extrema_map_to_scale_endpoints_under_auto_range() {
        let mut sensor = SyntheticSensor::new();
        let mut settings = Settings::default();
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;

        let frame = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);
        let scale = ColorScale::default();

        // Pixels outside the (still adapting) range clamp to the endpoints.
        assert!(frame.colors.contains(&scale.lookup(frame.min, frame.range)));
        assert!(frame.colors.contains(&scale.lookup(frame.max, frame.range)));
        assert!(frame.min <= frame.center && frame.center <= frame.max);
    }

    #[test]
    fn test_flip_flags_reorient_the_processed_frame() {
        let mut settings = Settings {
            auto_range: false,
            min_temp: 15.0,
            max_temp: 45.0,
            ..Settings::default()
        };

        let mut sensor = SyntheticSensor::new();
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;
        let plain = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);

        settings.flip_hor = true;
        let mut sensor = SyntheticSensor::new();
        let mut pipeline = ThermalPipeline::new(&sensor, &settings);
        let mut now = 0;
        let flipped = run_until_frame(&mut pipeline, &mut sensor, &mut now, &mut settings);

        // Same data, mirrored: first row reversed.
        use crate::frame::THERMAL_COLS;
        for col in 0..THERMAL_COLS {
            assert_eq!(
                plain.colors[col],
                flipped.colors[THERMAL_COLS - 1 - col],
                "column {col} did not mirror"
            );
        }
    }
}
