//! Infrared sensor contract and frame acquisition.
//!
//! The sensor delivers one full frame as two interleaved subpages. The
//! [`FrameAcquisition`] adapter normalizes that protocol: it polls for new
//! data, tracks which subpages have been observed, and only produces a
//! calibrated frame once both have been seen at least once. Until then every
//! tick reports [`Acquisition::NoFrame`], which is incompleteness, not an
//! error.
//!
//! The vendor calibration routine (raw ADC counts + factory parameters +
//! emissivity + reflected temperature → °C) lives behind the
//! [`ThermalSensor`] trait and is opaque to this module. Its unit contract
//! must be preserved exactly; everything downstream is unit-sensitive.

mod synthetic;

pub use synthetic::SyntheticSensor;

use thiserror_no_std::Error;

use crate::frame::ThermalFrame;

/// Empirical shift from the sensor's internal ambient reference to the
/// reflected-temperature estimate, °C (open-air figure from the sensor
/// datasheet).
pub const TA_SHIFT: f32 = 5.0;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not respond during initialization.
    #[error("sensor not detected on the bus")]
    NotDetected,

    /// Factory calibration data could not be read or parsed.
    #[error("failed to load factory calibration parameters")]
    BadCalibration,

    /// A bus transaction failed; transient, retried on the next tick.
    #[error("sensor bus transaction failed")]
    BusFault,
}

/// Contract an infrared sensor driver must honor.
///
/// The driver owns the raw subpage buffer and the factory calibration
/// parameters it extracted at init; this module never sees raw ADC counts.
pub trait ThermalSensor {
    /// Probe the sensor and extract factory calibration parameters.
    fn init(&mut self) -> Result<(), SensorError>;

    /// Whether a new subpage is ready to be read.
    fn data_ready(&mut self) -> Result<bool, SensorError>;

    /// Read the pending subpage into the driver's internal buffer and
    /// return its index (0 or 1).
    fn read_subpage(&mut self) -> Result<u8, SensorError>;

    /// Ambient temperature in °C derived from the sensor's built-in
    /// reference, using the last subpage read.
    fn ambient_temperature(&mut self) -> f32;

    /// Vendor calibration: convert the internally buffered raw counts into
    /// per-pixel °C using `emissivity` and the reflected temperature.
    fn calculate_to(&mut self, emissivity: f32, reflected: f32, frame: &mut ThermalFrame);

    /// Configured refresh rate in Hz; gates how often a subpage read is
    /// attempted.
    fn refresh_hz(&self) -> u32;
}

/// How to determine the reflected temperature for calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmbientMode {
    /// Derive from the sensor's ambient reference, shifted by [`TA_SHIFT`].
    Automatic,
    /// Use the supplied value verbatim, °C.
    Manual(f32),
}

/// Outcome of one acquisition tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acquisition {
    /// Nothing new this tick: rate-gated, sensor not ready, or only one
    /// subpage seen so far.
    NoFrame,
    /// A complete calibrated frame was produced; carries the reflected
    /// temperature that fed the calibration, for display.
    Frame { reflected: f32 },
}

/// Normalizes the two-subpage capture protocol into complete frames.
pub struct FrameAcquisition {
    have_subpage: [bool; 2],
    last_read_ms: Option<u64>,
    interval_ms: u64,
}

impl FrameAcquisition {
    /// Set up for a sensor refreshing at `refresh_hz`.
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            have_subpage: [false, false],
            last_read_ms: None,
            interval_ms: 1000 / u64::from(refresh_hz.max(1)),
        }
    }

    /// Run one non-blocking acquisition attempt.
    ///
    /// `now_ms` is the platform's monotonic millisecond clock. Ticks that
    /// arrive faster than the sensor's refresh interval are no-ops. A bus
    /// fault is returned as an error; the caller simply ticks again later.
    pub fn tick<S: ThermalSensor>(
        &mut self,
        sensor: &mut S,
        now_ms: u64,
        emissivity: f32,
        ambient: AmbientMode,
        frame: &mut ThermalFrame,
    ) -> Result<Acquisition, SensorError> {
        if let Some(last) = self.last_read_ms {
            if now_ms.wrapping_sub(last) < self.interval_ms {
                return Ok(Acquisition::NoFrame);
            }
        }

        if !sensor.data_ready()? {
            return Ok(Acquisition::NoFrame);
        }

        let subpage = sensor.read_subpage()?;
        self.last_read_ms = Some(now_ms);

        if let Some(seen) = self.have_subpage.get_mut(subpage as usize) {
            *seen = true;
        }
        if !(self.have_subpage[0] && self.have_subpage[1]) {
            // Both subpages must have been observed before the frame can be
            // calculated.
            return Ok(Acquisition::NoFrame);
        }

        let reflected = match ambient {
            AmbientMode::Automatic => sensor.ambient_temperature() - TA_SHIFT,
            AmbientMode::Manual(value) => value,
        };

        sensor.calculate_to(emissivity, reflected, frame);
        Ok(Acquisition::Frame { reflected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::THERMAL_PIXELS;

    /// Scripted sensor: hands out subpage indices from a list and fills
    /// frames with a constant temperature.
    struct ScriptedSensor {
        subpages: std::vec::Vec<u8>,
        next: usize,
        ready: bool,
        ambient: f32,
        fill: f32,
    }

    impl ScriptedSensor {
        fn new(subpages: &[u8]) -> Self {
            Self {
                subpages: subpages.to_vec(),
                next: 0,
                ready: true,
                ambient: 30.0,
                fill: 22.0,
            }
        }
    }

    impl ThermalSensor for ScriptedSensor {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn data_ready(&mut self) -> Result<bool, SensorError> {
            Ok(self.ready && self.next < self.subpages.len())
        }

        fn read_subpage(&mut self) -> Result<u8, SensorError> {
            let subpage = self.subpages[self.next];
            self.next += 1;
            Ok(subpage)
        }

        fn ambient_temperature(&mut self) -> f32 {
            self.ambient
        }

        fn calculate_to(&mut self, _emissivity: f32, reflected: f32, frame: &mut ThermalFrame) {
            frame.pixels = [self.fill; THERMAL_PIXELS];
            // Encode the reflected value somewhere observable.
            frame.pixels[0] = reflected;
        }

        fn refresh_hz(&self) -> u32 {
            8
        }
    }

    fn tick_at(
        acq: &mut FrameAcquisition,
        sensor: &mut ScriptedSensor,
        now_ms: u64,
        ambient: AmbientMode,
    ) -> Acquisition {
        let mut frame = ThermalFrame::default();
        acq.tick(sensor, now_ms, 0.95, ambient, &mut frame).unwrap()
    }

    #[test]
    fn test_no_frame_until_both_subpages_seen() {
        let mut sensor = ScriptedSensor::new(&[0, 0, 1, 0, 1]);
        let mut acq = FrameAcquisition::new(8);

        // Same subpage twice: still incomplete.
        assert_eq!(
            tick_at(&mut acq, &mut sensor, 0, AmbientMode::Automatic),
            Acquisition::NoFrame
        );
        assert_eq!(
            tick_at(&mut acq, &mut sensor, 200, AmbientMode::Automatic),
            Acquisition::NoFrame
        );

        // Second subpage completes the pair; every later ready tick frames.
        assert!(matches!(
            tick_at(&mut acq, &mut sensor, 400, AmbientMode::Automatic),
            Acquisition::Frame { .. }
        ));
        assert!(matches!(
            tick_at(&mut acq, &mut sensor, 600, AmbientMode::Automatic),
            Acquisition::Frame { .. }
        ));
    }

    #[test]
    fn test_not_ready_is_no_frame() {
        let mut sensor = ScriptedSensor::new(&[0, 1]);
        sensor.ready = false;
        let mut acq = FrameAcquisition::new(8);

        assert_eq!(
            tick_at(&mut acq, &mut sensor, 0, AmbientMode::Automatic),
            Acquisition::NoFrame
        );
        // Nothing was consumed while not ready.
        assert_eq!(sensor.next, 0);
    }

    #[test]
    fn test_refresh_rate_gates_reads() {
        let mut sensor = ScriptedSensor::new(&[0, 1, 0, 1]);
        let mut acq = FrameAcquisition::new(8); // 125 ms interval

        assert_eq!(
            tick_at(&mut acq, &mut sensor, 1000, AmbientMode::Automatic),
            Acquisition::NoFrame
        );
        assert_eq!(sensor.next, 1);

        // Too soon: no subpage attempted.
        assert_eq!(
            tick_at(&mut acq, &mut sensor, 1100, AmbientMode::Automatic),
            Acquisition::NoFrame
        );
        assert_eq!(sensor.next, 1);

        // Interval elapsed: the second subpage completes the frame.
        assert!(matches!(
            tick_at(&mut acq, &mut sensor, 1125, AmbientMode::Automatic),
            Acquisition::Frame { .. }
        ));
        assert_eq!(sensor.next, 2);
    }

    #[test]
    fn test_automatic_ambient_derives_and_reports_shifted_value() {
        let mut sensor = ScriptedSensor::new(&[0, 1]);
        sensor.ambient = 31.5;
        let mut acq = FrameAcquisition::new(8);
        let mut frame = ThermalFrame::default();

        acq.tick(&mut sensor, 0, 0.95, AmbientMode::Automatic, &mut frame)
            .unwrap();
        let outcome = acq
            .tick(&mut sensor, 200, 0.95, AmbientMode::Automatic, &mut frame)
            .unwrap();

        assert_eq!(
            outcome,
            Acquisition::Frame {
                reflected: 31.5 - TA_SHIFT
            }
        );
        // The derived value fed the calibration.
        assert_eq!(frame.pixels[0], 31.5 - TA_SHIFT);
    }

    #[test]
    fn test_manual_ambient_is_used_verbatim() {
        let mut sensor = ScriptedSensor::new(&[1, 0]);
        let mut acq = FrameAcquisition::new(8);
        let mut frame = ThermalFrame::default();

        acq.tick(&mut sensor, 0, 0.95, AmbientMode::Manual(19.0), &mut frame)
            .unwrap();
        let outcome = acq
            .tick(&mut sensor, 200, 0.95, AmbientMode::Manual(19.0), &mut frame)
            .unwrap();

        assert_eq!(outcome, Acquisition::Frame { reflected: 19.0 });
    }
}
