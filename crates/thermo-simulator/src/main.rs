//! Desktop simulator for the thermo-rs thermal imager core.
//!
//! Runs the full pipeline against the synthetic sensor and an in-memory
//! flash region, rendering the color-mapped frames in an SDL2 window via
//! `embedded-graphics-simulator`.
//!
//! # Key bindings
//!
//! | Key | Action                                   |
//! |-----|------------------------------------------|
//! | H   | Toggle horizontal flip                   |
//! | V   | Toggle vertical flip                     |
//! | A   | Toggle auto-ranging                      |
//! | R   | Toggle automatic ambient temperature     |
//! | E   | Cycle through the material table         |
//! | S   | Save settings to flash (with verify)     |
//! | Q   | Quit                                     |

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{debug, error, info, warn};

use thermo_core::flash::{FlashDevice, MemFlash};
use thermo_core::frame::{THERMAL_COLS, THERMAL_ROWS};
use thermo_core::materials::MATERIALS;
use thermo_core::pipeline::{ProcessedFrame, ThermalPipeline};
use thermo_core::sensor::{SyntheticSensor, ThermalSensor};
use thermo_core::settings::Settings;
use thermo_core::storage::RecordStore;

/// Screen pixels per thermal pixel.
const PIXEL_SCALE: usize = 20;

/// Window dimensions derived from the 16x12 frame.
const WINDOW_WIDTH: usize = THERMAL_COLS * PIXEL_SCALE;
const WINDOW_HEIGHT: usize = THERMAL_ROWS * PIXEL_SCALE;

/// Control-loop pacing, matching the original firmware's main loop.
const TICK_SLEEP: Duration = Duration::from_millis(5);

/// Delay before re-attempting a failed sensor init.
const SENSOR_INIT_BACKOFF: Duration = Duration::from_secs(1);

/// Initialize the sensor, retrying with a fixed backoff instead of
/// aborting. The synthetic sensor never fails, but the control flow is the
/// same one the hardware build uses.
fn init_sensor_with_backoff(sensor: &mut SyntheticSensor) {
    loop {
        match sensor.init() {
            Ok(()) => return,
            Err(err) => {
                warn!("sensor init failed ({err}), retrying");
                std::thread::sleep(SENSOR_INIT_BACKOFF);
            }
        }
    }
}

/// Draw one processed frame as scaled-up blocks.
fn draw_frame(
    display: &mut SimulatorDisplay<Rgb565>,
    frame: &ProcessedFrame,
) -> Result<(), core::convert::Infallible> {
    for row in 0..THERMAL_ROWS {
        for col in 0..THERMAL_COLS {
            let color = frame.colors[row * THERMAL_COLS + col];
            let block = Rectangle::new(
                Point::new((col * PIXEL_SCALE) as i32, (row * PIXEL_SCALE) as i32),
                Size::new(PIXEL_SCALE as u32, PIXEL_SCALE as u32),
            );
            display.fill_solid(&block, color)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    info!("Starting thermo-rs simulator");
    info!("Keys: H/V=flip  A=auto-range  R=auto-ambient  E=material  S=save  Q=Quit");

    // Flash-backed settings, with in-memory defaults as the fallback.
    let mut flash = MemFlash::new();
    if let Err(err) = flash.init() {
        error!("flash init failed: {err}");
        return;
    }
    let mut store = RecordStore::new(flash);
    let mut settings = Settings::load(&store);

    let mut sensor = SyntheticSensor::new();
    init_sensor_with_backoff(&mut sensor);
    let mut pipeline = ThermalPipeline::new(&sensor, &settings);

    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        WINDOW_WIDTH as u32,
        WINDOW_HEIGHT as u32,
    ));
    let output_settings = OutputSettingsBuilder::new().build();
    let mut window = Window::new("Thermo Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let _ = display.clear(Rgb565::BLACK);
    window.update(&display);

    let started = Instant::now();

    'running: loop {
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::H => {
                        settings.flip_hor = !settings.flip_hor;
                        info!("flip horizontal: {}", settings.flip_hor);
                    }
                    Keycode::V => {
                        settings.flip_ver = !settings.flip_ver;
                        info!("flip vertical: {}", settings.flip_ver);
                    }
                    Keycode::A => {
                        settings.auto_range = !settings.auto_range;
                        info!("auto-range: {}", settings.auto_range);
                    }
                    Keycode::R => {
                        settings.auto_ambient = !settings.auto_ambient;
                        info!("auto ambient: {}", settings.auto_ambient);
                    }
                    Keycode::E => {
                        settings.material_index =
                            (settings.material_index + 1) % MATERIALS.len() as u8;
                        let material = MATERIALS[settings.material_index as usize];
                        info!("material: {}", material.name);
                    }
                    Keycode::S => {
                        // Save-as-defaults path: write, then verify by
                        // reading back, exactly like the settings dialog.
                        match settings.store_verified(&mut store) {
                            Ok(()) => info!("settings saved"),
                            Err(err) => error!("saving settings failed: {err}"),
                        }
                    }
                    _ => {}
                },

                _ => {}
            }
        }

        let now_ms = started.elapsed().as_millis() as u64;
        match pipeline.tick(&mut sensor, now_ms, &mut settings) {
            Ok(Some(frame)) => {
                debug!(
                    "frame: min={:.1} center={:.1} max={:.1} tr={:.1} range=[{:.1}, {:.1}]",
                    frame.min,
                    frame.center,
                    frame.max,
                    frame.reflected,
                    frame.range.min,
                    frame.range.max
                );
                let _ = draw_frame(&mut display, &frame);
            }
            Ok(None) => {}
            Err(err) => warn!("sensor fault, retrying next tick: {err}"),
        }

        window.update(&display);
        std::thread::sleep(TICK_SLEEP);
    }

    info!("Simulator exiting");
}
