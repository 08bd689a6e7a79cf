//! Hardware-independent core library for thermo-rs
//!
//! This crate contains all platform-agnostic logic for the thermo handheld
//! thermal-imaging device: flash record storage, persisted user settings,
//! thermal frame acquisition, auto-ranging, and color mapping.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod colorscale;
pub mod flash;
pub mod frame;
pub mod materials;
pub mod pipeline;
pub mod range;
pub mod sensor;
pub mod settings;
pub mod storage;
