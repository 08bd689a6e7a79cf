//! Persisted user settings.
//!
//! The settings struct is the single record the flash store carries. Every
//! field is fixed-width under postcard (`u8` and `bool` one byte, `f32` four
//! bytes little-endian), so the encoded payload always occupies
//! [`SETTINGS_SIZE`] bytes and the record store can validate its declared
//! length up front.
//!
//! Any structural change to this struct, or to the material table it indexes
//! into, must be paired with a bump of [`SETTINGS_VERSION`]; readers treat a
//! version mismatch identically to "no data" and fall back to defaults.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::flash::FlashDevice;
use crate::storage::{RecordStore, StorageError};

/// Magic number recognizing valid settings in flash storage.
pub const SETTINGS_MAGIC: u32 = 0x5e77_16a1;

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 3;

/// Encoded size of [`Settings`] in bytes.
pub const SETTINGS_SIZE: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Index into the material table; `MATERIAL_INDEX_CUSTOM` (0) selects
    /// `custom_emissivity` instead.
    pub material_index: u8,

    /// Emissivity of the measured object when no table material is
    /// selected. Value in [0, 1]; 0.95 suits typical matte objects.
    pub custom_emissivity: f32,

    /// Derive the reflected temperature from the sensor's built-in ambient
    /// reference instead of `reflected_temperature`.
    pub auto_ambient: bool,

    /// Reflected temperature in °C. Authoritative when `auto_ambient` is
    /// false; updated with the measured value each frame when it is true, so
    /// the UI can show what is actually in use.
    pub reflected_temperature: f32,

    /// Automatically track the color scale bounds from the live image.
    pub auto_range: bool,

    /// Minimum temperature on the color scale, °C.
    pub min_temp: f32,

    /// Maximum temperature on the color scale, °C.
    pub max_temp: f32,

    /// Flip the image horizontally.
    pub flip_hor: bool,

    /// Flip the image vertically.
    pub flip_ver: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            material_index: crate::materials::MATERIAL_INDEX_CUSTOM,
            custom_emissivity: 0.95,
            auto_ambient: true,
            reflected_temperature: 25.0,
            auto_range: true,
            min_temp: 20.0,
            max_temp: 40.0,
            flip_hor: false,
            flip_ver: false,
        }
    }
}

impl Settings {
    /// Load settings from the record store, falling back to defaults when
    /// no valid record exists.
    ///
    /// Every failure mode here (erased flash, schema mismatch, checksum
    /// failure, flash fault) is recoverable and only logged; the in-memory
    /// defaults are always a safe answer.
    pub fn load<F: FlashDevice>(store: &RecordStore<F>) -> Self {
        let payload = match store.read(SETTINGS_MAGIC, SETTINGS_VERSION, SETTINGS_SIZE) {
            Ok(payload) => payload,
            Err(err) => {
                info!("no stored settings ({err}), using defaults");
                return Self::default();
            }
        };

        match postcard::from_bytes(&payload) {
            Ok(settings) => {
                info!("loaded settings from flash");
                settings
            }
            Err(_) => {
                warn!("stored settings failed to decode, using defaults");
                Self::default()
            }
        }
    }

    /// Persist these settings as the stored record.
    pub fn store<F: FlashDevice>(&self, store: &mut RecordStore<F>) -> Result<(), StorageError> {
        let payload = postcard::to_allocvec(self).map_err(|_| StorageError::HeaderMismatch);
        // Postcard encoding of a fixed-width struct cannot fail in practice;
        // the map_err above only keeps the signature honest.
        let payload = payload?;
        debug_assert_eq!(payload.len(), SETTINGS_SIZE);
        store.write(SETTINGS_MAGIC, SETTINGS_VERSION, &payload)
    }

    /// Persist and immediately read back, reporting whether the stored
    /// record matches. This is the save path the settings dialog uses to
    /// detect silent flash corruption.
    pub fn store_verified<F: FlashDevice>(
        &self,
        store: &mut RecordStore<F>,
    ) -> Result<(), StorageError> {
        self.store(store)?;
        let read_back = Self::load_strict(store)?;
        if read_back != *self {
            warn!("settings verify failed: read-back record differs");
            return Err(StorageError::ChecksumMismatch);
        }
        Ok(())
    }

    /// Like [`Settings::load`] but surfacing the failure instead of
    /// defaulting, for callers that need to distinguish.
    pub fn load_strict<F: FlashDevice>(store: &RecordStore<F>) -> Result<Self, StorageError> {
        let payload = store.read(SETTINGS_MAGIC, SETTINGS_VERSION, SETTINGS_SIZE)?;
        postcard::from_bytes(&payload).map_err(|_| StorageError::ChecksumMismatch)
    }
}
