//! Emissivity table for common materials.
//!
//! Index 0 is the "custom" placeholder: it stands for a user-supplied
//! emissivity rather than a table value. The list was compiled from multiple
//! sources and contains approximate values only.
//!
//! WARNING: when updating this list, also increase `SETTINGS_VERSION` in the
//! settings module, since persisted settings reference it by index.

/// Special material index denoting a user-supplied custom emissivity.
pub const MATERIAL_INDEX_CUSTOM: u8 = 0;

/// A named material and its emissivity, scaled by 1000 (values 0..=1000).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    pub emissivity_milli: u16,
    pub name: &'static str,
}

const fn material(emissivity_milli: u16, name: &'static str) -> Material {
    Material {
        emissivity_milli,
        name,
    }
}

/// Emissivities of common materials, custom placeholder first.
#[rustfmt::skip]
pub const MATERIALS: &[Material] = &[
    material(0,    "<custom>"),
    material(1000, "<black body>"),
    material(30,   "Aluminum foil"),
    material(770,  "Aluminum anodized"),
    material(880,  "Asphalt"),
    material(830,  "Brick"),
    material(540,  "Cement"),
    material(960,  "Charcoal powder"),
    material(100,  "Chromium polished"),
    material(930,  "Concrete"),
    material(40,   "Copper polished"),
    material(650,  "Copper oxidized"),
    material(920,  "Glass"),
    material(980,  "Human skin"),
    material(780,  "Human corrected"),
    material(890,  "Plaster"),
    material(940,  "Plastic acrylic"),
    material(950,  "Plastic black"),
    material(840,  "Plastic white"),
    material(820,  "Plywood"),
    material(950,  "Rubber"),
    material(800,  "Snow"),
    material(590,  "Stainless steel"),
    material(280,  "Steel galvanized"),
    material(970,  "Tape black electrical"),
    material(920,  "Tape masking"),
    material(950,  "Water"),
];

/// Resolve the emissivity to feed the calibration: the custom value for
/// index 0, the table value otherwise. An out-of-table index (stale settings
/// from an edited table) falls back to the custom value.
pub fn effective_emissivity(material_index: u8, custom_emissivity: f32) -> f32 {
    match MATERIALS.get(material_index as usize) {
        Some(material) if material_index != MATERIAL_INDEX_CUSTOM => {
            f32::from(material.emissivity_milli) / 1000.0
        }
        _ => custom_emissivity,
    }
}
