//! Compiler configuration: tool capacities, geometry constants and the
//! protocol metadata block. Every field has a default so partial JSON files
//! deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::PlanError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Hard cap for a single low-class hold (µL).
    pub low_capacity_ul: f64,
    /// Hard cap for a single high-class hold (µL).
    pub high_capacity_ul: f64,
    pub default_mix_reps: u32,
    /// Default mix volume as a fraction of tool capacity.
    pub mix_volume_fraction: f64,
    /// Mix near the bottom of the destination (mm above bottom).
    pub mix_height_mm: f64,
    /// Depth used when a source is not in the inventory.
    pub default_aspirate_depth_mm: f64,
    /// Distance below the predicted post-withdrawal surface.
    pub surface_margin_mm: f64,
    pub min_aspirate_depth_mm: f64,
    /// Inner diameter for labware labels missing from `vessel_diameters_cm`.
    pub fallback_diameter_cm: f64,
    pub vessel_diameters_cm: BTreeMap<String, f64>,
    pub dispense_top_offset_mm: f64,
    pub touch_radius: f64,
    pub touch_v_offset_mm: f64,
    pub touch_speed: f64,
    pub api_level: String,
    pub protocol_name: String,
    pub author: String,
    pub low_instrument: String,
    pub low_mount: String,
    pub high_instrument: String,
    pub high_mount: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            low_capacity_ul: 200.0,
            high_capacity_ul: 900.0,
            default_mix_reps: 5,
            mix_volume_fraction: 0.8,
            mix_height_mm: 2.0,
            default_aspirate_depth_mm: 10.0,
            surface_margin_mm: 5.0,
            min_aspirate_depth_mm: 1.0,
            fallback_diameter_cm: 3.0,
            vessel_diameters_cm: BTreeMap::from([
                ("ecmcustom_15_tuberack_14780ul".to_string(), 1.83),
                ("avantorhplcvial_40_wellplate_1500ul".to_string(), 1.0),
                ("ecmcustom_40_wellplate_881.3ul".to_string(), 0.6),
            ]),
            dispense_top_offset_mm: -3.0,
            touch_radius: 0.8,
            touch_v_offset_mm: -1.0,
            touch_speed: 60.0,
            api_level: "2.15".to_string(),
            protocol_name: "Automatic Protocol".to_string(),
            author: "Generated".to_string(),
            low_instrument: "p300_single_gen2".to_string(),
            low_mount: "left".to_string(),
            high_instrument: "p1000_single_gen2".to_string(),
            high_mount: "right".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Inner diameter (cm) for a labware label.
    pub fn diameter_for(&self, label: &str) -> f64 {
        self.vessel_diameters_cm
            .get(label.trim())
            .copied()
            .unwrap_or(self.fallback_diameter_cm)
    }

    /// Rejects values the compiler cannot work with.
    pub fn validate(&self) -> Result<(), PlanError> {
        let positive = [
            ("low_capacity_ul", self.low_capacity_ul),
            ("high_capacity_ul", self.high_capacity_ul),
            ("fallback_diameter_cm", self.fallback_diameter_cm),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PlanError::InvalidConfig(format!(
                    "'{key}' must be a positive number, got {value}"
                )));
            }
        }
        for (label, diameter) in &self.vessel_diameters_cm {
            if !(diameter.is_finite() && *diameter > 0.0) {
                return Err(PlanError::InvalidConfig(format!(
                    "diameter for '{label}' must be positive, got {diameter}"
                )));
            }
        }
        if !(self.mix_volume_fraction > 0.0 && self.mix_volume_fraction <= 1.0) {
            return Err(PlanError::InvalidConfig(format!(
                "'mix_volume_fraction' must be in (0, 1], got {}",
                self.mix_volume_fraction
            )));
        }
        if self.default_mix_reps == 0 {
            return Err(PlanError::InvalidConfig(
                "'default_mix_reps' must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
