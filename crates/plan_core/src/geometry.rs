//! Cylinder volume/height model for aspirate depth.
//!
//! Units: volumes in µL, diameters in cm, depths in mm above the well bottom.

use std::f64::consts::PI;

use tracing::warn;

use crate::{CompilerConfig, Inventory, VesselKey};

/// Outcome of one withdrawal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Withdrawal {
    pub depth_mm: f64,
    /// False when the source was not in the inventory and the default depth
    /// was used.
    pub resolved: bool,
}

pub fn cross_section_cm2(diameter_cm: f64) -> f64 {
    let radius = diameter_cm * 0.5;
    PI * radius * radius
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Depth that sits `surface_margin_mm` below the liquid surface left after
/// withdrawing `withdraw_ul` from `remaining_ul`, never shallower than the
/// minimum clamp.
pub fn aspirate_depth_mm(
    remaining_ul: f64,
    withdraw_ul: f64,
    diameter_cm: f64,
    config: &CompilerConfig,
) -> f64 {
    let area = cross_section_cm2(diameter_cm);
    let pre_height_cm = (remaining_ul / 1000.0) / area;
    let drop_cm = (withdraw_ul / 1000.0) / area;
    let post_height_cm = (pre_height_cm - drop_cm).max(0.0);
    round1(post_height_cm * 10.0 - config.surface_margin_mm).max(config.min_aspirate_depth_mm)
}

/// Computes the depth for a withdrawal and debits the source.
///
/// Unregistered sources get the default depth and leave the inventory
/// untouched.
pub fn withdraw(
    inventory: &mut Inventory,
    source: &VesselKey,
    volume_ul: f64,
    diameter_cm: f64,
    config: &CompilerConfig,
) -> Withdrawal {
    let Some(index) = inventory.find(source) else {
        warn!(%source, "source not in inventory; using default aspirate depth");
        return Withdrawal {
            depth_mm: config.default_aspirate_depth_mm,
            resolved: false,
        };
    };
    let entry = inventory.entry_mut(index);
    let depth_mm = aspirate_depth_mm(entry.volume_ul, volume_ul, diameter_cm, config);
    entry.volume_ul = (entry.volume_ul - volume_ul).max(0.0);
    Withdrawal {
        depth_mm,
        resolved: true,
    }
}
