use anyhow::{anyhow, bail, Result};
use plan_core::CompilerConfig;
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "low_capacity_ul",
    "high_capacity_ul",
    "default_mix_reps",
    "mix_volume_fraction",
    "mix_height_mm",
    "default_aspirate_depth_mm",
    "surface_margin_mm",
    "min_aspirate_depth_mm",
    "fallback_diameter_cm",
    "dispense_top_offset_mm",
    "touch_radius",
    "touch_v_offset_mm",
    "touch_speed",
    "api_level",
    "protocol_name",
    "author",
    "low_instrument",
    "low_mount",
    "high_instrument",
    "high_mount",
];

pub fn apply_overrides(
    config: &mut CompilerConfig,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        match key.as_str() {
            "low_capacity_ul" => config.low_capacity_ul = as_f64(key, value)?,
            "high_capacity_ul" => config.high_capacity_ul = as_f64(key, value)?,
            "default_mix_reps" => config.default_mix_reps = as_u32(key, value)?,
            "mix_volume_fraction" => config.mix_volume_fraction = as_f64(key, value)?,
            "mix_height_mm" => config.mix_height_mm = as_f64(key, value)?,
            "default_aspirate_depth_mm" => {
                config.default_aspirate_depth_mm = as_f64(key, value)?;
            }
            "surface_margin_mm" => config.surface_margin_mm = as_f64(key, value)?,
            "min_aspirate_depth_mm" => config.min_aspirate_depth_mm = as_f64(key, value)?,
            "fallback_diameter_cm" => config.fallback_diameter_cm = as_f64(key, value)?,
            "dispense_top_offset_mm" => config.dispense_top_offset_mm = as_f64(key, value)?,
            "touch_radius" => config.touch_radius = as_f64(key, value)?,
            "touch_v_offset_mm" => config.touch_v_offset_mm = as_f64(key, value)?,
            "touch_speed" => config.touch_speed = as_f64(key, value)?,
            "api_level" => config.api_level = as_string(key, value)?,
            "protocol_name" => config.protocol_name = as_string(key, value)?,
            "author" => config.author = as_string(key, value)?,
            "low_instrument" => config.low_instrument = as_string(key, value)?,
            "low_mount" => config.low_mount = as_string(key, value)?,
            "high_instrument" => config.high_instrument = as_string(key, value)?,
            "high_mount" => config.high_mount = as_string(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

/// Splits a `key=value` argument. The value is read as JSON when it parses
/// (so `200`, `0.5` and `"text"` keep their types) and as a bare string
/// otherwise.
pub fn parse_override(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("override '{raw}' must have the form key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("override '{raw}' has an empty key");
    }
    let value = value.trim();
    let parsed = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = value
        .as_u64()
        .ok_or_else(|| anyhow!("override '{key}': expected a positive integer, got {value}"))?;
    u32::try_from(val).map_err(|_| anyhow!("override '{key}': value {val} exceeds u32 range"))
}

fn as_string(key: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => bail!("override '{key}': expected a string, got {value}"),
    }
}
