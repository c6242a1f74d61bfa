//! When to homogenize a destination, and what happens to the tip afterwards.

use crate::chunk::round2;
use crate::{CompilerConfig, MixSpec, VesselKey};

/// Mix parameters resolved against the tool class chosen for an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixPlan {
    pub repetitions: u32,
    pub volume_ul: f64,
    pub per_chunk: bool,
}

/// What the tool does after a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Drop and pick up again; the next chunk draws from the original source.
    Reload,
    /// Keep the tip; the next operation on this class draws from the mixed
    /// destination.
    Keep,
    Drop,
}

impl MixPlan {
    /// `None` when mixing is off for this operation.
    ///
    /// An unspecified volume defaults to `mix_volume_fraction` of capacity,
    /// capped at the requested volume; any volume is clamped to
    /// `[1, capacity]`.
    pub fn resolve(
        spec: Option<&MixSpec>,
        capacity_ul: f64,
        requested_ul: f64,
        config: &CompilerConfig,
    ) -> Option<Self> {
        let spec = spec.filter(|s| s.enabled)?;
        let volume = spec
            .volume_ul
            .unwrap_or_else(|| (config.mix_volume_fraction * capacity_ul).min(requested_ul));
        Some(Self {
            repetitions: spec.repetitions,
            volume_ul: round2(volume.min(capacity_ul).max(1.0)),
            per_chunk: spec.per_chunk,
        })
    }

    pub fn triggers_after(&self, chunk_index: usize, chunk_count: usize) -> bool {
        self.per_chunk || chunk_index + 1 == chunk_count
    }
}

/// Decides tip handling after a mix on `destination`.
///
/// `next_source` is the source of the next operation using the same tool
/// class; it is only consulted once no chunks of the current operation remain.
pub fn retention_after_mix(
    plan: &MixPlan,
    is_last_chunk: bool,
    next_source: Option<&VesselKey>,
    destination: &VesselKey,
) -> Retention {
    if plan.per_chunk && !is_last_chunk {
        return Retention::Reload;
    }
    if next_source == Some(destination) {
        Retention::Keep
    } else {
        Retention::Drop
    }
}
