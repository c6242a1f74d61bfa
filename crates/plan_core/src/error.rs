//! Fatal errors for a compilation pass.

use thiserror::Error;

use crate::SlotId;

/// Which part of the error taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected before the pass starts; nothing is emitted.
    Configuration,
    /// No tool class can service a requested volume.
    CapacityExhaustion,
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("{table} table is missing required columns: {}", missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },

    #[error("no tip racks found in the labware catalog; include at least one tiprack")]
    NoToolRacks,

    #[error("{table} row {row}: column '{column}' has invalid value '{value}'")]
    InvalidField {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("operation row {row} references slot {slot}, which has no labware loaded")]
    UnknownSlot { row: usize, slot: SlotId },

    #[error("invalid compiler configuration: {0}")]
    InvalidConfig(String),

    #[error("operation row {row}: no tool class is available to transfer {volume_ul} µL")]
    CapacityExhausted { row: usize, volume_ul: f64 },
}

impl PlanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlanError::CapacityExhausted { .. } => ErrorCategory::CapacityExhaustion,
            PlanError::MissingColumns { .. }
            | PlanError::NoToolRacks
            | PlanError::InvalidField { .. }
            | PlanError::UnknownSlot { .. }
            | PlanError::InvalidConfig(_) => ErrorCategory::Configuration,
        }
    }
}
