//! Labware catalog: what sits in each deck slot and how it is declared.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{CompilerConfig, SlotId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabwareKind {
    /// Tool rack; `size` is the `NNNul` token from the label, or `tips`.
    TipRack { size: String },
    /// Agitation or thermal module; labware in the same slot sits on it.
    Module,
    Vessel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareEntry {
    pub slot: SlotId,
    pub label: String,
    pub kind: LabwareKind,
}

impl LabwareEntry {
    /// Classifies a catalog row by substring match on its label.
    pub fn classify(slot: SlotId, label: &str) -> Self {
        let label = label.trim().to_string();
        let lowered = label.to_lowercase();
        let kind = if lowered.contains("tiprack") {
            LabwareKind::TipRack {
                size: rack_size(&label),
            }
        } else if lowered.contains("module") {
            LabwareKind::Module
        } else {
            LabwareKind::Vessel
        };
        Self { slot, label, kind }
    }

    pub fn variable(&self) -> String {
        match &self.kind {
            LabwareKind::TipRack { size } => format!("tiprack_{size}_{}", self.slot),
            LabwareKind::Module => format!("module_{}", self.slot),
            LabwareKind::Vessel => format!("labware_{}", self.slot),
        }
    }
}

fn rack_size(label: &str) -> String {
    static SIZE: OnceLock<Regex> = OnceLock::new();
    let re = SIZE.get_or_init(|| Regex::new(r"(?i)(\d{2,4})\s*ul").expect("valid size pattern"));
    re.captures(label)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "tips".to_string(), |m| format!("{}ul", m.as_str()))
}

/// Geometry class of a liquid-holding slot. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSlot {
    pub slot: SlotId,
    pub label: String,
    pub diameter_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    entries: Vec<LabwareEntry>,
    /// Slot → variable of the labware addressed by wells in that slot.
    variables: HashMap<SlotId, String>,
    vessels: HashMap<SlotId, VesselSlot>,
}

impl Deck {
    pub fn new(entries: Vec<LabwareEntry>, config: &CompilerConfig) -> Self {
        let mut variables = HashMap::new();
        let mut vessels = HashMap::new();
        for entry in &entries {
            if entry.kind == LabwareKind::Module {
                continue;
            }
            variables.insert(entry.slot, entry.variable());
            vessels.insert(
                entry.slot,
                VesselSlot {
                    slot: entry.slot,
                    label: entry.label.clone(),
                    diameter_cm: config.diameter_for(&entry.label),
                },
            );
        }
        Self {
            entries,
            variables,
            vessels,
        }
    }

    pub fn entries(&self) -> &[LabwareEntry] {
        &self.entries
    }

    pub fn variable(&self, slot: SlotId) -> Option<&str> {
        self.variables.get(&slot).map(String::as_str)
    }

    pub fn vessel(&self, slot: SlotId) -> Option<&VesselSlot> {
        self.vessels.get(&slot)
    }

    /// Inner diameter for the labware in `slot`, falling back to the wide-bore
    /// default for unknown slots.
    pub fn diameter_cm(&self, slot: SlotId, config: &CompilerConfig) -> f64 {
        self.vessel(slot)
            .map_or(config.fallback_diameter_cm, |v| v.diameter_cm)
    }

    /// Tool racks in catalog order, as `(size, variable)`.
    pub fn tip_racks(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries.iter().filter_map(|entry| match &entry.kind {
            LabwareKind::TipRack { size } => Some((size.as_str(), entry.variable())),
            LabwareKind::Module | LabwareKind::Vessel => None,
        })
    }

    /// True if a module was declared in `slot` before catalog index `before`.
    pub(crate) fn module_before(&self, slot: SlotId, before: usize) -> bool {
        self.entries[..before]
            .iter()
            .any(|e| e.slot == slot && e.kind == LabwareKind::Module)
    }
}
