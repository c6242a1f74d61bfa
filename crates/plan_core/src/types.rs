//! Type definitions for `plan_core`.
//!
//! Vessel keys, inventory entries, transfer operations, tool classes and the
//! action sequence produced by a compilation pass.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Integer deck position of a piece of labware.
pub type SlotId = u32;

/// A single well on a piece of labware: `(slot, well)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselKey {
    pub slot: SlotId,
    pub well: String,
}

impl VesselKey {
    pub fn new(slot: SlotId, well: impl Into<String>) -> Self {
        let well: String = well.into();
        Self {
            slot,
            well: well.trim().to_string(),
        }
    }
}

impl fmt::Display for VesselKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot, self.well)
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub name: String,
    pub key: VesselKey,
    /// Never negative; withdrawals clamp at zero.
    pub volume_ul: f64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

/// Raw priority as read from the operation table. Exactly one convention is
/// used per table, chosen by which priority column is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrioritySignal {
    Absent,
    Numeric(f64),
    Level(PriorityLevel),
    RunFirst(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSpec {
    pub enabled: bool,
    pub repetitions: u32,
    /// `None` means "derive from tool capacity".
    pub volume_ul: Option<f64>,
    /// Mix after every chunk instead of only after the final one.
    pub per_chunk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOperation {
    /// Zero-based position in the input table.
    pub position: usize,
    pub source: VesselKey,
    pub destination: VesselKey,
    pub volume_ul: f64,
    pub priority: PrioritySignal,
    /// Present only when the table carries a mix flag column.
    pub mix: Option<MixSpec>,
    /// Coercion fallbacks recorded while reading this row.
    pub diagnostics: Vec<Diagnostic>,
}

impl TransferOperation {
    /// One-based data row, as a person reading the table would count it.
    pub fn row(&self) -> usize {
        self.position + 1
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolClass {
    /// Low-capacity instrument (p300 on 200 µL tips).
    Low,
    /// High-capacity instrument (p1000).
    High,
}

impl ToolClass {
    pub const ALL: [ToolClass; 2] = [ToolClass::Low, ToolClass::High];

    /// Variable name of the instrument in the generated protocol.
    pub fn instrument_var(self) -> &'static str {
        match self {
            ToolClass::Low => "p300",
            ToolClass::High => "p1000",
        }
    }
}

impl fmt::Display for ToolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instrument_var())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolState {
    #[default]
    Empty,
    Holding(VesselKey),
}

impl ToolState {
    pub fn is_holding(&self) -> bool {
        matches!(self, ToolState::Holding(_))
    }

    pub fn holds(&self, key: &VesselKey) -> bool {
        matches!(self, ToolState::Holding(current) if current == key)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    PickUp {
        tool: ToolClass,
    },
    Drop {
        tool: ToolClass,
    },
    Aspirate {
        tool: ToolClass,
        volume_ul: f64,
        source: VesselKey,
        depth_mm: f64,
    },
    Dispense {
        tool: ToolClass,
        volume_ul: f64,
        destination: VesselKey,
    },
    Mix {
        tool: ToolClass,
        repetitions: u32,
        volume_ul: f64,
        destination: VesselKey,
    },
    Touch {
        tool: ToolClass,
        destination: VesselKey,
    },
}

impl Action {
    pub fn tool(&self) -> ToolClass {
        match self {
            Action::PickUp { tool }
            | Action::Drop { tool }
            | Action::Aspirate { tool, .. }
            | Action::Dispense { tool, .. }
            | Action::Mix { tool, .. }
            | Action::Touch { tool, .. } => *tool,
        }
    }
}

/// Non-fatal conditions resolved with a deterministic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A withdrawal referenced a source absent from the inventory.
    UnresolvedSource { source: VesselKey },
    /// A present field failed every conversion rule.
    FieldCoercion {
        row: usize,
        column: String,
        value: String,
        fallback: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedSource { source } => write!(
                f,
                "No stock specified for slot {} well {}; using default aspirate height.",
                source.slot, source.well
            ),
            Diagnostic::FieldCoercion {
                row,
                column,
                value,
                fallback,
            } => write!(
                f,
                "row {row}: could not interpret '{value}' in column '{column}'; using {fallback}."
            ),
        }
    }
}

/// A diagnostic pinned to the action it precedes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Index of the action this annotation is rendered before.
    pub at: usize,
    pub diagnostic: Diagnostic,
}

/// Append-only output of a compilation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSequence {
    actions: Vec<Action>,
    annotations: Vec<Annotation>,
}

impl ActionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Attach a diagnostic to the next action pushed.
    pub fn annotate(&mut self, diagnostic: Diagnostic) {
        self.annotations.push(Annotation {
            at: self.actions.len(),
            diagnostic,
        });
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations rendered immediately before the action at `index`.
    pub fn annotations_at(&self, index: usize) -> impl Iterator<Item = &Diagnostic> {
        self.annotations
            .iter()
            .filter(move |a| a.at == index)
            .map(|a| &a.diagnostic)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
