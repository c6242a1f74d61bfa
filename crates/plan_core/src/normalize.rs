//! Maps the three input tables onto canonical records.
//!
//! Required columns are matched exactly; optional columns by case-insensitive
//! synonym. Optional fields that fail every conversion fall back to their
//! default and leave a [`Diagnostic::FieldCoercion`] on the operation.

use tracing::warn;

use crate::chunk::{round2, MIN_CHUNK_UL};
use crate::{
    CompilerConfig, Diagnostic, Inventory, LabwareEntry, MixSpec, PlanError, PriorityLevel,
    PrioritySignal, RecordTable, SlotId, StockEntry, TransferOperation, VesselKey,
};

pub const STOCK_COLUMNS: [&str; 4] = [
    "stock name",
    "volume(ul)",
    "labware location",
    "well location",
];
pub const LABWARE_COLUMNS: [&str; 2] = ["labware_title", "location"];
pub const TRANSFER_COLUMNS: [&str; 5] = [
    "stock labware location 1",
    "stock well location 1",
    "receiving labware location",
    "receiving well location",
    "volume 1",
];

const PRIORITY_SYNONYMS: &[&str] = &[
    "priority",
    "priority rank",
    "priority_rank",
    "priorities",
    "run first",
    "run_first",
    "runfirst",
];
const RUN_FIRST_SYNONYMS: &[&str] = &["run first", "run_first", "runfirst"];
const MIX_FLAG_SYNONYMS: &[&str] = &["mix", "mix?", "mix after", "mix_after", "do mix", "do_mix"];
const MIX_REPS_SYNONYMS: &[&str] = &["mix reps", "mix_reps", "mix_n", "mix times", "mix_times"];
const MIX_VOLUME_SYNONYMS: &[&str] = &["mix volume", "mix_volume", "mix vol", "mix_vol"];
const MIX_EACH_CHUNK_SYNONYMS: &[&str] = &[
    "mix each chunk",
    "mix_each_chunk",
    "mix per chunk",
    "mix_per_chunk",
];

// ---------------------------------------------------------------------------
// Scalar coercion
// ---------------------------------------------------------------------------

/// `Some(bool)` for recognized tokens and numbers, `None` otherwise.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let token = raw.trim().to_lowercase();
    match token.as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => token
            .parse::<f64>()
            .ok()
            .filter(|v| !v.is_nan())
            .map(|v| v != 0.0),
    }
}

pub fn parse_level(raw: &str) -> Option<PriorityLevel> {
    match raw.trim().to_lowercase().as_str() {
        "high" | "hi" | "h" | "urgent" | "top" => Some(PriorityLevel::High),
        "med" | "medium" | "mid" | "m" | "normal" => Some(PriorityLevel::Medium),
        "low" | "lo" | "l" => Some(PriorityLevel::Low),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integers, or floats with no fractional part.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range-checked
fn parse_slot(raw: &str) -> Option<SlotId> {
    let raw = raw.trim();
    raw.parse::<SlotId>().ok().or_else(|| {
        parse_number(raw)
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(SlotId::MAX))
            .map(|v| v as SlotId)
    })
}

/// Positive repetition counts; floats truncate toward zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range-checked
fn parse_reps(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>()
        .ok()
        .or_else(|| {
            parse_number(raw)
                .filter(|v| *v >= 0.0 && *v <= f64::from(u32::MAX))
                .map(|v| v.trunc() as u32)
        })
        .filter(|reps| *reps > 0)
}

fn invalid(table: &RecordTable, row: usize, column: usize) -> PlanError {
    PlanError::InvalidField {
        table: table.name.clone(),
        row: row + 1,
        column: table.header(column).to_string(),
        value: table.cell(row, column).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Inventory and catalog
// ---------------------------------------------------------------------------

pub fn read_inventory(table: &RecordTable) -> Result<Inventory, PlanError> {
    let cols = table.require(&STOCK_COLUMNS)?;
    let (name, volume, slot, well) = (cols[0], cols[1], cols[2], cols[3]);
    let mut entries = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let volume_ul =
            parse_number(table.cell(row, volume)).ok_or_else(|| invalid(table, row, volume))?;
        if volume_ul < 0.0 {
            warn!(table = %table.name, row = row + 1, volume_ul, "negative stock volume clamped to zero");
        }
        let slot_id = parse_slot(table.cell(row, slot)).ok_or_else(|| invalid(table, row, slot))?;
        entries.push(StockEntry {
            name: table.cell(row, name).to_string(),
            key: VesselKey::new(slot_id, table.cell(row, well)),
            volume_ul,
        });
    }
    Ok(Inventory::new(entries))
}

pub fn read_catalog(table: &RecordTable) -> Result<Vec<LabwareEntry>, PlanError> {
    let cols = table.require(&LABWARE_COLUMNS)?;
    let (title, location) = (cols[0], cols[1]);
    (0..table.len())
        .map(|row| {
            let slot = parse_slot(table.cell(row, location))
                .ok_or_else(|| invalid(table, row, location))?;
            Ok(LabwareEntry::classify(slot, table.cell(row, title)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Optional column layout, resolved once per table.
struct OptionalColumns {
    priority: Option<(usize, bool)>,
    mix_flag: Option<usize>,
    mix_reps: Option<usize>,
    mix_volume: Option<usize>,
    mix_each_chunk: Option<usize>,
}

impl OptionalColumns {
    fn resolve(table: &RecordTable) -> Self {
        let priority = table.column_ci(PRIORITY_SYNONYMS).map(|col| {
            let header = table.header(col).to_lowercase();
            (col, RUN_FIRST_SYNONYMS.contains(&header.as_str()))
        });
        Self {
            priority,
            mix_flag: table.column_ci(MIX_FLAG_SYNONYMS),
            mix_reps: table.column_ci(MIX_REPS_SYNONYMS),
            mix_volume: table.column_ci(MIX_VOLUME_SYNONYMS),
            mix_each_chunk: table.column_ci(MIX_EACH_CHUNK_SYNONYMS),
        }
    }
}

/// Per-row reader that records coercion fallbacks as it goes.
struct RowReader<'a> {
    table: &'a RecordTable,
    row: usize,
    diagnostics: Vec<Diagnostic>,
}

impl RowReader<'_> {
    fn fallback(&mut self, column: usize, fallback: impl Into<String>) {
        let diagnostic = Diagnostic::FieldCoercion {
            row: self.row + 1,
            column: self.table.header(column).to_string(),
            value: self.table.cell(self.row, column).to_string(),
            fallback: fallback.into(),
        };
        warn!(table = %self.table.name, "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn flag(&mut self, column: Option<usize>) -> bool {
        let Some(column) = column else {
            return false;
        };
        let table = self.table;
        let raw = table.cell(self.row, column);
        if raw.is_empty() {
            return false;
        }
        parse_flag(raw).unwrap_or_else(|| {
            self.fallback(column, "false");
            false
        })
    }

    fn priority(&mut self, column: Option<(usize, bool)>) -> PrioritySignal {
        let Some((column, run_first)) = column else {
            return PrioritySignal::Absent;
        };
        if run_first {
            return PrioritySignal::RunFirst(self.flag(Some(column)));
        }
        let table = self.table;
        let raw = table.cell(self.row, column);
        if raw.is_empty() {
            return PrioritySignal::Absent;
        }
        if let Some(value) = parse_number(raw) {
            return PrioritySignal::Numeric(value);
        }
        if let Some(level) = parse_level(raw) {
            return PrioritySignal::Level(level);
        }
        self.fallback(column, "no priority");
        PrioritySignal::Absent
    }

    fn mix(&mut self, columns: &OptionalColumns, config: &CompilerConfig) -> Option<MixSpec> {
        let table = self.table;
        let flag_column = columns.mix_flag?;
        let enabled = self.flag(Some(flag_column));

        let mut repetitions = config.default_mix_reps;
        if let Some(column) = columns.mix_reps {
            let raw = table.cell(self.row, column);
            if !raw.is_empty() {
                match parse_reps(raw) {
                    Some(reps) => repetitions = reps,
                    None => self.fallback(column, format!("{} repetitions", config.default_mix_reps)),
                }
            }
        }

        let mut volume_ul = None;
        if let Some(column) = columns.mix_volume {
            let raw = table.cell(self.row, column);
            if !raw.is_empty() {
                match parse_number(raw) {
                    Some(volume) => volume_ul = Some(volume),
                    None => self.fallback(column, "default mix volume"),
                }
            }
        }

        let per_chunk = self.flag(columns.mix_each_chunk);
        Some(MixSpec {
            enabled,
            repetitions,
            volume_ul,
            per_chunk,
        })
    }
}

pub fn read_operations(
    table: &RecordTable,
    config: &CompilerConfig,
) -> Result<Vec<TransferOperation>, PlanError> {
    let cols = table.require(&TRANSFER_COLUMNS)?;
    let (src_slot, src_well, dst_slot, dst_well, volume) = (cols[0], cols[1], cols[2], cols[3], cols[4]);
    let optional = OptionalColumns::resolve(table);

    let mut operations = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let slot_at =
            |column: usize| parse_slot(table.cell(row, column)).ok_or_else(|| invalid(table, row, column));
        let source = VesselKey::new(slot_at(src_slot)?, table.cell(row, src_well));
        let destination = VesselKey::new(slot_at(dst_slot)?, table.cell(row, dst_well));
        let volume_ul = parse_number(table.cell(row, volume))
            .filter(|v| round2(*v) >= MIN_CHUNK_UL)
            .ok_or_else(|| invalid(table, row, volume))?;

        let mut reader = RowReader {
            table,
            row,
            diagnostics: Vec::new(),
        };
        let priority = reader.priority(optional.priority);
        let mix = reader.mix(&optional, config);

        operations.push(TransferOperation {
            position: row,
            source,
            destination,
            volume_ul,
            priority,
            mix,
            diagnostics: reader.diagnostics,
        });
    }
    Ok(operations)
}
