//! File loading shared between plan_cli and the integration tests: the three
//! CSV input tables, the compiler configuration and the inventory snapshot.

mod overrides;

pub use overrides::{apply_overrides, parse_override};

use anyhow::{Context, Result};
use plan_core::{CompilerConfig, Inventory, RecordTable};
use std::path::Path;
use tracing::debug;

/// The three tables a compilation pass starts from.
#[derive(Debug, Clone)]
pub struct ProtocolInputs {
    pub stocks: RecordTable,
    pub labware: RecordTable,
    pub transfers: RecordTable,
}

/// Reads a headed CSV file into a string table named `name`.
///
/// Cells are trimmed; rows may be short or long. Blank lines are skipped.
pub fn read_table(path: &Path, name: &str) -> Result<RecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {name} table {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading {name} header from {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("reading {name} row {} in {}", index + 1, path.display()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(table = name, rows = rows.len(), "loaded table");
    Ok(RecordTable::new(name, headers, rows))
}

pub fn load_inputs(stocks: &Path, labware: &Path, transfers: &Path) -> Result<ProtocolInputs> {
    Ok(ProtocolInputs {
        stocks: read_table(stocks, "stocks")?,
        labware: read_table(labware, "labware")?,
        transfers: read_table(transfers, "transfers")?,
    })
}

/// Loads a (possibly partial) configuration file; absent keys take their
/// defaults.
pub fn load_config(path: &Path) -> Result<CompilerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Writes the inventory in the same column layout the stock table is read
/// from, so a snapshot can seed the next run.
pub fn write_inventory_csv(path: &Path, inventory: &Inventory) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating inventory snapshot {}", path.display()))?;
    writer.write_record(plan_core::normalize::STOCK_COLUMNS)?;
    for entry in inventory.entries() {
        writer.write_record([
            entry.name.clone(),
            format!("{:.2}", entry.volume_ul),
            entry.key.slot.to_string(),
            entry.key.well.clone(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("writing inventory snapshot {}", path.display()))?;
    Ok(())
}
