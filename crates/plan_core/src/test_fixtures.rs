//! Shared test fixtures for plan_core and downstream crates.
//!
//! `base_labware()` declares a 15-tube stock rack in slot 11, an 881 µL vial
//! plate in slot 1, a 200 µL tip rack in slot 10 and a 1000 µL tip rack in
//! slot 7. `low_only_labware()` drops the 1000 µL rack.

use crate::normalize::{LABWARE_COLUMNS, STOCK_COLUMNS, TRANSFER_COLUMNS};
use crate::{
    CompilerConfig, Deck, PrioritySignal, RecordTable, TransferOperation, VesselKey,
};

pub const STOCK_RACK: &str = "ecmcustom_15_tuberack_14780ul";
pub const VIAL_PLATE: &str = "ecmcustom_40_wellplate_881.3ul";
pub const LOW_RACK: &str = "opentrons_96_tiprack_200ul";
pub const HIGH_RACK: &str = "opentrons_96_tiprack_1000ul";

pub fn base_config() -> CompilerConfig {
    CompilerConfig::default()
}

pub fn base_labware() -> RecordTable {
    labware_table(&[(11, STOCK_RACK), (1, VIAL_PLATE), (10, LOW_RACK), (7, HIGH_RACK)])
}

pub fn low_only_labware() -> RecordTable {
    labware_table(&[(11, STOCK_RACK), (1, VIAL_PLATE), (10, LOW_RACK)])
}

pub fn labware_table(rows: &[(u32, &str)]) -> RecordTable {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(slot, label)| vec![(*label).to_string(), slot.to_string()])
        .collect();
    RecordTable::new(
        "labware",
        LABWARE_COLUMNS.iter().map(|h| (*h).to_string()).collect(),
        rows,
    )
}

/// Rows are `(name, volume_ul, slot, well)`.
pub fn stock_table(rows: &[(&str, f64, u32, &str)]) -> RecordTable {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(name, volume, slot, well)| {
            vec![
                (*name).to_string(),
                volume.to_string(),
                slot.to_string(),
                (*well).to_string(),
            ]
        })
        .collect();
    RecordTable::new(
        "stocks",
        STOCK_COLUMNS.iter().map(|h| (*h).to_string()).collect(),
        rows,
    )
}

/// Transfer table with the required columns followed by `extra` headers.
/// Each row lists the required cells first, then one cell per extra header.
pub fn transfer_table(extra: &[&str], rows: &[&[&str]]) -> RecordTable {
    let mut headers: Vec<&str> = TRANSFER_COLUMNS.to_vec();
    headers.extend_from_slice(extra);
    RecordTable::from_rows("transfers", &headers, rows)
}

pub fn deck_from(labware: &RecordTable, config: &CompilerConfig) -> Deck {
    let entries = crate::normalize::read_catalog(labware).expect("fixture catalog is valid");
    Deck::new(entries, config)
}

/// Plain transfer with no priority and no mix columns.
pub fn transfer(
    position: usize,
    source: (u32, &str),
    destination: (u32, &str),
    volume_ul: f64,
) -> TransferOperation {
    TransferOperation {
        position,
        source: VesselKey::new(source.0, source.1),
        destination: VesselKey::new(destination.0, destination.1),
        volume_ul,
        priority: PrioritySignal::Absent,
        mix: None,
        diagnostics: vec![],
    }
}
