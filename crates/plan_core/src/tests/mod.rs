use super::*;
use crate::test_fixtures::{
    base_config, base_labware, deck_from, low_only_labware, stock_table, transfer,
};

mod pipeline;
mod scenarios;

// --- Shared test helpers ------------------------------------------------

/// 14 mL of stock in tubes A1 and A2 of the slot 11 rack.
fn base_inventory() -> Inventory {
    normalize::read_inventory(&stock_table(&[
        ("buffer", 14000.0, 11, "A1"),
        ("reagent", 14000.0, 11, "A2"),
    ]))
    .unwrap()
}

fn compile_on(labware: &RecordTable, inventory: Inventory, ops: Vec<TransferOperation>) -> CompiledPlan {
    let config = base_config();
    let deck = deck_from(labware, &config);
    let rig = ToolRig::from_deck(&deck, &config).unwrap();
    Compiler::new(&config, &deck, &rig, inventory)
        .compile(ops)
        .unwrap()
}

fn compile_low_only(ops: Vec<TransferOperation>) -> CompiledPlan {
    compile_on(&low_only_labware(), base_inventory(), ops)
}

fn compile_both(ops: Vec<TransferOperation>) -> CompiledPlan {
    compile_on(&base_labware(), base_inventory(), ops)
}

fn with_mix(mut op: TransferOperation, volume_ul: Option<f64>, per_chunk: bool) -> TransferOperation {
    op.mix = Some(MixSpec {
        enabled: true,
        repetitions: 5,
        volume_ul,
        per_chunk,
    });
    op
}

/// One letter per action, for compact sequence assertions.
fn shape(actions: &[Action]) -> String {
    actions
        .iter()
        .map(|action| match action {
            Action::PickUp { .. } => 'P',
            Action::Drop { .. } => 'D',
            Action::Aspirate { .. } => 'a',
            Action::Dispense { .. } => 'd',
            Action::Mix { .. } => 'm',
            Action::Touch { .. } => 't',
        })
        .collect()
}

fn aspirate_depths(actions: &[Action]) -> Vec<f64> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Aspirate { depth_mm, .. } => Some(*depth_mm),
            _ => None,
        })
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
