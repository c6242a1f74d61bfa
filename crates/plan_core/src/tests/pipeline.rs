use super::*;
use crate::test_fixtures::{labware_table, transfer_table, HIGH_RACK, LOW_RACK, STOCK_RACK, VIAL_PLATE};

fn stocks() -> RecordTable {
    stock_table(&[("buffer", 14000.0, 11, "A1")])
}

#[test]
fn test_script_preamble_and_body() {
    let transfers = transfer_table(&[], &[&["11", "A1", "1", "A1", "250"]]);
    let generated =
        compile_protocol(&stocks(), &low_only_labware(), &transfers, &base_config()).unwrap();
    let script = generated.script;

    assert!(script.starts_with("from opentrons import protocol_api\n"));
    assert!(script.contains("    'apiLevel': '2.15',"));
    assert!(script.contains(&format!(
        "    labware_11 = protocol.load_labware('{STOCK_RACK}', 11)"
    )));
    assert!(script.contains(&format!(
        "    tiprack_200ul_10 = protocol.load_labware('{LOW_RACK}', 10)"
    )));
    assert!(script.contains(
        "    p300 = protocol.load_instrument('p300_single_gen2', 'left', tip_racks=[tiprack_200ul_10])"
    ));
    let body: Vec<&str> = script
        .lines()
        .skip_while(|line| !line.contains("pick_up_tip"))
        .collect();
    assert_eq!(
        body,
        vec![
            "    p300.pick_up_tip()",
            "    p300.aspirate(200.0, labware_11['A1'].bottom(z=47.5))",
            "    p300.dispense(200.0, labware_1['A1'].top(z=-3.0))",
            "    p300.touch_tip(labware_1['A1'], radius=0.8, v_offset=-1.0, speed=60.0)",
            "    p300.aspirate(50.0, labware_11['A1'].bottom(z=47.3))",
            "    p300.dispense(50.0, labware_1['A1'].top(z=-3.0))",
            "    p300.touch_tip(labware_1['A1'], radius=0.8, v_offset=-1.0, speed=60.0)",
            "    p300.drop_tip()",
        ]
    );
}

#[test]
fn test_high_class_declared_only_with_large_racks() {
    let transfers = transfer_table(&[], &[&["11", "A1", "1", "A1", "500"]]);
    let generated =
        compile_protocol(&stocks(), &base_labware(), &transfers, &base_config()).unwrap();
    assert!(generated.script.contains(
        "p1000 = protocol.load_instrument('p1000_single_gen2', 'right', tip_racks=[tiprack_1000ul_7])"
    ));
    assert!(generated.script.contains("p1000.aspirate(500.0, "));
}

#[test]
fn test_coercion_note_precedes_operation() {
    let transfers = transfer_table(
        &["Priority"],
        &[
            &["11", "A1", "1", "A1", "20", "whenever"],
            &["11", "A1", "1", "A2", "20", "1"],
        ],
    );
    let generated =
        compile_protocol(&stocks(), &low_only_labware(), &transfers, &base_config()).unwrap();
    assert_eq!(generated.plan.order, vec![1, 0]);

    let lines: Vec<&str> = generated.script.lines().collect();
    let note = lines
        .iter()
        .position(|l| l.contains("# NOTE: row 1: could not interpret 'whenever' in column 'Priority'"))
        .unwrap();
    assert!(lines[note + 1].contains("aspirate(20.0, labware_11['A1']"));
    assert!(lines[note - 1].contains("touch_tip(labware_1['A2']"));
}

#[test]
fn test_unknown_slot_is_fatal() {
    let transfers = transfer_table(&[], &[&["11", "A1", "5", "A1", "20"]]);
    let err =
        compile_protocol(&stocks(), &low_only_labware(), &transfers, &base_config()).unwrap_err();
    assert_eq!(err, PlanError::UnknownSlot { row: 1, slot: 5 });
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_missing_columns_reported_before_compiling() {
    let labware = RecordTable::from_rows("labware", &["labware_title"], &[&[LOW_RACK]]);
    let transfers = transfer_table(&[], &[&["11", "A1", "1", "A1", "20"]]);
    let err = compile_protocol(&stocks(), &labware, &transfers, &base_config()).unwrap_err();
    assert_eq!(
        err,
        PlanError::MissingColumns {
            table: "labware".to_string(),
            missing: vec!["location".to_string()],
        }
    );
}

#[test]
fn test_no_racks_aborts_pass() {
    let labware = labware_table(&[(11, STOCK_RACK), (1, VIAL_PLATE)]);
    let transfers = transfer_table(&[], &[&["11", "A1", "1", "A1", "20"]]);
    let err = compile_protocol(&stocks(), &labware, &transfers, &base_config()).unwrap_err();
    assert_eq!(err, PlanError::NoToolRacks);
}

#[test]
fn test_empty_rig_exhausts_capacity() {
    let config = base_config();
    let deck = deck_from(&labware_table(&[(11, STOCK_RACK), (1, HIGH_RACK)]), &config);
    let rig = ToolRig::new(None, None);
    let err = Compiler::new(&config, &deck, &rig, base_inventory())
        .compile(vec![transfer(0, (11, "A1"), (1, "A1"), 20.0)])
        .unwrap_err();
    assert!(matches!(err, PlanError::CapacityExhausted { row: 1, .. }));
    assert_eq!(err.category(), ErrorCategory::CapacityExhaustion);
}

#[test]
fn test_transfer_below_resolution_emits_nothing() {
    let config = base_config();
    let deck = deck_from(&low_only_labware(), &config);
    let rig = ToolRig::from_deck(&deck, &config).unwrap();
    let plan = Compiler::new(&config, &deck, &rig, base_inventory())
        .compile(vec![
            transfer(0, (11, "A1"), (1, "A1"), 0.003),
            transfer(1, (11, "A1"), (1, "A2"), 200.004),
        ])
        .unwrap();
    let volumes: Vec<f64> = plan
        .actions
        .actions()
        .iter()
        .filter_map(|a| match a {
            Action::Aspirate { volume_ul, .. } => Some(*volume_ul),
            _ => None,
        })
        .collect();
    assert_eq!(volumes.len(), 1);
    assert!((volumes[0] - 200.0).abs() < 1e-9);
    assert!(plan.inventory.get(&VesselKey::new(1, "A1")).is_none());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = CompilerConfig {
        low_capacity_ul: 0.0,
        ..base_config()
    };
    let transfers = transfer_table(&[], &[&["11", "A1", "1", "A1", "20"]]);
    let err = compile_protocol(&stocks(), &low_only_labware(), &transfers, &config).unwrap_err();
    assert!(matches!(err, PlanError::InvalidConfig(_)));
}
