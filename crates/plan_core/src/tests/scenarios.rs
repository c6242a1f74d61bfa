use super::*;

#[test]
fn test_over_capacity_transfer_splits_into_two_chunks() {
    let plan = compile_low_only(vec![transfer(0, (11, "A1"), (1, "A1"), 250.0)]);
    let actions = plan.actions.actions();
    assert_eq!(shape(actions), "PadtadtD");

    let volumes: Vec<f64> = actions
        .iter()
        .filter_map(|a| match a {
            Action::Aspirate { volume_ul, .. } => Some(*volume_ul),
            _ => None,
        })
        .collect();
    assert_eq!(volumes.len(), 2);
    assert_close(volumes[0], 200.0);
    assert_close(volumes[1], 50.0);
    assert!(actions.iter().all(|a| a.tool() == ToolClass::Low));
}

#[test]
fn test_full_tube_depth_tracks_withdrawals() {
    let plan = compile_low_only(vec![transfer(0, (11, "A1"), (1, "A1"), 250.0)]);
    let depths = aspirate_depths(plan.actions.actions());
    assert_close(depths[0], 47.5);
    assert_close(depths[1], 47.3);
    let left = plan.inventory.volume_ul(&VesselKey::new(11, "A1")).unwrap();
    assert_close(left, 13750.0);
}

#[test]
fn test_end_of_operation_mix_appears_once() {
    let op = with_mix(transfer(0, (11, "A1"), (1, "A1"), 250.0), Some(150.0), false);
    let plan = compile_low_only(vec![op]);
    let actions = plan.actions.actions();
    assert_eq!(shape(actions), "PadtadtmtD");
    assert!(matches!(
        actions[7],
        Action::Mix { repetitions: 5, volume_ul, .. } if (volume_ul - 150.0).abs() < 1e-9
    ));
}

#[test]
fn test_mixed_destination_feeds_next_operation_without_swap() {
    let first = with_mix(transfer(0, (11, "A1"), (1, "A1"), 800.0), None, false);
    let second = transfer(1, (1, "A1"), (1, "A2"), 300.0);
    let plan = compile_both(vec![first, second]);
    let actions = plan.actions.actions();
    assert_eq!(shape(actions), "PadtmtadtD");
    assert!(actions.iter().all(|a| a.tool() == ToolClass::High));

    // 800 µL in a 0.6 cm vial, 300 µL withdrawn: 17.68 mm surface less 5 mm.
    let depths = aspirate_depths(actions);
    assert_close(depths[1], 12.7);
    assert!(plan.actions.annotations().is_empty());
}

#[test]
fn test_unregistered_source_uses_default_depth_and_warns() {
    let plan = compile_low_only(vec![transfer(0, (11, "B5"), (1, "A1"), 40.0)]);
    let actions = plan.actions.actions();
    assert_eq!(shape(actions), "PadtD");
    assert_close(aspirate_depths(actions)[0], 10.0);

    let warnings: Vec<&Diagnostic> = plan.actions.annotations_at(1).collect();
    assert_eq!(
        warnings,
        vec![&Diagnostic::UnresolvedSource {
            source: VesselKey::new(11, "B5"),
        }]
    );
    assert!(plan.inventory.get(&VesselKey::new(11, "B5")).is_none());
}

#[test]
fn test_named_levels_order_execution() {
    let mut low = transfer(0, (11, "A1"), (1, "A1"), 10.0);
    low.priority = PrioritySignal::Level(PriorityLevel::Low);
    let mut high = transfer(1, (11, "A1"), (1, "A2"), 10.0);
    high.priority = PrioritySignal::Level(PriorityLevel::High);
    let unset = transfer(2, (11, "A1"), (1, "A3"), 10.0);
    let plan = compile_low_only(vec![low, high, unset]);
    assert_eq!(plan.order, vec![1, 0, 2]);
}

#[test]
fn test_catalog_without_racks_is_rejected() {
    let config = base_config();
    let labware = crate::test_fixtures::labware_table(&[(11, crate::test_fixtures::STOCK_RACK)]);
    let deck = deck_from(&labware, &config);
    let err = ToolRig::from_deck(&deck, &config).unwrap_err();
    assert_eq!(err, PlanError::NoToolRacks);
    assert_eq!(err.category(), ErrorCategory::Configuration);
}
