//! Renders an action sequence as an Opentrons Python protocol.

use crate::deck::LabwareKind;
use crate::{
    Action, ActionSequence, CompilerConfig, Deck, Diagnostic, ToolClass, ToolRig, VesselKey,
};

const INDENT: &str = "    ";

/// Python float literal: always carries a decimal point.
pub fn py_float(value: f64) -> String {
    format!("{value:?}")
}

/// Full protocol source: imports, metadata, labware and instrument
/// declarations, then one line per action.
pub fn render_protocol(
    config: &CompilerConfig,
    deck: &Deck,
    rig: &ToolRig,
    sequence: &ActionSequence,
) -> String {
    let mut lines = vec![
        "from opentrons import protocol_api".to_string(),
        String::new(),
        "metadata = {".to_string(),
        format!("{INDENT}'apiLevel': '{}',", config.api_level),
        format!("{INDENT}'protocolName': '{}',", config.protocol_name),
        format!("{INDENT}'author': '{}'", config.author),
        "}".to_string(),
        String::new(),
        "def run(protocol: protocol_api.ProtocolContext):".to_string(),
        format!("{INDENT}# Load labware"),
    ];
    lines.extend(labware_lines(deck).iter().map(|line| format!("{INDENT}{line}")));
    lines.push(String::new());
    lines.extend(rig.mounts().map(|mount| {
        let (instrument, side) = match mount.class {
            ToolClass::Low => (&config.low_instrument, &config.low_mount),
            ToolClass::High => (&config.high_instrument, &config.high_mount),
        };
        format!(
            "{INDENT}{} = protocol.load_instrument('{instrument}', '{side}', tip_racks=[{}])",
            mount.class.instrument_var(),
            mount.racks.join(", ")
        )
    }));
    lines.push(String::new());

    let actions = sequence.actions();
    for index in 0..=actions.len() {
        for diagnostic in sequence.annotations_at(index) {
            lines.push(format!("{INDENT}{}", comment(diagnostic)));
        }
        if let Some(action) = actions.get(index) {
            lines.push(format!("{INDENT}{}", action_line(config, deck, action)));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn labware_lines(deck: &Deck) -> Vec<String> {
    deck.entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let var = entry.variable();
            match entry.kind {
                LabwareKind::Module => format!(
                    "{var} = protocol.load_module('{}', '{}')",
                    entry.label, entry.slot
                ),
                LabwareKind::Vessel if deck.module_before(entry.slot, index) => format!(
                    "{var} = module_{}.load_labware('{}')",
                    entry.slot, entry.label
                ),
                LabwareKind::TipRack { .. } | LabwareKind::Vessel => format!(
                    "{var} = protocol.load_labware('{}', {})",
                    entry.label, entry.slot
                ),
            }
        })
        .collect()
}

fn comment(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::UnresolvedSource { .. } => format!("# WARNING: {diagnostic}"),
        Diagnostic::FieldCoercion { .. } => format!("# NOTE: {diagnostic}"),
    }
}

fn well(deck: &Deck, key: &VesselKey) -> String {
    let var = deck
        .variable(key.slot)
        .map_or_else(|| format!("labware_{}", key.slot), str::to_string);
    format!("{var}['{}']", key.well)
}

fn action_line(config: &CompilerConfig, deck: &Deck, action: &Action) -> String {
    let pipette = action.tool().instrument_var();
    match action {
        Action::PickUp { .. } => format!("{pipette}.pick_up_tip()"),
        Action::Drop { .. } => format!("{pipette}.drop_tip()"),
        Action::Aspirate {
            volume_ul,
            source,
            depth_mm,
            ..
        } => format!(
            "{pipette}.aspirate({}, {}.bottom(z={}))",
            py_float(*volume_ul),
            well(deck, source),
            py_float(*depth_mm)
        ),
        Action::Dispense {
            volume_ul,
            destination,
            ..
        } => format!(
            "{pipette}.dispense({}, {}.top(z={}))",
            py_float(*volume_ul),
            well(deck, destination),
            py_float(config.dispense_top_offset_mm)
        ),
        Action::Mix {
            repetitions,
            volume_ul,
            destination,
            ..
        } => format!(
            "{pipette}.mix({repetitions}, {}, {}.bottom(z={}))",
            py_float(*volume_ul),
            well(deck, destination),
            py_float(config.mix_height_mm)
        ),
        Action::Touch { destination, .. } => format!(
            "{pipette}.touch_tip({}, radius={}, v_offset={}, speed={})",
            well(deck, destination),
            py_float(config.touch_radius),
            py_float(config.touch_v_offset_mm),
            py_float(config.touch_speed)
        ),
    }
}
