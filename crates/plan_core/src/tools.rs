//! Per tool-class lifecycle: which source the mounted tip last touched.

use tracing::debug;

use crate::{Action, ActionSequence, ToolClass, ToolRig, ToolState, TransferOperation, VesselKey};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolLifecycle {
    low: ToolState,
    high: ToolState,
}

impl ToolLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, class: ToolClass) -> &ToolState {
        match class {
            ToolClass::Low => &self.low,
            ToolClass::High => &self.high,
        }
    }

    fn state_mut(&mut self, class: ToolClass) -> &mut ToolState {
        match class {
            ToolClass::Low => &mut self.low,
            ToolClass::High => &mut self.high,
        }
    }

    /// Readies `class` for an operation drawing from `source`.
    ///
    /// A tip already holding `source` is reused; any other tip is dropped and
    /// a fresh one picked up.
    pub fn engage(&mut self, class: ToolClass, source: &VesselKey, sequence: &mut ActionSequence) {
        let state = self.state_mut(class);
        if state.holds(source) {
            debug!(tool = %class, %source, "reusing tip");
            return;
        }
        if state.is_holding() {
            sequence.push(Action::Drop { tool: class });
        }
        sequence.push(Action::PickUp { tool: class });
        *state = ToolState::Holding(source.clone());
    }

    /// Drops the tip if one is mounted.
    pub fn release(&mut self, class: ToolClass, sequence: &mut ActionSequence) {
        let state = self.state_mut(class);
        if state.is_holding() {
            sequence.push(Action::Drop { tool: class });
        }
        *state = ToolState::Empty;
    }

    /// Swaps to a fresh tip for another aspiration from `source`.
    pub fn reload(&mut self, class: ToolClass, source: &VesselKey, sequence: &mut ActionSequence) {
        self.release(class, sequence);
        sequence.push(Action::PickUp { tool: class });
        *self.state_mut(class) = ToolState::Holding(source.clone());
    }

    /// Keeps the mounted tip and treats `key` as its current source. Emits
    /// nothing.
    pub fn retain_for(&mut self, class: ToolClass, key: VesselKey) {
        debug!(tool = %class, next_source = %key, "keeping tip after mix");
        *self.state_mut(class) = ToolState::Holding(key);
    }

    /// Closes every outstanding hold, low class first.
    pub fn finish(&mut self, sequence: &mut ActionSequence) {
        for class in ToolClass::ALL {
            self.release(class, sequence);
        }
    }
}

/// Source of the next operation in `remaining` that resolves to `class`.
pub fn next_source_for_class<'a>(
    remaining: &'a [TransferOperation],
    class: ToolClass,
    rig: &ToolRig,
) -> Option<&'a VesselKey> {
    remaining
        .iter()
        .find(|op| rig.select(op.volume_ul) == Some(class))
        .map(|op| &op.source)
}
