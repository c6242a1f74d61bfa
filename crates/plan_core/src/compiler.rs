use tracing::{debug, info, warn};

use crate::chunk::chunk_volumes;
use crate::emit::render_protocol;
use crate::geometry::withdraw;
use crate::mix::{retention_after_mix, MixPlan, Retention};
use crate::normalize::{read_catalog, read_inventory, read_operations};
use crate::schedule::schedule;
use crate::tools::{next_source_for_class, ToolLifecycle};
use crate::{
    Action, ActionSequence, CompilerConfig, Deck, Diagnostic, Inventory, PlanError, RecordTable,
    ToolClass, ToolRig, TransferOperation,
};

/// Result of one compilation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    pub actions: ActionSequence,
    /// Inventory after every withdrawal and deposit.
    pub inventory: Inventory,
    /// Input positions in execution order.
    pub order: Vec<usize>,
}

/// Single forward pass over priority-ordered operations.
///
/// Owns the inventory snapshot and tool state for the duration of the pass;
/// compile from independent snapshots for independent passes.
pub struct Compiler<'a> {
    config: &'a CompilerConfig,
    deck: &'a Deck,
    rig: &'a ToolRig,
    inventory: Inventory,
    tools: ToolLifecycle,
    sequence: ActionSequence,
}

impl<'a> Compiler<'a> {
    pub fn new(
        config: &'a CompilerConfig,
        deck: &'a Deck,
        rig: &'a ToolRig,
        inventory: Inventory,
    ) -> Self {
        Self {
            config,
            deck,
            rig,
            inventory,
            tools: ToolLifecycle::new(),
            sequence: ActionSequence::new(),
        }
    }

    /// Orders `operations` by priority and emits the full action sequence.
    ///
    /// Fails before emitting anything if an operation references a slot with
    /// no labware; fails mid-pass if no tool class can take a transfer, in
    /// which case the partial sequence is discarded.
    pub fn compile(mut self, operations: Vec<TransferOperation>) -> Result<CompiledPlan, PlanError> {
        self.config.validate()?;
        let operations = schedule(operations);
        self.check_slots(&operations)?;

        for (index, op) in operations.iter().enumerate() {
            self.run_operation(op, &operations[index + 1..])?;
        }
        self.tools.finish(&mut self.sequence);

        info!(
            operations = operations.len(),
            actions = self.sequence.len(),
            "compiled transfer plan"
        );
        Ok(CompiledPlan {
            actions: self.sequence,
            inventory: self.inventory,
            order: operations.iter().map(|op| op.position).collect(),
        })
    }

    fn check_slots(&self, operations: &[TransferOperation]) -> Result<(), PlanError> {
        for op in operations {
            for slot in [op.source.slot, op.destination.slot] {
                if self.deck.variable(slot).is_none() {
                    return Err(PlanError::UnknownSlot {
                        row: op.row(),
                        slot,
                    });
                }
            }
        }
        Ok(())
    }

    fn run_operation(
        &mut self,
        op: &TransferOperation,
        remaining: &[TransferOperation],
    ) -> Result<(), PlanError> {
        let exhausted = || PlanError::CapacityExhausted {
            row: op.row(),
            volume_ul: op.volume_ul,
        };
        let class = self.rig.select(op.volume_ul).ok_or_else(exhausted)?;
        let capacity = self.rig.capacity(class).ok_or_else(exhausted)?;

        let chunks = chunk_volumes(op.volume_ul, capacity);
        if chunks.is_empty() {
            warn!(row = op.row(), volume_ul = op.volume_ul, "transfer rounds to nothing; skipped");
            return Ok(());
        }

        for diagnostic in &op.diagnostics {
            self.sequence.annotate(diagnostic.clone());
        }
        self.tools.engage(class, &op.source, &mut self.sequence);

        let mix = MixPlan::resolve(op.mix.as_ref(), capacity, op.volume_ul, self.config);
        let diameter = self.deck.diameter_cm(op.source.slot, self.config);
        debug!(
            row = op.row(),
            tool = %class,
            chunks = chunks.len(),
            source = %op.source,
            destination = %op.destination,
            "planning transfer"
        );

        for (index, &volume_ul) in chunks.iter().enumerate() {
            let withdrawal = withdraw(
                &mut self.inventory,
                &op.source,
                volume_ul,
                diameter,
                self.config,
            );
            if !withdrawal.resolved {
                self.sequence.annotate(Diagnostic::UnresolvedSource {
                    source: op.source.clone(),
                });
            }
            self.sequence.push(Action::Aspirate {
                tool: class,
                volume_ul,
                source: op.source.clone(),
                depth_mm: withdrawal.depth_mm,
            });
            self.sequence.push(Action::Dispense {
                tool: class,
                volume_ul,
                destination: op.destination.clone(),
            });

            let is_last = index + 1 == chunks.len();
            match mix.filter(|plan| plan.triggers_after(index, chunks.len())) {
                Some(plan) => self.mix_and_resolve(op, class, &plan, is_last, remaining),
                None => self.touch(class, op),
            }

            self.inventory.promote(&op.destination, volume_ul);
        }
        Ok(())
    }

    fn touch(&mut self, class: ToolClass, op: &TransferOperation) {
        self.sequence.push(Action::Touch {
            tool: class,
            destination: op.destination.clone(),
        });
    }

    fn mix_and_resolve(
        &mut self,
        op: &TransferOperation,
        class: ToolClass,
        plan: &MixPlan,
        is_last: bool,
        remaining: &[TransferOperation],
    ) {
        self.touch(class, op);
        self.sequence.push(Action::Mix {
            tool: class,
            repetitions: plan.repetitions,
            volume_ul: plan.volume_ul,
            destination: op.destination.clone(),
        });
        self.touch(class, op);

        let next_source = next_source_for_class(remaining, class, self.rig);
        match retention_after_mix(plan, is_last, next_source, &op.destination) {
            Retention::Reload => self.tools.reload(class, &op.source, &mut self.sequence),
            Retention::Keep => self.tools.retain_for(class, op.destination.clone()),
            Retention::Drop => self.tools.release(class, &mut self.sequence),
        }
    }
}

/// A rendered protocol together with the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProtocol {
    pub script: String,
    pub plan: CompiledPlan,
}

/// Normalizes the three tables, assembles the deck and tool rig, runs a pass
/// and renders the protocol. Configuration errors surface before any action
/// is produced.
pub fn compile_protocol(
    stocks: &RecordTable,
    labware: &RecordTable,
    transfers: &RecordTable,
    config: &CompilerConfig,
) -> Result<GeneratedProtocol, PlanError> {
    let inventory = read_inventory(stocks)?;
    let deck = Deck::new(read_catalog(labware)?, config);
    let rig = ToolRig::from_deck(&deck, config)?;
    let operations = read_operations(transfers, config)?;
    if operations.is_empty() {
        warn!("transfer table has no operations");
    }
    let plan = Compiler::new(config, &deck, &rig, inventory).compile(operations)?;
    let script = render_protocol(config, &deck, &rig, &plan.actions);
    Ok(GeneratedProtocol { script, plan })
}
