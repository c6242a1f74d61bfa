//! Priority ordering of operations.

use crate::{PriorityLevel, PrioritySignal, TransferOperation};

/// Numeric score, lower runs earlier. Absent priority sorts last.
pub fn priority_score(signal: PrioritySignal) -> f64 {
    match signal {
        PrioritySignal::Numeric(value) => value,
        PrioritySignal::Level(PriorityLevel::High) | PrioritySignal::RunFirst(true) => 0.0,
        PrioritySignal::Level(PriorityLevel::Medium) => 1.0,
        PrioritySignal::Level(PriorityLevel::Low) => 2.0,
        PrioritySignal::RunFirst(false) | PrioritySignal::Absent => f64::INFINITY,
    }
}

/// Stable sort by `(score, original position)`.
pub fn schedule(mut operations: Vec<TransferOperation>) -> Vec<TransferOperation> {
    operations.sort_by(|a, b| {
        priority_score(a.priority)
            .total_cmp(&priority_score(b.priority))
            .then(a.position.cmp(&b.position))
    });
    operations
}
