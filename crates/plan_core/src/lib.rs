//! `plan_core` — compiles liquid-handling transfer tables into a robot
//! protocol.
//!
//! No IO, no network. A pass is a pure function of the three input tables and
//! the configuration.

mod chunk;
mod compiler;
mod config;
mod deck;
pub mod emit;
mod error;
mod geometry;
mod inventory;
mod mix;
pub mod normalize;
mod rig;
mod schedule;
mod table;
mod tools;
mod types;

pub use chunk::{chunk_volumes, round2, MIN_CHUNK_UL};
pub use compiler::{compile_protocol, CompiledPlan, Compiler, GeneratedProtocol};
pub use config::CompilerConfig;
pub use deck::{Deck, LabwareEntry, LabwareKind, VesselSlot};
pub use emit::render_protocol;
pub use error::{ErrorCategory, PlanError};
pub use geometry::{aspirate_depth_mm, cross_section_cm2, withdraw, Withdrawal};
pub use inventory::Inventory;
pub use mix::{retention_after_mix, MixPlan, Retention};
pub use rig::{ToolMount, ToolRig};
pub use schedule::{priority_score, schedule};
pub use table::RecordTable;
pub use tools::{next_source_for_class, ToolLifecycle};
pub use types::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
