//! Mutable liquid inventory owned by one compilation pass.

use serde::{Deserialize, Serialize};

use crate::{StockEntry, VesselKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    entries: Vec<StockEntry>,
}

impl Inventory {
    pub fn new(entries: Vec<StockEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.volume_ul = e.volume_ul.max(0.0);
                e
            })
            .collect();
        Self { entries }
    }

    /// Matches by `(slot, well)`; failing that, by a stock name equal to the
    /// well identifier (older inventories named stocks after their wells).
    pub fn find(&self, key: &VesselKey) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.key == *key)
            .or_else(|| self.entries.iter().position(|e| e.name.trim() == key.well))
    }

    pub fn get(&self, key: &VesselKey) -> Option<&StockEntry> {
        self.find(key).map(|i| &self.entries[i])
    }

    pub fn volume_ul(&self, key: &VesselKey) -> Option<f64> {
        self.get(key).map(|e| e.volume_ul)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut StockEntry {
        &mut self.entries[index]
    }

    /// Registers a deposit so the destination can act as a later source.
    ///
    /// Only an exact `(slot, well)` match is incremented here; a fresh entry is
    /// named `slot:well`.
    pub fn promote(&mut self, destination: &VesselKey, volume_ul: f64) {
        let added = volume_ul.max(0.0);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == *destination) {
            entry.volume_ul += added;
            return;
        }
        self.entries.push(StockEntry {
            name: destination.to_string(),
            key: destination.clone(),
            volume_ul: added,
        });
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
