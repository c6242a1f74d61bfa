//! String-only tabular input, as handed over by whatever reads the files.

use serde::{Deserialize, Serialize};

use crate::PlanError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Builds a table from string literals. Mostly useful in tests.
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            name,
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    /// Exact (whitespace-trimmed) header match.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Case-insensitive match against an ordered list of synonyms; the first
    /// synonym present wins.
    pub fn column_ci(&self, candidates: &[&str]) -> Option<usize> {
        let lowered: Vec<String> = self
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        candidates.iter().find_map(|candidate| {
            let candidate = candidate.to_lowercase();
            lowered.iter().position(|h| *h == candidate)
        })
    }

    /// Resolves every required column or reports all missing ones at once.
    pub fn require(&self, names: &[&str]) -> Result<Vec<usize>, PlanError> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column(name) {
                Some(index) => found.push(index),
                None => missing.push((*name).to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(PlanError::MissingColumns {
                table: self.name.clone(),
                missing,
            })
        }
    }

    /// Trimmed cell contents; short rows read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", |cell| cell.trim())
    }

    pub fn header(&self, column: usize) -> &str {
        self.headers.get(column).map_or("", |h| h.trim())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
