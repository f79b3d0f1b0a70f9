//! Run progress snapshot and its append-only source events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One structured progress event parsed from the remote solver's output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// Event time, epoch milliseconds. Unique within one run's log.
    pub time: i64,
    #[serde(default)]
    pub solution: bool,
    #[serde(default)]
    pub node: Option<i64>,
    #[serde(default)]
    pub nodes_left: Option<i64>,
    #[serde(default)]
    pub objective: Option<f64>,
    #[serde(default)]
    pub iinf: Option<i64>,
    #[serde(default)]
    pub best_integer: Option<f64>,
    #[serde(default)]
    pub best_bound: Option<f64>,
    #[serde(default)]
    pub total_iterations: Option<i64>,
    #[serde(default)]
    pub gap: Option<f64>,
    #[serde(default)]
    pub raw_line: Option<String>,
}

/// The single current-snapshot record per run, folded incrementally from
/// solver progress events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    pub run_id: String,
    #[serde(default)]
    pub entries: Vec<RunLogEntry>,
    #[serde(default)]
    pub best_bound: Option<f64>,
    #[serde(default)]
    pub best_integer: Option<f64>,
    #[serde(default)]
    pub gap: Option<f64>,
    /// Free-form, backend-specific attributes.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl RunDetails {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            revision: 0,
            run_id: run_id.into(),
            entries: Vec::new(),
            best_bound: None,
            best_integer: None,
            gap: None,
            attributes: HashMap::new(),
        }
    }

    /// Fold one progress event into the snapshot.
    ///
    /// An entry whose time already occurs in the log is rejected before any
    /// merging, which guards against duplicate delivery on resumed or
    /// retried log ingestion. Accepted entries are appended in arrival
    /// order, and each metric the entry reports overwrites the snapshot
    /// field: last write wins, trusting the backend's own monotonicity.
    pub fn add_entry(&mut self, entry: RunLogEntry) -> bool {
        if self.entries.iter().any(|e| e.time == entry.time) {
            return false;
        }

        if let Some(gap) = entry.gap {
            self.gap = Some(gap);
        }
        if let Some(best_integer) = entry.best_integer {
            self.best_integer = Some(best_integer);
        }
        if let Some(best_bound) = entry.best_bound {
            self.best_bound = Some(best_bound);
        }

        self.entries.push(entry);
        true
    }
}
