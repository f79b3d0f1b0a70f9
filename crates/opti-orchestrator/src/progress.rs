//! Incremental aggregation of solver progress events into per-run
//! snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use opti_model::{RunDetails, RunLogEntry};
use opti_store::Store;
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Folds progress events into one [`RunDetails`] snapshot per run and
/// persists each accepted fold.
///
/// Snapshots are opened when a backend job is created for the run and
/// closed when the run settles; a closed snapshot stays readable through
/// the store but accepts no further events.
pub struct ProgressAggregator {
    details: Arc<dyn Store<RunDetails>>,
    open: Mutex<HashMap<String, RunDetails>>,
}

impl ProgressAggregator {
    pub fn new(details: Arc<dyn Store<RunDetails>>) -> Self {
        Self {
            details,
            open: Mutex::new(HashMap::new()),
        }
    }

    fn lock_open(&self) -> MutexGuard<'_, HashMap<String, RunDetails>> {
        self.open.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start aggregating for a run. Idempotent: an already open snapshot is
    /// kept, and a previously persisted snapshot is reloaded so that
    /// duplicate events from before a restart are still rejected.
    pub fn open(&self, run_id: &str) -> OrchestratorResult<RunDetails> {
        if run_id.is_empty() {
            return Err(OrchestratorError::EmptyRunId);
        }

        let mut open = self.lock_open();
        if let Some(details) = open.get(run_id) {
            return Ok(details.clone());
        }

        let details = match self.find_persisted(run_id)? {
            Some(details) => details,
            None => self.details.put(RunDetails::new(run_id))?,
        };
        debug!(run_id, entries = details.entries.len(), "opened progress snapshot");
        open.insert(run_id.to_string(), details.clone());
        Ok(details)
    }

    /// Fold one event into the run's snapshot and persist the result.
    /// Returns `false` when the event is a duplicate (same event time as an
    /// already folded entry) or the snapshot is not open.
    pub fn append(&self, run_id: &str, entry: RunLogEntry) -> OrchestratorResult<bool> {
        let mut open = self.lock_open();
        let details = match open.get_mut(run_id) {
            Some(details) => details,
            None => {
                debug!(run_id, "dropping progress event for closed snapshot");
                return Ok(false);
            }
        };

        if !details.add_entry(entry) {
            return Ok(false);
        }

        let stored = self.details.put(details.clone())?;
        *details = stored;
        Ok(true)
    }

    /// Current snapshot for a run, whether open or already closed.
    pub fn snapshot(&self, run_id: &str) -> OrchestratorResult<Option<RunDetails>> {
        if let Some(details) = self.lock_open().get(run_id) {
            return Ok(Some(details.clone()));
        }
        self.find_persisted(run_id)
    }

    /// Stop aggregating for a run. The persisted snapshot remains readable.
    pub fn close(&self, run_id: &str) {
        if self.lock_open().remove(run_id).is_some() {
            debug!(run_id, "closed progress snapshot");
        }
    }

    fn find_persisted(&self, run_id: &str) -> OrchestratorResult<Option<RunDetails>> {
        let all = self.details.query_all()?;
        Ok(all.into_iter().find(|d| d.run_id == run_id))
    }
}
