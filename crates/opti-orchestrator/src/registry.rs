//! Run registry: persisted run records, the FIFO admission queue, and the
//! run status state machine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use opti_model::{JobStatus, Run, RunStatus};
use opti_store::{Store, StoreError};
use tracing::{debug, warn};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Outcome of the tiered abort in [`RunRegistry::begin_abort`]. The tiers
/// are decided and applied under one lock acquisition.
#[derive(Debug)]
pub enum AbortTier {
    /// No run with that id exists.
    Unknown,
    /// The run had already settled; nothing changed.
    Settled,
    /// The run was still queued; it has been removed and settled as
    /// `ABORTED`.
    Dequeued(Run),
    /// The run is past the queue. It has been flipped to `ABORTING`; the
    /// backend job still needs cancelling and the abort finalizing.
    InFlight(Run),
}

/// Owns every run record until it reaches a terminal state and drives the
/// lifecycle state machine.
///
/// Two mechanisms keep transitions consistent. Operations that read and
/// write in one step (`abort`, `begin_abort`, `complete`, `resume_runs`)
/// take the queue lock around the whole read-decide-write, so they are
/// linearizable with `enqueue` and `dequeue_next`. The setters instead
/// write with the revision of the `Run` copy the caller decided on, so a
/// decision made from a stale read fails with a store conflict rather than
/// overwriting a concurrent transition.
pub struct RunRegistry {
    runs: Arc<dyn Store<Run>>,
    queue: Mutex<VecDeque<String>>,
}

impl RunRegistry {
    pub fn new(runs: Arc<dyn Store<Run>>) -> Self {
        Self {
            runs,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_id(run_id: &str) -> OrchestratorResult<()> {
        if run_id.is_empty() {
            return Err(OrchestratorError::EmptyRunId);
        }
        Ok(())
    }

    /// Persist a new run with a fresh identity, stamped creation time and
    /// `NEW` status, returning the stored copy.
    pub fn create_run(&self, mut run: Run) -> OrchestratorResult<Run> {
        run.id = String::new();
        run.revision = 0;
        run.status = RunStatus::New;
        run.start_time = chrono::Utc::now().timestamp_millis();

        let stored = self.runs.put(run)?;
        debug!(run_id = %stored.id, "created run");
        Ok(stored)
    }

    pub fn get_run(&self, run_id: &str) -> OrchestratorResult<Run> {
        Self::require_id(run_id)?;
        Ok(self.runs.get(run_id)?)
    }

    /// Admit a run id to the FIFO queue. Returns `false` when the id is
    /// already queued. Queue membership is independent of persisted status.
    pub fn enqueue(&self, run_id: &str) -> OrchestratorResult<bool> {
        Self::require_id(run_id)?;
        let mut queue = self.lock_queue();
        if queue.iter().any(|id| id == run_id) {
            return Ok(false);
        }
        queue.push_back(run_id.to_string());
        Ok(true)
    }

    /// Pop the oldest queued run id, or `None` when the queue is empty.
    pub fn dequeue_next(&self) -> Option<String> {
        self.lock_queue().pop_front()
    }

    /// Snapshot of the queued run ids in admission order.
    pub fn queued(&self) -> Vec<String> {
        self.lock_queue().iter().cloned().collect()
    }

    /// Abort a run, tiered and idempotent:
    /// - unknown id: `false`;
    /// - already settled (`COMPLETED`/`ABORTED`/`FAILED`): `true`, no
    ///   change;
    /// - still queued: removed from the queue, status set to `ABORTED`,
    ///   `true`;
    /// - in flight on the backend: `false`; cancelling the backend job is
    ///   the job collaborator's responsibility.
    pub fn abort(&self, run_id: &str) -> OrchestratorResult<bool> {
        Self::require_id(run_id)?;
        let mut queue = self.lock_queue();

        let run = match self.runs.get(run_id) {
            Ok(run) => run,
            Err(StoreError::NotFound { .. }) => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        if run.status.is_settled() {
            return Ok(true);
        }

        if let Some(position) = queue.iter().position(|id| id == run_id) {
            queue.remove(position);
            self.persist_status(run, RunStatus::Aborted)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// The tiered abort, decided and applied atomically: unknown and
    /// settled runs are reported as such, a queued run is settled in
    /// place, and an in-flight run is flipped to `ABORTING` before the
    /// lock is released, so a run that completes concurrently can never be
    /// downgraded afterwards.
    pub fn begin_abort(&self, run_id: &str) -> OrchestratorResult<AbortTier> {
        Self::require_id(run_id)?;
        let mut queue = self.lock_queue();

        let run = match self.runs.get(run_id) {
            Ok(run) => run,
            Err(StoreError::NotFound { .. }) => return Ok(AbortTier::Unknown),
            Err(err) => return Err(err.into()),
        };

        if run.status.is_settled() {
            return Ok(AbortTier::Settled);
        }

        if let Some(position) = queue.iter().position(|id| id == run_id) {
            queue.remove(position);
            let run = self.persist_status(run, RunStatus::Aborted)?;
            return Ok(AbortTier::Dequeued(run));
        }

        let run = self.persist_status(run, RunStatus::Aborting)?;
        Ok(AbortTier::InFlight(run))
    }

    /// Mark a run completed, but only from `COLLECTING_RESULTS`; any other
    /// current status is left unchanged so that a more specific terminal or
    /// transitional status is never downgraded.
    pub fn complete(&self, run_id: &str) -> OrchestratorResult<()> {
        Self::require_id(run_id)?;
        let _queue = self.lock_queue();

        let run = self.runs.get(run_id)?;
        if run.status == RunStatus::CollectingResults {
            self.persist_status(run, RunStatus::Completed)?;
        }
        Ok(())
    }

    /// Detach a run from its backend job, clearing `job_id` and
    /// `job_status`. Used when resuming after a restart, before
    /// re-attaching to a backend job.
    pub fn reset(&self, run_id: &str) -> OrchestratorResult<Run> {
        Self::require_id(run_id)?;
        let _queue = self.lock_queue();

        let mut run = self.runs.get(run_id)?;
        run.job_id = None;
        run.job_status = None;
        debug!(run_id = %run.id, "detached run from backend job");
        Ok(self.runs.put(run)?)
    }

    /// Persist a status change decided on `run`. The write carries the
    /// revision of `run`, so a copy made stale by a concurrent transition
    /// fails with a store conflict instead of overwriting it.
    pub fn set_run_status(&self, run: Run, status: RunStatus) -> OrchestratorResult<Run> {
        Self::require_id(&run.id)?;
        let _queue = self.lock_queue();
        self.persist_status(run, status)
    }

    /// Persist a backend job status decided on `run`; revision-checked
    /// like [`RunRegistry::set_run_status`].
    pub fn set_job_status(&self, mut run: Run, status: JobStatus) -> OrchestratorResult<Run> {
        Self::require_id(&run.id)?;
        let _queue = self.lock_queue();
        run.job_status = Some(status);
        debug!(run_id = %run.id, job_status = ?status, "setting job status");
        Ok(self.runs.put(run)?)
    }

    /// Record the backend job id assigned to a run; revision-checked like
    /// [`RunRegistry::set_run_status`].
    pub fn set_job_id(&self, mut run: Run, job_id: impl Into<String>) -> OrchestratorResult<Run> {
        Self::require_id(&run.id)?;
        let _queue = self.lock_queue();
        run.job_id = Some(job_id.into());
        Ok(self.runs.put(run)?)
    }

    /// Persist field changes on an existing run. Status changes should go
    /// through the status operations instead.
    pub fn update_run(&self, run: Run) -> OrchestratorResult<Run> {
        Self::require_id(&run.id)?;
        let _queue = self.lock_queue();
        Ok(self.runs.put(run)?)
    }

    /// Remove a run record. Returns whether a record existed.
    pub fn delete_run(&self, run_id: &str) -> OrchestratorResult<bool> {
        Self::require_id(run_id)?;
        Ok(self.runs.delete(run_id)?)
    }

    /// Linear lookup by backend job id. An empty job id always misses.
    pub fn find_by_job_id(&self, job_id: &str) -> OrchestratorResult<Option<Run>> {
        if job_id.is_empty() {
            return Ok(None);
        }
        let runs = self.runs.query_all()?;
        Ok(runs
            .into_iter()
            .find(|run| run.job_id.as_deref() == Some(job_id)))
    }

    pub fn list_runs(&self) -> OrchestratorResult<Vec<Run>> {
        Ok(self.runs.query_all()?)
    }

    /// Recover after an orchestrator restart.
    ///
    /// A run caught mid-abort is finalized to `ABORTED` (its job status to
    /// `INTERRUPT` when one exists). Every other non-terminal run is
    /// re-admitted to the queue and marked `RESUME`, to be reconciled
    /// against the remote backend by the dispatcher. Returns the number of
    /// re-admitted runs.
    pub fn resume_runs(&self) -> OrchestratorResult<usize> {
        let runs = self.runs.query_all()?;
        let mut resumed = 0;

        for run in runs {
            if run.status == RunStatus::Aborting {
                warn!(run_id = %run.id, "finalizing abort left over from previous instance");
                let had_job_status = run.job_status.is_some();
                let finalized = self.persist_locked_status(&run.id, RunStatus::Aborted)?;
                if had_job_status {
                    self.set_job_status(finalized, JobStatus::Interrupt)?;
                }
            } else if !run.status.is_terminal() {
                if self.enqueue(&run.id)? {
                    self.persist_locked_status(&run.id, RunStatus::Resume)?;
                    resumed += 1;
                }
            }
        }

        Ok(resumed)
    }

    fn persist_locked_status(&self, run_id: &str, status: RunStatus) -> OrchestratorResult<Run> {
        let _queue = self.lock_queue();
        let run = self.runs.get(run_id)?;
        self.persist_status(run, status)
    }

    /// Write a status change. Only called with the queue lock held.
    fn persist_status(&self, mut run: Run, status: RunStatus) -> OrchestratorResult<Run> {
        run.status = status;
        debug!(run_id = %run.id, status = ?status, "setting run status");
        Ok(self.runs.put(run)?)
    }
}
