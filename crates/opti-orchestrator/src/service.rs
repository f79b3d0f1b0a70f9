//! High-level run workflow: creation, admission, dispatch, progress and
//! settlement.

use std::sync::Arc;

use opti_model::{resolve, JobStatus, Model, Parameter, Run, RunDetails, RunLogEntry, RunStatus, Template};
use opti_store::{Store, StoreError};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::job::{JobArtifact, JobBackend};
use crate::progress::ProgressAggregator;
use crate::registry::{AbortTier, RunRegistry};

/// Caller-supplied fields for a new run. Everything else is resolved from
/// the template and model or stamped by the registry.
#[derive(Debug, Clone, Default)]
pub struct RunDraft {
    pub data_set_id: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Overrides for the template's free parameters.
    pub parameters: Vec<Parameter>,
    pub min_gap: Option<f64>,
    /// Maximum solver wall time, in milliseconds.
    pub max_run_time: Option<i64>,
}

/// Front door of the orchestration core. Wires the resolver, the registry
/// state machine, the progress aggregator and the backend seam into one
/// workflow.
///
/// Every composite here reads a run, decides against a backend, then
/// writes through the registry with the revision of the copy it read; when
/// a concurrent transition won in between, the write fails the revision
/// check and the winner's state is left in place.
pub struct RunService {
    models: Arc<dyn Store<Model>>,
    templates: Arc<dyn Store<Template>>,
    registry: RunRegistry,
    progress: ProgressAggregator,
}

impl RunService {
    pub fn new(
        models: Arc<dyn Store<Model>>,
        templates: Arc<dyn Store<Template>>,
        registry: RunRegistry,
        progress: ProgressAggregator,
    ) -> Self {
        Self {
            models,
            templates,
            registry,
            progress,
        }
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    /// Create a run against a template: fetch the template and its model,
    /// resolve the full parameter set, and persist the run as `NEW`.
    ///
    /// Fails with a validation error when an override targets an
    /// undeclared or fixed parameter or violates the model's constraints;
    /// nothing is persisted in that case.
    pub fn create_run(&self, template_id: &str, draft: RunDraft) -> OrchestratorResult<Run> {
        let template = self.templates.get(template_id).map_err(|err| match err {
            StoreError::NotFound { id } => OrchestratorError::NotFound {
                what: "template",
                id,
            },
            other => other.into(),
        })?;
        let model = self.models.get(&template.model_id).map_err(|err| match err {
            StoreError::NotFound { id } => OrchestratorError::NotFound { what: "model", id },
            other => other.into(),
        })?;

        let mut run = Run::new(&template.id, &model.id);
        run.data_set_id = draft.data_set_id;
        run.label = draft.label;
        run.description = draft.description;
        run.parameters = draft.parameters;
        if let Some(min_gap) = draft.min_gap {
            run.min_gap = min_gap;
        }
        if let Some(max_run_time) = draft.max_run_time {
            run.max_run_time = max_run_time;
        }

        let resolved = resolve(&model, &template, &run)?;
        let stored = self.registry.create_run(resolved)?;
        info!(run_id = %stored.id, template_id, "created run");
        Ok(stored)
    }

    /// Admit a run to the dispatch queue. First admission moves the run to
    /// `QUEUED`; re-admitting an already queued run changes nothing and
    /// returns `false`.
    pub fn enqueue(&self, run_id: &str) -> OrchestratorResult<bool> {
        let added = self.registry.enqueue(run_id)?;
        if added {
            let run = self.registry.get_run(run_id)?;
            self.registry.set_run_status(run, RunStatus::Queued)?;
        }
        Ok(added)
    }

    /// Abort a run that has not reached the backend yet. In-flight runs
    /// need [`RunService::abort_with_backend`].
    pub fn abort(&self, run_id: &str) -> OrchestratorResult<bool> {
        Ok(self.registry.abort(run_id)?)
    }

    /// Abort a run wherever it is, cancelling its backend job when one is
    /// in flight. Idempotent like [`RunRegistry::abort`]; an unknown id
    /// returns `false`.
    ///
    /// The settled-check and the `ABORTING` flip happen atomically in the
    /// registry, so a run that completes concurrently is never downgraded.
    pub fn abort_with_backend(
        &self,
        backend: &dyn JobBackend,
        run_id: &str,
    ) -> OrchestratorResult<bool> {
        match self.registry.begin_abort(run_id)? {
            AbortTier::Unknown => Ok(false),
            AbortTier::Settled => Ok(true),
            AbortTier::Dequeued(_) => {
                self.progress.close(run_id);
                Ok(true)
            }
            AbortTier::InFlight(mut run) => {
                if let Some(job_id) = run.job_id.clone() {
                    if !backend.abort_job(&job_id)? {
                        warn!(run_id, %job_id, "backend refused abort, finalizing anyway");
                    }
                    run = self.registry.set_job_status(run, JobStatus::Interrupt)?;
                }
                self.registry.set_run_status(run, RunStatus::Aborted)?;
                self.progress.close(run_id);
                Ok(true)
            }
        }
    }

    /// Take the oldest queued run and drive it onto the backend, returning
    /// the updated run, or `None` when nothing is queued.
    ///
    /// Runs that settled while queued are skipped. A `RESUME` run with a
    /// surviving backend job is reconciled against the backend instead of
    /// resubmitted.
    pub fn dispatch_next(&self, backend: &dyn JobBackend) -> OrchestratorResult<Option<Run>> {
        while let Some(run_id) = self.registry.dequeue_next() {
            let mut run = self.registry.get_run(&run_id)?;
            if run.status.is_terminal() {
                debug!(%run_id, status = ?run.status, "skipping settled run in queue");
                continue;
            }

            if run.status == RunStatus::Resume {
                match self.reconcile_resumed(backend, run)? {
                    Reconciled::Attached(run) => return Ok(Some(run)),
                    Reconciled::Left => continue,
                    Reconciled::Resubmit(reset) => {
                        run = reset;
                    }
                }
            }

            run = match self.write_status(run, RunStatus::CreateJob)? {
                StatusWrite::Applied(run) => run,
                StatusWrite::Raced(current) => {
                    debug!(%run_id, status = ?current.status, "run was taken over while dispatching");
                    continue;
                }
            };

            let job_id = match backend.submit_job(&run) {
                Ok(job_id) => job_id,
                Err(err) => {
                    self.write_status(run, RunStatus::Failed)?;
                    return Err(err);
                }
            };
            run = self.registry.set_job_id(run, job_id)?;
            run = self.registry.set_job_status(run, JobStatus::Submitted)?;
            self.progress.open(&run_id)?;
            let run = self.registry.set_run_status(run, RunStatus::Processing)?;
            info!(%run_id, job_id = run.job_id.as_deref().unwrap_or(""), "dispatched run");
            return Ok(Some(run));
        }
        Ok(None)
    }

    /// Poll the backend for a dispatched run and fold the answer into the
    /// lifecycle: a finished job moves the run to `COLLECTING_RESULTS`, a
    /// failed one to `FAILED`, an interrupted one to `ABORTED`.
    ///
    /// Returns the current run when a concurrent transition settled it
    /// first; the poll result is discarded in that case.
    pub fn poll_job(&self, backend: &dyn JobBackend, run_id: &str) -> OrchestratorResult<Run> {
        let run = self.registry.get_run(run_id)?;
        if run.status.is_terminal() {
            return Ok(run);
        }
        let job_id = run
            .job_id
            .clone()
            .ok_or_else(|| OrchestratorError::NoJobAttached {
                run_id: run_id.to_string(),
            })?;

        let job_status = backend.poll_status(&job_id)?;
        let run = match self.write_job_status(run, job_status)? {
            StatusWrite::Applied(run) => run,
            StatusWrite::Raced(current) => return Ok(current),
        };

        match job_status {
            JobStatus::Processed | JobStatus::Completed
                if run.status == RunStatus::Processing =>
            {
                match self.write_status(run, RunStatus::CollectingResults)? {
                    StatusWrite::Applied(run) | StatusWrite::Raced(run) => Ok(run),
                }
            }
            JobStatus::Exception | JobStatus::Failed => {
                self.progress.close(run_id);
                match self.write_status(run, RunStatus::Failed)? {
                    StatusWrite::Applied(run) | StatusWrite::Raced(run) => Ok(run),
                }
            }
            JobStatus::Interrupt => {
                self.progress.close(run_id);
                match self.write_status(run, RunStatus::Aborted)? {
                    StatusWrite::Applied(run) | StatusWrite::Raced(run) => Ok(run),
                }
            }
            _ => Ok(run),
        }
    }

    /// Fetch the result artifact for a run in `COLLECTING_RESULTS` and
    /// settle it: the last reported gap and the elapsed wall time are
    /// folded into the run before it becomes `COMPLETED`.
    pub fn collect_results(
        &self,
        backend: &dyn JobBackend,
        run_id: &str,
    ) -> OrchestratorResult<JobArtifact> {
        let run = self.registry.get_run(run_id)?;
        let job_id = run
            .job_id
            .as_deref()
            .ok_or_else(|| OrchestratorError::NoJobAttached {
                run_id: run_id.to_string(),
            })?;

        let artifact = backend.fetch_result(job_id)?;
        self.complete_run(run_id)?;
        Ok(artifact)
    }

    /// Settle a run from `COLLECTING_RESULTS` to `COMPLETED`; any other
    /// current status is left unchanged.
    pub fn complete_run(&self, run_id: &str) -> OrchestratorResult<()> {
        let run = self.registry.get_run(run_id)?;
        if run.status != RunStatus::CollectingResults {
            return Ok(());
        }

        let mut run = run;
        if let Some(details) = self.progress.snapshot(run_id)? {
            if let Some(gap) = details.gap {
                run.final_gap = gap;
            }
        }
        run.run_time = chrono::Utc::now().timestamp_millis() - run.start_time;
        self.registry.update_run(run)?;

        self.registry.complete(run_id)?;
        self.progress.close(run_id);
        info!(run_id, "run completed");
        Ok(())
    }

    /// Fold one solver progress event into the run's snapshot. Duplicate
    /// events and events for runs without an open snapshot are dropped.
    pub fn append_progress(&self, run_id: &str, entry: RunLogEntry) -> OrchestratorResult<bool> {
        self.progress.append(run_id, entry)
    }

    pub fn get_run(&self, run_id: &str) -> OrchestratorResult<Run> {
        self.registry.get_run(run_id)
    }

    pub fn get_run_details(&self, run_id: &str) -> OrchestratorResult<Option<RunDetails>> {
        self.progress.snapshot(run_id)
    }

    /// All runs, optionally filtered by template.
    pub fn list_runs(&self, template_id: Option<&str>) -> OrchestratorResult<Vec<Run>> {
        let mut runs = self.registry.list_runs()?;
        if let Some(template_id) = template_id {
            runs.retain(|run| run.template_id == template_id);
        }
        Ok(runs)
    }

    /// Recover after a restart; see [`RunRegistry::resume_runs`].
    pub fn resume_runs(&self) -> OrchestratorResult<usize> {
        self.registry.resume_runs()
    }

    /// Revision-checked status write; a lost race yields the winner's
    /// current copy instead of an error.
    fn write_status(&self, run: Run, status: RunStatus) -> OrchestratorResult<StatusWrite> {
        let run_id = run.id.clone();
        match self.registry.set_run_status(run, status) {
            Ok(run) => Ok(StatusWrite::Applied(run)),
            Err(OrchestratorError::Store(StoreError::Conflict { .. })) => {
                Ok(StatusWrite::Raced(self.registry.get_run(&run_id)?))
            }
            Err(err) => Err(err),
        }
    }

    fn write_job_status(&self, run: Run, status: JobStatus) -> OrchestratorResult<StatusWrite> {
        let run_id = run.id.clone();
        match self.registry.set_job_status(run, status) {
            Ok(run) => Ok(StatusWrite::Applied(run)),
            Err(OrchestratorError::Store(StoreError::Conflict { .. })) => {
                Ok(StatusWrite::Raced(self.registry.get_run(&run_id)?))
            }
            Err(err) => Err(err),
        }
    }

    fn reconcile_resumed(
        &self,
        backend: &dyn JobBackend,
        run: Run,
    ) -> OrchestratorResult<Reconciled> {
        let Some(job_id) = run.job_id.clone() else {
            // the job was never acknowledged; resubmit from scratch
            return Ok(Reconciled::Resubmit(self.registry.reset(&run.id)?));
        };

        let run_id = run.id.clone();
        let job_status = backend.poll_status(&job_id)?;
        let run = match self.write_job_status(run, job_status)? {
            StatusWrite::Applied(run) => run,
            StatusWrite::Raced(current) => {
                debug!(%run_id, status = ?current.status, "resumed run was taken over");
                return Ok(Reconciled::Left);
            }
        };
        debug!(%run_id, %job_id, job_status = ?job_status, "reconciled resumed run");

        match job_status {
            JobStatus::Created | JobStatus::Submitted | JobStatus::Running => {
                self.progress.open(&run_id)?;
                let run = self.registry.set_run_status(run, RunStatus::Processing)?;
                Ok(Reconciled::Attached(run))
            }
            JobStatus::Processed | JobStatus::Completed => {
                self.progress.open(&run_id)?;
                let run = self
                    .registry
                    .set_run_status(run, RunStatus::CollectingResults)?;
                Ok(Reconciled::Attached(run))
            }
            JobStatus::Interrupt => {
                self.registry.set_run_status(run, RunStatus::Aborted)?;
                Ok(Reconciled::Left)
            }
            JobStatus::Exception | JobStatus::Failed => {
                self.registry.set_run_status(run, RunStatus::Failed)?;
                Ok(Reconciled::Left)
            }
        }
    }
}

enum StatusWrite {
    Applied(Run),
    /// The revision check failed; the payload is the winner's copy.
    Raced(Run),
}

enum Reconciled {
    /// The backend job survived the restart; the run is attached to it
    /// again.
    Attached(Run),
    /// The run settled or was taken over; leave it alone.
    Left,
    /// No surviving job; the run was detached and should be resubmitted.
    Resubmit(Run),
}
