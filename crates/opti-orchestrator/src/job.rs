//! Seam to the remote solver backend.

use opti_model::{JobStatus, Run};

use crate::error::OrchestratorResult;

/// Result artifact fetched from the backend after a job finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct JobArtifact {
    pub job_id: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The job collaborator: submits, polls, cancels and collects jobs on the
/// remote solver backend. Implementations own all transport details; the
/// orchestration core only signals and queries by id.
pub trait JobBackend: Send + Sync {
    /// Submit a resolved run, returning the backend job id.
    fn submit_job(&self, run: &Run) -> OrchestratorResult<String>;

    /// Request cancellation of an in-flight job. Returns whether the
    /// backend accepted the cancellation.
    fn abort_job(&self, job_id: &str) -> OrchestratorResult<bool>;

    /// Poll the backend for the current job status.
    fn poll_status(&self, job_id: &str) -> OrchestratorResult<JobStatus>;

    /// Fetch the result artifact of a finished job.
    fn fetch_result(&self, job_id: &str) -> OrchestratorResult<JobArtifact>;
}
