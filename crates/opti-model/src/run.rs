//! Run entity and its lifecycle states.

use serde::{Deserialize, Serialize};

use crate::parameter::Parameter;

/// Gap value used before a solver has reported anything better.
pub const DEFAULT_GAP: f64 = 1.0;

/// Lifecycle state of a run.
///
/// The happy path is `NEW -> QUEUED -> CREATE_JOB -> PROCESSING ->
/// COLLECTING_RESULTS -> COMPLETED`. `ABORTING` is transitional, `RESUME`
/// is entered for non-terminal runs on orchestrator restart, and
/// `COMPLETED`/`FAILED`/`ABORTED`/`INVALID` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    New,
    Queued,
    CreateJob,
    Processing,
    CollectingResults,
    Completed,
    Failed,
    Aborted,
    Invalid,
    Aborting,
    Resume,
}

impl RunStatus {
    /// Terminal states: no further transition is expected.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Aborted | RunStatus::Invalid
        )
    }

    /// States in which an abort request is already resolved.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Aborted | RunStatus::Failed
        )
    }
}

/// Status reported by the remote solver backend for a submitted job.
/// Informational only; the run lifecycle is tracked by [`RunStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created,
    Submitted,
    Running,
    Processed,
    Completed,
    Interrupt,
    Exception,
    Failed,
}

/// One concrete submission created against a template, carrying any
/// free-parameter overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    pub template_id: String,
    pub model_id: String,
    #[serde(default)]
    pub data_set_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub job_status: Option<JobStatus>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub solve_status: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub min_gap: f64,
    /// Maximum solver wall time, in milliseconds.
    #[serde(default)]
    pub max_run_time: i64,
    pub final_gap: f64,
    /// Wall time consumed so far, in milliseconds.
    #[serde(default)]
    pub run_time: i64,
    /// Creation time, epoch milliseconds. Stamped by the registry.
    #[serde(default)]
    pub start_time: i64,
}

impl Run {
    pub fn new(template_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            revision: 0,
            template_id: template_id.into(),
            model_id: model_id.into(),
            data_set_id: None,
            label: None,
            description: None,
            status: RunStatus::New,
            job_status: None,
            job_id: None,
            solve_status: None,
            parameters: Vec::new(),
            min_gap: DEFAULT_GAP,
            max_run_time: 0,
            final_gap: DEFAULT_GAP,
            run_time: 0,
            start_time: 0,
        }
    }

    /// Look up a run parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        for status in [
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Aborted,
            RunStatus::Invalid,
        ] {
            assert!(status.is_terminal());
        }
        for status in [
            RunStatus::New,
            RunStatus::Queued,
            RunStatus::CreateJob,
            RunStatus::Processing,
            RunStatus::CollectingResults,
            RunStatus::Aborting,
            RunStatus::Resume,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn invalid_is_terminal_but_not_settled() {
        assert!(RunStatus::Invalid.is_terminal());
        assert!(!RunStatus::Invalid.is_settled());
    }

    #[test]
    fn status_wire_names_are_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunStatus::CollectingResults).unwrap(),
            "\"COLLECTING_RESULTS\""
        );
        assert_eq!(
            serde_json::to_string(&RunStatus::CreateJob).unwrap(),
            "\"CREATE_JOB\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Interrupt).unwrap(),
            "\"INTERRUPT\""
        );
    }
}
