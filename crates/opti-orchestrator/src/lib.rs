//! opti-orchestrator: the run orchestration core.
//!
//! A run is created against a template (itself created against a model),
//! resolved to a complete parameter set, admitted to a FIFO queue, and
//! dispatched to a remote solver backend through the [`JobBackend`] seam.
//! Progress events flow into the [`ProgressAggregator`]; lifecycle
//! transitions flow through the [`RunRegistry`] state machine.
//!
//! Nothing in this crate blocks on network I/O; talking to the remote
//! backend is the job collaborator's responsibility.

pub mod error;
pub mod job;
pub mod progress;
pub mod registry;
pub mod service;

pub use error::{OrchestratorError, OrchestratorResult};
pub use job::{JobArtifact, JobBackend};
pub use progress::ProgressAggregator;
pub use registry::{AbortTier, RunRegistry};
pub use service::{RunDraft, RunService};
