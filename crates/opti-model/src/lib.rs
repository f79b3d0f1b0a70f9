//! opti-model: domain entities and the three-tier parameter resolver.
//!
//! Contains:
//! - parameter (name/value pairs and their typed, range-constrained variants)
//! - model / template / run (the entity chain a submission walks)
//! - details (progress snapshot and its append-only log entries)
//! - resolver (merging model defaults, template presets and run overrides)

pub mod details;
pub mod error;
pub mod model;
pub mod parameter;
pub mod resolver;
pub mod run;
pub mod template;

pub use details::{RunDetails, RunLogEntry};
pub use error::{ValidationError, ValidationResult};
pub use model::{Model, Objective};
pub use parameter::{ModelParameter, Parameter, TemplateParameter};
pub use resolver::resolve;
pub use run::{JobStatus, Run, RunStatus};
pub use template::Template;
