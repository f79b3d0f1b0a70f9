//! Template entity: a reusable preset of parameter values for one model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::parameter::{Parameter, TemplateParameter};
use crate::run::Run;

/// A named preset of parameter values (some fixed, some free) prepared for
/// a specific model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    pub model_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
}

impl Template {
    pub fn new(id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 0,
            model_id: model_id.into(),
            label: None,
            description: None,
            parameters: Vec::new(),
        }
    }

    /// Look up a template parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&TemplateParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check that `run` belongs to this template and only carries
    /// overridable parameters.
    ///
    /// Rejects a run whose template or model id does not chain to this
    /// template, a run with duplicate parameter names, a run parameter not
    /// declared here, and a run parameter whose template counterpart is
    /// fixed.
    pub fn validate_run(&self, run: &Run) -> ValidationResult<()> {
        if run.template_id != self.id {
            return Err(ValidationError::ReferenceMismatch {
                context: "run does not belong to this template",
                expected: self.id.clone(),
                found: run.template_id.clone(),
            });
        }

        if run.model_id != self.model_id {
            return Err(ValidationError::ReferenceMismatch {
                context: "run does not belong to this template's model",
                expected: self.model_id.clone(),
                found: run.model_id.clone(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for parameter in &run.parameters {
            let name = parameter.name.as_str();
            if name.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateParameter {
                    name: name.to_string(),
                });
            }

            let declared = self.parameter(name).ok_or_else(|| {
                ValidationError::UnknownParameter {
                    name: name.to_string(),
                }
            })?;

            if declared.fixed {
                return Err(ValidationError::ImmutableParameter {
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validate `run` and return a copy carrying every template parameter
    /// the run did not specify.
    ///
    /// Fixed and free template values alike fill run gaps: fixed constrains
    /// overriding, not default propagation.
    pub fn populate_run(&self, run: &Run) -> ValidationResult<Run> {
        self.validate_run(run)?;

        let mut populated = run.clone();
        for declared in &self.parameters {
            if populated.parameter(&declared.name).is_none() {
                populated
                    .parameters
                    .push(Parameter::new(declared.name.clone(), declared.value.clone()));
            }
        }

        Ok(populated)
    }
}
