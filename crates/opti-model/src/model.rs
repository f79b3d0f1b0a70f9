//! Model entity: the optimization problem specification.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::parameter::{ModelParameter, Parameter, TemplateParameter};
use crate::run::Run;
use crate::template::Template;

/// An objective of the optimization model. A model parameter may act as a
/// configurable weight for one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Objective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
        }
    }
}

/// The optimization problem specification: declared, typed,
/// range-constrained parameters plus the objectives they may weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub default_model: bool,
    #[serde(default)]
    pub parameters: Vec<ModelParameter>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl Model {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 0,
            label: label.into(),
            description: None,
            model_version: None,
            default_model: false,
            parameters: Vec::new(),
            objectives: Vec::new(),
        }
    }

    /// Look up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ModelParameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Check one name/value pair against the declared parameter of the same
    /// name.
    pub fn validate_parameter(&self, parameter: &Parameter) -> ValidationResult<()> {
        let declared = self.parameter(&parameter.name).ok_or_else(|| {
            ValidationError::UnknownParameter {
                name: parameter.name.clone(),
            }
        })?;

        declared
            .accept_value(parameter.value.as_ref())
            .map_err(|source| ValidationError::ConstraintViolation {
                name: parameter.name.clone(),
                source,
            })
    }

    /// Check that `template` was prepared for this model: the id chain
    /// matches, parameter names are unique, and every preset value is
    /// compliant with the declared type and range.
    pub fn validate_template(&self, template: &Template) -> ValidationResult<()> {
        if template.model_id != self.id {
            return Err(ValidationError::ReferenceMismatch {
                context: "template was not prepared for this model",
                expected: self.id.clone(),
                found: template.model_id.clone(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for preset in &template.parameters {
            let name = preset.name.as_str();
            if name.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateParameter {
                    name: name.to_string(),
                });
            }

            self.validate_parameter(&Parameter::new(name, preset.value.clone()))?;
        }

        Ok(())
    }

    /// Validate `template` and return a copy covering every declared
    /// parameter: gaps are filled with fixed presets carrying the model's
    /// default value.
    pub fn populate_template(&self, template: &Template) -> ValidationResult<Template> {
        self.validate_template(template)?;

        let mut populated = template.clone();
        for declared in &self.parameters {
            if populated.parameter(declared.name()).is_none() {
                populated.parameters.push(TemplateParameter::fixed(
                    declared.name(),
                    declared.value().cloned(),
                ));
            }
        }

        Ok(populated)
    }

    /// Model-level pass over a template-populated run: every value the run
    /// carries is validated against the declared type and range, and any
    /// declared parameter still missing receives the model default.
    pub fn finalize_run(&self, mut run: Run) -> ValidationResult<Run> {
        for declared in &self.parameters {
            match run.parameter(declared.name()) {
                Some(parameter) => self.validate_parameter(parameter)?,
                None => run
                    .parameters
                    .push(Parameter::new(declared.name(), declared.value().cloned())),
            }
        }

        Ok(run)
    }
}
