//! Parameter entities.
//!
//! Three tiers share the same name/value shape: a plain [`Parameter`] is a
//! free value on a run, a [`ModelParameter`] declares the type and range a
//! model accepts, and a [`TemplateParameter`] is a preset that may be fixed
//! against overriding.

use opti_core::{
    check_range, convert_to, is_compatible_with, is_in_range, ParameterType, Value, ValueError,
    ValueRange, ValueResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// A name/value pair. Equality is by name only; values play no part in
/// lookup or duplicate detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Parameter {}

/// A typed, range-constrained parameter declared by a model.
///
/// The type, range and value are kept mutually consistent: every setter
/// re-validates the other two, so no mutation order can leave the parameter
/// holding a value outside its declared type or range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameter {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(rename = "type")]
    ty: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<ValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ModelParameter {
    /// Create a declared parameter, validating the default value and range
    /// against the declared type.
    pub fn new(
        name: impl Into<String>,
        value: Option<Value>,
        ty: ParameterType,
        range: Option<ValueRange>,
    ) -> ValidationResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut parameter = Self {
            name: name.clone(),
            value: None,
            ty,
            range: None,
            objective: None,
            label: None,
            description: None,
        };

        let wrap = |source: ValueError| ValidationError::ConstraintViolation {
            name: name.clone(),
            source,
        };
        parameter.set_range(range).map_err(wrap)?;
        parameter.set_value(value).map_err(wrap)?;

        Ok(parameter)
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn param_type(&self) -> ParameterType {
        self.ty
    }

    pub fn range(&self) -> Option<&ValueRange> {
        self.range.as_ref()
    }

    pub fn objective(&self) -> Option<&str> {
        self.objective.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Change the declared type.
    ///
    /// An incompatible current value clears both value and range; a
    /// compatible one is converted (INT -> DOUBLE). Range bounds are
    /// re-validated against the new type; when they cannot be represented
    /// in it the call fails and the parameter is left unchanged.
    pub fn set_type(&mut self, ty: ParameterType) -> ValueResult<()> {
        if !is_compatible_with(ty, self.value.as_ref()) {
            self.ty = ty;
            self.value = None;
            self.range = None;
            return Ok(());
        }

        // compatibility was checked above, so the conversion cannot fail
        let value = convert_to(ty, self.value.clone()).unwrap_or(None);
        let range = check_range(ty, self.range.clone())?;

        self.ty = ty;
        self.value = value;
        self.range = range;
        Ok(())
    }

    /// Replace the allowed range.
    ///
    /// The bounds are converted to the declared type and must be ordered.
    /// A range that would exclude the current value is rejected and the
    /// stored range is left unchanged.
    pub fn set_range(&mut self, range: Option<ValueRange>) -> ValueResult<()> {
        let range = check_range(self.ty, range)?;

        if !is_in_range(range.as_ref(), self.value.as_ref()) {
            return Err(ValueError::RangeViolation {
                value: self.value.clone().unwrap_or(Value::Bool(false)),
                range: range.unwrap_or_default(),
            });
        }

        self.range = range;
        Ok(())
    }

    /// Replace the value, converting it to the declared type and checking
    /// it against the current range before committing.
    pub fn set_value(&mut self, value: Option<Value>) -> ValueResult<()> {
        let value = convert_to(self.ty, value)?;

        if !is_in_range(self.range.as_ref(), value.as_ref()) {
            return Err(ValueError::RangeViolation {
                value: value.unwrap_or(Value::Bool(false)),
                range: self.range.clone().unwrap_or_default(),
            });
        }

        self.value = value;
        Ok(())
    }

    /// Check a candidate value against the declared type and range without
    /// mutating the parameter.
    pub fn accept_value(&self, value: Option<&Value>) -> ValueResult<()> {
        let converted = convert_to(self.ty, value.cloned())?;

        if !is_in_range(self.range.as_ref(), converted.as_ref()) {
            return Err(ValueError::RangeViolation {
                value: converted.unwrap_or(Value::Bool(false)),
                range: self.range.clone().unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// A template-tier preset. A fixed parameter may not be overridden by a
/// dependent run; it still propagates as a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub fixed: bool,
}

impl TemplateParameter {
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
            fixed: false,
        }
    }

    pub fn fixed(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
            fixed: true,
        }
    }
}
