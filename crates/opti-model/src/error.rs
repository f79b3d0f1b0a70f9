use opti_core::ValueError;
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Resolver and entity validation errors.
///
/// All variants are synchronous and non-retryable, and identify the
/// offending parameter or entity so that callers can map them to
/// client-facing responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{context}: expected id '{expected}', found '{found}'")]
    ReferenceMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("parameter '{name}' is a duplicate")]
    DuplicateParameter { name: String },

    #[error("parameter '{name}' is not defined here")]
    UnknownParameter { name: String },

    #[error("parameter '{name}' is fixed and cannot be overridden")]
    ImmutableParameter { name: String },

    #[error("parameter '{name}' has an incompatible value")]
    ConstraintViolation {
        name: String,
        #[source]
        source: ValueError,
    },

    #[error("parameter name cannot be empty")]
    EmptyName,
}
