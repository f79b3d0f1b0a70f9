use thiserror::Error;

use crate::value::{ParameterType, Value, ValueRange};

pub type ValueResult<T> = Result<T, ValueError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("value {value} is not compatible with type {expected}")]
    TypeMismatch { expected: ParameterType, value: Value },

    #[error("range has inverted bounds [{lower}, {upper}]")]
    InvalidRange { lower: Value, upper: Value },

    #[error("value {value} is outside the allowed range {range}")]
    RangeViolation { value: Value, range: ValueRange },
}
