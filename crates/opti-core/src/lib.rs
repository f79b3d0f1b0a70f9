//! opti-core: stable foundation for optirun.
//!
//! Contains:
//! - value (typed parameter values + range primitives)
//! - error (value-level error types)

pub mod error;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use error::{ValueError, ValueResult};
pub use value::*;
