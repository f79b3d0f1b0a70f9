//! opti-store: the persistence seam of optirun.
//!
//! Entities are persisted as documents carrying a revision token; writes
//! against a stale revision fail with a retryable conflict instead of
//! silently overwriting. The orchestration core only ever talks to the
//! [`Store`] trait; the bundled [`InMemoryStore`] backs the orchestrator in
//! tests and single-process deployments.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::{Document, Store};
