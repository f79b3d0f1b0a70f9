//! Document and store traits.

use opti_model::{Model, Run, RunDetails, Template};

use crate::error::StoreResult;

/// A persistable entity: a string identity plus a revision token used for
/// optimistic concurrency.
pub trait Document: Clone {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn revision(&self) -> u64;
    fn set_revision(&mut self, revision: u64);
}

macro_rules! impl_document {
    ($($ty:ty),+ $(,)?) => {
        $(impl Document for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn revision(&self) -> u64 {
                self.revision
            }

            fn set_revision(&mut self, revision: u64) {
                self.revision = revision;
            }
        })+
    };
}

impl_document!(Model, Template, Run, RunDetails);

/// CRUD access to one document collection.
///
/// `put` returns the stored copy (with assigned id and bumped revision) and
/// fails with [`crate::StoreError::Conflict`] when the incoming revision
/// does not match the last stored one.
pub trait Store<T: Document>: Send + Sync {
    fn get(&self, id: &str) -> StoreResult<T>;
    fn put(&self, entity: T) -> StoreResult<T>;
    fn delete(&self, id: &str) -> StoreResult<bool>;
    fn query_all(&self) -> StoreResult<Vec<T>>;
}
