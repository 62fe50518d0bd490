//! The resource-collection seam between the engine and a record store.
//!
//! A [`Collection`] is a lazily executed, owner-scoped query. Composition
//! (`join`, `restrict`, `enrichable`) only records intent and returns a new
//! value; `count`, `records`, `update_all` and `update_each` execute it.

mod memory;

use std::collections::BTreeMap;
use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::types::{Column, Predicate, Relation, Value};

pub use memory::{Enrichment, MemoryCollection, MemoryStore, MemoryStoreError};

/// Identifier of one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Identifier of the tenant (family) that owns records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// A record read out of a collection, for per-record decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub values: BTreeMap<Column, Value>,
}

impl RecordSnapshot {
    #[must_use]
    pub fn get(&self, column: Column) -> Option<&Value> {
        self.values.get(&column)
    }
}

/// Composable, lazily executed query over one domain's records.
///
/// Implementations must keep joins idempotent, express a disjunctive
/// predicate as a single clause, and perform `update_all` without loading
/// records into memory.
pub trait Collection: Clone {
    /// Make `relation`'s columns readable. Joining twice is a no-op.
    #[must_use]
    fn join(&self, relation: Relation) -> Self;

    /// Narrow to records matching `predicate`.
    #[must_use]
    fn restrict(&self, predicate: Predicate) -> Self;

    /// Narrow to records whose `column` is not attribute-locked.
    #[must_use]
    fn enrichable(&self, column: Column) -> Self;

    /// Fix membership to the records matching now, so later writes cannot
    /// move records in or out. Only record identities are materialized.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn pin(&self) -> Result<Self, StoreError>;

    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn count(&self) -> Result<usize, StoreError>;

    /// Load the matching records.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn records(&self) -> Result<Vec<RecordSnapshot>, StoreError>;

    /// Write `value` into `column` of every matching record in one bulk
    /// operation, recording `source` as the enrichment source. Returns the
    /// number of records written.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store. Records written before the
    /// failure stay written.
    fn update_all(&self, column: Column, value: &Value, source: &str) -> Result<usize, StoreError>;

    /// Write a per-record value into `column` for each `(id, value)` whose
    /// record is in this collection. Ids outside it are ignored.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn update_each(
        &self,
        column: Column,
        writes: &[(RecordId, Value)],
        source: &str,
    ) -> Result<usize, StoreError>;
}

/// A failure of the store behind a [`Collection`].
///
/// Display and `source()` are the wrapped error's own, and the original can
/// be recovered with [`StoreError::downcast_ref`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(Box<dyn Error + Send + Sync + 'static>);

impl StoreError {
    pub fn new(err: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}
