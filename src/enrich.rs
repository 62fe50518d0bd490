//! The seam for function-kind actions whose value is decided per record by an
//! outside service (for example an AI categorizer).
//!
//! The engine only routes suggestions into the lock-aware write path. It never
//! trusts a suggestion for a closed column: values outside the action's
//! options are dropped before writing.

use thiserror::Error;

use crate::store::{RecordId, RecordSnapshot};
use crate::types::{Column, SelectOption, Value};

/// Supplies per-record values for enrichment actions.
///
/// Implementations must be thread-safe, as a registry may be shared between
/// background jobs.
pub trait EnrichmentProvider: Send + Sync {
    /// Suggest a value for some or all of `request.records`. Records left
    /// out are not written.
    ///
    /// # Errors
    ///
    /// [`ProviderError`] when the provider cannot answer. The executor
    /// propagates it unchanged.
    fn suggest(&self, request: &EnrichmentRequest<'_>) -> Result<Vec<Suggestion>, ProviderError>;
}

/// What the provider is asked to decide.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentRequest<'a> {
    pub action_type: &'a str,
    /// The column the suggestions will be written to.
    pub column: Column,
    /// The action's opaque value, passed through as an instruction.
    pub directive: &'a Value,
    /// Matched records whose column is not locked.
    pub records: &'a [RecordSnapshot],
    /// The closed vocabulary for the column, if it has one.
    pub options: Option<&'a [SelectOption]>,
}

/// A value proposed for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub record: RecordId,
    pub value: Value,
}

impl Suggestion {
    #[must_use]
    pub fn new(record: RecordId, value: impl Into<Value>) -> Self {
        Self {
            record,
            value: value.into(),
        }
    }
}

/// Failure of an [`EnrichmentProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("enrichment provider unavailable: {0}")]
    Unavailable(String),

    #[error("enrichment provider rejected the request: {0}")]
    Rejected(String),
}
