// ─── Error ──────────────────────────────────────────────────────────────────
use crate::hooks::HookEvent;
use crate::types::TableId;
use smol_str::SmolStr;
use thiserror::Error;

/// Error raised by an observer. Nested store errors propagate through it with `?`.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("static data length mismatch: expected {expected}, got {actual}")]
    LayoutMismatch { expected: usize, actual: usize },
    #[error("encoded lengths mismatch: expected {expected}, got {actual}")]
    LengthEncodingMismatch { expected: usize, actual: usize },
    #[error("static splice must preserve length: deleting {delete_count} bytes, inserting {inserted}")]
    StaticLengthInvariantViolated { delete_count: usize, inserted: usize },
    #[error("byte range {start}..{end} out of bounds for length {length}")]
    OutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("field index {field_index} out of range ({field_count} fields)")]
    FieldIndexOutOfRange {
        field_index: usize,
        field_count: usize,
    },
    #[error("record not found in {table}")]
    RecordNotFound { table: TableId },
    #[error("call depth limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },
    #[error("observer {hook} failed on {event:?}: {source}")]
    ObserverFailure {
        hook: SmolStr,
        event: HookEvent,
        #[source]
        source: HookError,
    },
    #[error("table {0} not found")]
    TableNotFound(TableId),
    #[error("table {0} already exists")]
    TableAlreadyExists(TableId),
    #[error("schema of {0} cannot change while a mutation is being dispatched")]
    SchemaLocked(TableId),
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),
    #[error("invalid field layout: {0}")]
    InvalidFieldLayout(&'static str),
    #[error("invalid encoded lengths: {0}")]
    InvalidEncodedLengths(&'static str),
    #[error("redb error: {0}")]
    Backend(#[from] redb::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StoreError {
    /// Innermost store error, looking through observer failures.
    pub fn root_cause(&self) -> &StoreError {
        match self {
            StoreError::ObserverFailure { source, .. } => source
                .downcast_ref::<StoreError>()
                .map_or(self, StoreError::root_cause),
            _ => self,
        }
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::Backend(e.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Backend(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Backend(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Backend(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Backend(e.into())
    }
}
