use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

const DEFAULT_MAX_CALL_DEPTH: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => unreachable!(),
};

const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum nesting of dispatched mutations. A top-level call counts as one;
    /// every mutation an observer issues from inside a hook adds one more.
    ///
    /// Default: 32.
    pub max_call_depth: NonZeroUsize,

    /// Maximum number of recently written regions kept in the redb backend's
    /// LRU cache. Evicted regions remain on disk and are re-read on access.
    ///
    /// Default: 10 000 regions.
    pub cache_capacity: NonZeroUsize,

    /// Append every committed mutation to the event journal.
    pub record_events: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            record_events: false,
        }
    }
}

impl StoreConfig {
    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}
