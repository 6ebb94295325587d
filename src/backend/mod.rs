mod memory;
mod redb_backend;

pub use memory::MemoryBackend;
pub use redb_backend::RedbBackend;

use crate::error::StoreError;
use crate::types::{KeyTuple, TableId};

/// Key-value substrate the record store persists through.
///
/// Implementations only need point reads, prefix listing and atomic batches.
pub trait StorageBackend: Send {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every stored key starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Apply the whole batch or nothing.
    fn apply_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Changes committed together. Prefix removals are applied before `writes`.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub removed_prefixes: Vec<Vec<u8>>,
    /// `None` deletes the key.
    pub writes: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.removed_prefixes.is_empty() && self.writes.is_empty()
    }
}

// ─── Key Layout ─────────────────────────────────────────────────────────────
//
//  record region:  'r' | table (32) | key count (u32 BE) | keys (32 each) | region
//  table schema:   'c' | table (32)

const RECORD_TAG: u8 = b'r';
const CATALOG_TAG: u8 = b'c';

/// Which part of a record a stored value holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Static,
    EncodedLengths,
    Dynamic(u8),
}

impl Region {
    fn tag(self) -> [u8; 2] {
        match self {
            Region::Static => [0, 0],
            Region::EncodedLengths => [1, 0],
            Region::Dynamic(i) => [2, i],
        }
    }
}

pub(crate) fn region_key(table: TableId, key: &KeyTuple, region: Region) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 32 + 4 + key.len() * 32 + 2);
    out.push(RECORD_TAG);
    out.extend_from_slice(table.as_word());
    key.encode_into(&mut out);
    out.extend_from_slice(&region.tag());
    out
}

pub(crate) fn table_prefix(table: TableId) -> Vec<u8> {
    let mut out = Vec::with_capacity(33);
    out.push(RECORD_TAG);
    out.extend_from_slice(table.as_word());
    out
}

pub(crate) fn catalog_key(table: TableId) -> Vec<u8> {
    let mut out = Vec::with_capacity(33);
    out.push(CATALOG_TAG);
    out.extend_from_slice(table.as_word());
    out
}

pub(crate) fn catalog_prefix() -> Vec<u8> {
    vec![CATALOG_TAG]
}

/// Table id encoded in a catalog key.
pub(crate) fn table_from_catalog_key(key: &[u8]) -> Result<TableId, StoreError> {
    let word: [u8; 32] = key
        .get(1..33)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| StoreError::InvalidResourceId("truncated catalog key".into()))?;
    TableId::from_word(word)
}
