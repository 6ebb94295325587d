mod read_op;
mod record;
mod write_op;
mod write_set;

pub use record::Record;

use crate::backend::{
    StorageBackend, WriteBatch, catalog_key, catalog_prefix, table_from_catalog_key, table_prefix,
};
use crate::error::StoreError;
use crate::layout::FieldLayout;
use crate::types::{FastMap, TableId, Word};
use tracing::debug;
use write_set::WriteSet;

/// Owns (table, key tuple) → record contents on top of a [`StorageBackend`].
///
/// Mutations land in an uncommitted write set first; [`RecordStore::commit`]
/// moves them to the backend as one batch.
pub struct RecordStore {
    backend: Box<dyn StorageBackend>,
    tables: FastMap<TableId, FieldLayout>,
    writes: WriteSet,
}

impl RecordStore {
    /// Wrap a backend, loading every table schema it already holds.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, StoreError> {
        let mut tables = FastMap::default();
        for key in backend.keys_with_prefix(&catalog_prefix())? {
            let table = table_from_catalog_key(&key)?;
            let Some(bytes) = backend.get(&key)? else {
                continue;
            };
            let word: Word = bytes
                .as_slice()
                .try_into()
                .map_err(|_| StoreError::InvalidFieldLayout("stored layout is not one word"))?;
            tables.insert(table, FieldLayout::decode(&word)?);
        }
        debug!(target: "table_store", tables = tables.len(), "record store opened");
        Ok(Self {
            backend,
            tables,
            writes: WriteSet::default(),
        })
    }

    /// Wrap a backend known to hold no tables.
    pub fn open_empty(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            tables: FastMap::default(),
            writes: WriteSet::default(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Tables
    // ════════════════════════════════════════════════════════════════════════

    pub fn field_layout(&self, table: TableId) -> Result<&FieldLayout, StoreError> {
        self.tables.get(&table).ok_or(StoreError::TableNotFound(table))
    }

    #[inline]
    pub fn has_table(&self, table: TableId) -> bool {
        self.tables.contains_key(&table)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&TableId, &FieldLayout)> + '_ {
        self.tables.iter()
    }

    /// Persist a new table schema. Applied to the backend immediately.
    pub fn register_table(&mut self, table: TableId, layout: FieldLayout) -> Result<(), StoreError> {
        if self.tables.contains_key(&table) {
            return Err(StoreError::TableAlreadyExists(table));
        }
        if !self.writes.is_empty() {
            return Err(StoreError::SchemaLocked(table));
        }
        self.backend.apply_batch(WriteBatch {
            removed_prefixes: Vec::new(),
            writes: vec![(catalog_key(table), Some(layout.encode().to_vec()))],
        })?;
        debug!(target: "table_store", %table, static_len = layout.static_data_length(),
            dynamic_fields = layout.num_dynamic_fields(), "table registered");
        self.tables.insert(table, layout);
        Ok(())
    }

    /// Remove a table's schema and every record stored under it.
    pub fn drop_table(&mut self, table: TableId) -> Result<(), StoreError> {
        if !self.tables.contains_key(&table) {
            return Err(StoreError::TableNotFound(table));
        }
        if !self.writes.is_empty() {
            return Err(StoreError::SchemaLocked(table));
        }
        self.backend.apply_batch(WriteBatch {
            removed_prefixes: vec![table_prefix(table)],
            writes: vec![(catalog_key(table), None)],
        })?;
        self.tables.remove(&table);
        debug!(target: "table_store", %table, "table dropped");
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Write set
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub(crate) fn savepoint(&self) -> usize {
        self.writes.savepoint()
    }

    pub(crate) fn rollback_to(&mut self, savepoint: usize) {
        self.writes.rollback_to(savepoint);
    }

    /// Flush pending writes to the backend. The write set is empty afterwards
    /// whether or not the backend accepted the batch.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        let batch = self.writes.take_batch();
        if batch.is_empty() {
            return Ok(());
        }
        self.backend.apply_batch(batch)
    }

    /// Drop pending writes without touching the backend.
    pub fn discard(&mut self) {
        self.writes.rollback_to(0);
    }

    #[inline]
    pub fn has_pending_writes(&self) -> bool {
        !self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests;
