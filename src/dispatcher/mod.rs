mod field_ops;

use crate::backend::{MemoryBackend, RedbBackend, StorageBackend};
use crate::config::StoreConfig;
use crate::error::{HookError, StoreError};
use crate::hooks::{
    DeleteRecordArgs, HookEvent, HookMask, HookRegistry, SetRecordArgs, SpliceDynamicArgs,
    SpliceStaticArgs, StoreHook,
};
use crate::journal::{Journal, StoreEvent};
use crate::layout::{EncodedLengths, FieldLayout};
use crate::record_store::{Record, RecordStore};
use crate::types::{KeyTuple, TableId};
use smol_str::SmolStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// State to rewind to when a dispatched call fails.
struct Savepoint {
    writes: usize,
    hooks: HookRegistry,
    journal: usize,
}

/// Record store wrapped in hook dispatch.
///
/// Every mutation runs as: before-observers → store mutation →
/// after-observers, each observer list resolved from the registry for the
/// table and event at that moment. A call either fully succeeds or leaves the
/// store, the registry and the journal exactly as they were.
pub struct Store {
    records: RecordStore,
    hooks: HookRegistry,
    journal: Journal,
    config: StoreConfig,
    depth: usize,
}

impl Store {
    pub fn new(backend: Box<dyn StorageBackend>, config: StoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            records: RecordStore::open(backend)?,
            hooks: HookRegistry::new(),
            journal: Journal::new(config.record_events),
            config,
            depth: 0,
        })
    }

    /// Store over a fresh [`MemoryBackend`] with default configuration.
    pub fn in_memory() -> Self {
        Self::in_memory_with(StoreConfig::default())
    }

    /// Store over a fresh [`MemoryBackend`].
    pub fn in_memory_with(config: StoreConfig) -> Self {
        Self {
            records: RecordStore::open_empty(Box::new(MemoryBackend::new())),
            hooks: HookRegistry::new(),
            journal: Journal::new(config.record_events),
            config,
            depth: 0,
        }
    }

    /// Open or create an on-disk store at `path`.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        let backend = RedbBackend::open(path, config.cache_capacity)?;
        Self::new(Box::new(backend), config)
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Nesting level of the dispatch in flight; 0 outside any mutation.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    #[inline]
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    // ════════════════════════════════════════════════════════════════════════
    // Tables
    // ════════════════════════════════════════════════════════════════════════

    pub fn register_table(&mut self, table: TableId, layout: FieldLayout) -> Result<(), StoreError> {
        if self.depth > 0 {
            return Err(StoreError::SchemaLocked(table));
        }
        self.records.register_table(table, layout)
    }

    /// Delete the table, all of its records and all of its hook registrations.
    pub fn drop_table(&mut self, table: TableId) -> Result<(), StoreError> {
        if self.depth > 0 {
            return Err(StoreError::SchemaLocked(table));
        }
        self.records.drop_table(table)?;
        let removed = self.hooks.clear_table(table);
        debug!(target: "table_store", %table, hooks = removed, "table hooks cleared");
        Ok(())
    }

    pub fn field_layout(&self, table: TableId) -> Result<&FieldLayout, StoreError> {
        self.records.field_layout(table)
    }

    #[inline]
    pub fn has_table(&self, table: TableId) -> bool {
        self.records.has_table(table)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Hook registration
    // ════════════════════════════════════════════════════════════════════════

    /// Register `hook` on `table` for the events in `mask`. Registering the
    /// same observer again replaces its mask and keeps its position.
    pub fn register_hook(
        &mut self,
        table: TableId,
        hook: Arc<dyn StoreHook>,
        mask: HookMask,
    ) -> Result<(), StoreError> {
        self.records.field_layout(table)?;
        debug!(target: "table_store", %table, hook = hook.name(), mask = mask.bits(), "hook registered");
        self.hooks.register(table, hook, mask);
        Ok(())
    }

    /// Returns whether `hook` was registered on `table`.
    pub fn unregister_hook(&mut self, table: TableId, hook: &Arc<dyn StoreHook>) -> bool {
        let removed = self.hooks.unregister(table, hook);
        if removed {
            debug!(target: "table_store", %table, hook = hook.name(), "hook unregistered");
        }
        removed
    }

    // ════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ════════════════════════════════════════════════════════════════════════

    fn savepoint(&self) -> Savepoint {
        Savepoint {
            writes: self.records.savepoint(),
            hooks: self.hooks.clone(),
            journal: self.journal.position(),
        }
    }

    fn rollback(&mut self, savepoint: Savepoint) {
        self.records.rollback_to(savepoint.writes);
        self.hooks = savepoint.hooks;
        self.journal.truncate(savepoint.journal);
    }

    /// Run `op` as one all-or-nothing unit. Top-level units commit to the
    /// backend on success; nested ones only rewind on failure.
    fn dispatch<T>(
        &mut self,
        table: TableId,
        op: impl FnOnce(&mut Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let limit = self.config.max_call_depth.get();
        if self.depth >= limit {
            warn!(target: "table_store", %table, limit, "call depth limit exceeded");
            return Err(StoreError::RecursionLimitExceeded { limit });
        }

        let savepoint = self.savepoint();
        self.depth += 1;
        let result = op(self);
        self.depth -= 1;

        match result {
            Ok(value) => {
                if self.depth == 0 {
                    if let Err(e) = self.records.commit() {
                        self.rollback(savepoint);
                        return Err(e);
                    }
                    self.journal.commit();
                }
                Ok(value)
            }
            Err(e) => {
                if self.depth == 0 {
                    warn!(target: "table_store", %table, error = %e, "mutation rolled back");
                } else {
                    trace!(target: "table_store", %table, depth = self.depth, error = %e, "nested mutation rolled back");
                }
                self.rollback(savepoint);
                Err(e)
            }
        }
    }

    /// Call every observer of `table` enabled for `event`, in registration
    /// order. The list is resolved before the first call.
    fn run_hooks(
        &mut self,
        table: TableId,
        event: HookEvent,
        mut call: impl FnMut(&dyn StoreHook, &mut Store) -> Result<(), HookError>,
    ) -> Result<(), StoreError> {
        let hooks: Vec<Arc<dyn StoreHook>> =
            self.hooks.enabled_hooks_for(table, event).cloned().collect();
        for hook in hooks {
            trace!(target: "table_store", %table, hook = hook.name(), ?event, "invoking hook");
            call(hook.as_ref(), self).map_err(|source| StoreError::ObserverFailure {
                hook: SmolStr::new(hook.name()),
                event,
                source,
            })?;
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Mutation primitives
    // ════════════════════════════════════════════════════════════════════════

    /// Replace the full record at `key_tuple`, creating it if absent.
    pub fn set_record(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        static_data: &[u8],
        encoded_lengths: &EncodedLengths,
        dynamic_data: &[u8],
    ) -> Result<(), StoreError> {
        self.dispatch(table, |store| {
            store
                .records
                .check_set_record(table, static_data, encoded_lengths, dynamic_data)?;
            let args = SetRecordArgs {
                table,
                key_tuple,
                static_data,
                encoded_lengths,
                dynamic_data,
            };
            store.run_hooks(table, HookEvent::BeforeSetRecord, |hook, store| {
                hook.on_before_set_record(store, &args)
            })?;

            trace!(target: "table_store", %table, static_len = static_data.len(),
                dynamic_len = dynamic_data.len(), "set record");
            store
                .records
                .set_record(table, key_tuple, static_data, encoded_lengths, dynamic_data)?;
            store.journal.record(|| StoreEvent::SetRecord {
                table,
                key_tuple: key_tuple.clone(),
                static_data: static_data.to_vec(),
                encoded_lengths: encoded_lengths.clone(),
                dynamic_data: dynamic_data.to_vec(),
            });

            store.run_hooks(table, HookEvent::AfterSetRecord, |hook, store| {
                hook.on_after_set_record(store, &args)
            })
        })
    }

    /// Overwrite `delete_count` bytes of the static region at `start` with
    /// `data`, which must be exactly `delete_count` bytes long.
    pub fn splice_static_data(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        self.dispatch(table, |store| {
            store
                .records
                .check_splice_static(table, start, delete_count, data)?;
            let args = SpliceStaticArgs {
                table,
                key_tuple,
                start,
                delete_count,
                data,
            };
            store.run_hooks(table, HookEvent::BeforeSpliceStaticData, |hook, store| {
                hook.on_before_splice_static_data(store, &args)
            })?;

            trace!(target: "table_store", %table, start, delete_count, "splice static data");
            store
                .records
                .splice_static_data(table, key_tuple, start, delete_count, data)?;
            store.journal.record(|| StoreEvent::SpliceStaticData {
                table,
                key_tuple: key_tuple.clone(),
                start,
                data: data.to_vec(),
            });

            store.run_hooks(table, HookEvent::AfterSpliceStaticData, |hook, store| {
                hook.on_after_splice_static_data(store, &args)
            })
        })
    }

    /// Replace `delete_count` bytes at `start` within dynamic field
    /// `field_index` with `data`. The field may grow or shrink.
    pub fn splice_dynamic_data(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        field_index: usize,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        self.dispatch(table, |store| {
            let planned = store.records.plan_splice_dynamic(
                table,
                key_tuple,
                field_index,
                start,
                delete_count,
                data,
            )?;
            let before = SpliceDynamicArgs {
                table,
                key_tuple,
                field_index,
                start,
                delete_count,
                encoded_lengths: &planned,
                data,
            };
            store.run_hooks(table, HookEvent::BeforeSpliceDynamicData, |hook, store| {
                hook.on_before_splice_dynamic_data(store, &before)
            })?;

            trace!(target: "table_store", %table, field_index, start, delete_count,
                inserted = data.len(), "splice dynamic data");
            let committed = store.records.splice_dynamic_data(
                table,
                key_tuple,
                field_index,
                start,
                delete_count,
                data,
            )?;
            store.journal.record(|| StoreEvent::SpliceDynamicData {
                table,
                key_tuple: key_tuple.clone(),
                field_index,
                start,
                delete_count,
                encoded_lengths: committed.clone(),
                data: data.to_vec(),
            });

            let after = SpliceDynamicArgs {
                encoded_lengths: &committed,
                ..before
            };
            store.run_hooks(table, HookEvent::AfterSpliceDynamicData, |hook, store| {
                hook.on_after_splice_dynamic_data(store, &after)
            })
        })
    }

    /// Remove the record at `key_tuple`. Deleting an absent record succeeds
    /// and still notifies observers.
    pub fn delete_record(&mut self, table: TableId, key_tuple: &KeyTuple) -> Result<(), StoreError> {
        self.dispatch(table, |store| {
            store.records.field_layout(table)?;
            let args = DeleteRecordArgs { table, key_tuple };
            store.run_hooks(table, HookEvent::BeforeDeleteRecord, |hook, store| {
                hook.on_before_delete_record(store, &args)
            })?;

            trace!(target: "table_store", %table, "delete record");
            store.records.delete_record(table, key_tuple)?;
            store.journal.record(|| StoreEvent::DeleteRecord {
                table,
                key_tuple: key_tuple.clone(),
            });

            store.run_hooks(table, HookEvent::AfterDeleteRecord, |hook, store| {
                hook.on_after_delete_record(store, &args)
            })
        })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Reads
    // ════════════════════════════════════════════════════════════════════════

    pub fn record_exists(&self, table: TableId, key_tuple: &KeyTuple) -> Result<bool, StoreError> {
        self.records.record_exists(table, key_tuple)
    }

    pub fn get_record(&self, table: TableId, key_tuple: &KeyTuple) -> Result<Record, StoreError> {
        self.records.get_record(table, key_tuple)
    }

    pub fn require_record(&self, table: TableId, key_tuple: &KeyTuple) -> Result<Record, StoreError> {
        self.records.require_record(table, key_tuple)
    }

    pub fn get_static_data(&self, table: TableId, key_tuple: &KeyTuple) -> Result<Vec<u8>, StoreError> {
        self.records.get_static_data(table, key_tuple)
    }

    pub fn get_dynamic_data(&self, table: TableId, key_tuple: &KeyTuple) -> Result<Vec<u8>, StoreError> {
        self.records.get_dynamic_data(table, key_tuple)
    }

    pub fn get_encoded_lengths(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
    ) -> Result<EncodedLengths, StoreError> {
        self.records.get_encoded_lengths(table, key_tuple)
    }

    pub fn get_dynamic_field_length(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
    ) -> Result<u64, StoreError> {
        self.records.get_dynamic_field_length(table, key_tuple, index)
    }

    pub fn get_field_length(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        field_index: usize,
    ) -> Result<u64, StoreError> {
        self.records.get_field_length(table, key_tuple, field_index)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Journal
    // ════════════════════════════════════════════════════════════════════════

    /// Take every committed event recorded since the last drain. Called from
    /// inside a hook, events of the mutation still in flight are left behind
    /// until it commits.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.journal.drain()
    }
}
