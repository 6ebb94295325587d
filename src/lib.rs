//! Table-oriented record store with before/after mutation hooks.
//!
//! Records live under `(table, key tuple)` and are split into a fixed-size
//! static region and up to five variable-length dynamic fields. Four
//! primitives mutate them: set record, splice static data, splice dynamic
//! data and delete record. Each primitive is wrapped by the [`Store`]
//! dispatcher, which calls the observers registered on the table for the
//! matching before/after [`HookEvent`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use table_hooks_store::{
//!     EncodedLengths, FieldLayout, HookEvent, KeyTuple, SetRecordArgs, Store, StoreHook,
//!     TableId,
//! };
//!
//! struct Audit;
//!
//! impl StoreHook for Audit {
//!     fn on_after_set_record(
//!         &self,
//!         _store: &mut Store,
//!         args: &SetRecordArgs<'_>,
//!     ) -> table_hooks_store::HookResult {
//!         println!("{} written", args.table);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), table_hooks_store::StoreError> {
//! let mut store = Store::in_memory();
//! let table = TableId::new("app", "Balances")?;
//! store.register_table(table, FieldLayout::new(&[32], 1)?)?;
//! store.register_hook(table, Arc::new(Audit), HookEvent::AfterSetRecord.into())?;
//!
//! let lengths = EncodedLengths::from_fields(&[b"alice"])?;
//! store.set_record(table, &KeyTuple::from_u64s(&[1]), &[0; 32], &lengths, b"alice")?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod journal;
pub mod layout;
pub mod record_store;
pub mod types;

pub use backend::{MemoryBackend, RedbBackend, StorageBackend, WriteBatch};
pub use config::StoreConfig;
pub use dispatcher::Store;
pub use error::{HookError, StoreError};
pub use hooks::{
    DeleteRecordArgs, FnHook, HookCall, HookEvent, HookMask, HookRegistry, HookResult,
    SetRecordArgs, SpliceDynamicArgs, SpliceStaticArgs, StoreHook,
};
pub use journal::StoreEvent;
pub use layout::{EncodedLengths, FieldLayout};
pub use record_store::{Record, RecordStore};
pub use types::{KeyTuple, TableId, Word};
