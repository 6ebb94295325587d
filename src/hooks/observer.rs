use super::event::HookEvent;
use crate::dispatcher::Store;
use crate::error::HookError;
use crate::layout::EncodedLengths;
use crate::types::{KeyTuple, TableId};

pub type HookResult = Result<(), HookError>;

// ─── Hook Arguments ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SetRecordArgs<'a> {
    pub table: TableId,
    pub key_tuple: &'a KeyTuple,
    pub static_data: &'a [u8],
    pub encoded_lengths: &'a EncodedLengths,
    pub dynamic_data: &'a [u8],
}

#[derive(Debug, Clone, Copy)]
pub struct SpliceStaticArgs<'a> {
    pub table: TableId,
    pub key_tuple: &'a KeyTuple,
    pub start: usize,
    pub delete_count: usize,
    pub data: &'a [u8],
}

/// `encoded_lengths` are the record's lengths once the splice is applied.
#[derive(Debug, Clone, Copy)]
pub struct SpliceDynamicArgs<'a> {
    pub table: TableId,
    pub key_tuple: &'a KeyTuple,
    pub field_index: usize,
    pub start: usize,
    pub delete_count: usize,
    pub encoded_lengths: &'a EncodedLengths,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteRecordArgs<'a> {
    pub table: TableId,
    pub key_tuple: &'a KeyTuple,
}

// ─── Observer ───────────────────────────────────────────────────────────────

/// External logic invoked around record mutations.
///
/// Only the methods selected by the registration mask are ever called, so an
/// observer implements just the ones it subscribes to. Every method receives
/// the store and may issue further mutations; an `Err` aborts the whole
/// top-level call.
pub trait StoreHook: Send + Sync {
    /// Identifies the observer in [`StoreError::ObserverFailure`](crate::StoreError).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_before_set_record(&self, _store: &mut Store, _args: &SetRecordArgs<'_>) -> HookResult {
        Ok(())
    }

    fn on_after_set_record(&self, _store: &mut Store, _args: &SetRecordArgs<'_>) -> HookResult {
        Ok(())
    }

    fn on_before_splice_static_data(
        &self,
        _store: &mut Store,
        _args: &SpliceStaticArgs<'_>,
    ) -> HookResult {
        Ok(())
    }

    fn on_after_splice_static_data(
        &self,
        _store: &mut Store,
        _args: &SpliceStaticArgs<'_>,
    ) -> HookResult {
        Ok(())
    }

    fn on_before_splice_dynamic_data(
        &self,
        _store: &mut Store,
        _args: &SpliceDynamicArgs<'_>,
    ) -> HookResult {
        Ok(())
    }

    fn on_after_splice_dynamic_data(
        &self,
        _store: &mut Store,
        _args: &SpliceDynamicArgs<'_>,
    ) -> HookResult {
        Ok(())
    }

    fn on_before_delete_record(&self, _store: &mut Store, _args: &DeleteRecordArgs<'_>) -> HookResult {
        Ok(())
    }

    fn on_after_delete_record(&self, _store: &mut Store, _args: &DeleteRecordArgs<'_>) -> HookResult {
        Ok(())
    }
}

// ─── Closure Adapter ────────────────────────────────────────────────────────

/// A single hook invocation, as seen by an [`FnHook`] closure.
#[derive(Debug, Clone, Copy)]
pub enum HookCall<'a> {
    SetRecord(&'a SetRecordArgs<'a>),
    SpliceStaticData(&'a SpliceStaticArgs<'a>),
    SpliceDynamicData(&'a SpliceDynamicArgs<'a>),
    DeleteRecord(&'a DeleteRecordArgs<'a>),
}

impl HookCall<'_> {
    pub fn table(&self) -> TableId {
        match self {
            HookCall::SetRecord(args) => args.table,
            HookCall::SpliceStaticData(args) => args.table,
            HookCall::SpliceDynamicData(args) => args.table,
            HookCall::DeleteRecord(args) => args.table,
        }
    }

    pub fn key_tuple(&self) -> &KeyTuple {
        match self {
            HookCall::SetRecord(args) => args.key_tuple,
            HookCall::SpliceStaticData(args) => args.key_tuple,
            HookCall::SpliceDynamicData(args) => args.key_tuple,
            HookCall::DeleteRecord(args) => args.key_tuple,
        }
    }
}

/// Observer backed by a closure over `(store, event, call)`.
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&mut Store, HookEvent, HookCall<'_>) -> HookResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> StoreHook for FnHook<F>
where
    F: Fn(&mut Store, HookEvent, HookCall<'_>) -> HookResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_before_set_record(&self, store: &mut Store, args: &SetRecordArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::BeforeSetRecord, HookCall::SetRecord(args))
    }

    fn on_after_set_record(&self, store: &mut Store, args: &SetRecordArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::AfterSetRecord, HookCall::SetRecord(args))
    }

    fn on_before_splice_static_data(&self, store: &mut Store, args: &SpliceStaticArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::BeforeSpliceStaticData, HookCall::SpliceStaticData(args))
    }

    fn on_after_splice_static_data(&self, store: &mut Store, args: &SpliceStaticArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::AfterSpliceStaticData, HookCall::SpliceStaticData(args))
    }

    fn on_before_splice_dynamic_data(&self, store: &mut Store, args: &SpliceDynamicArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::BeforeSpliceDynamicData, HookCall::SpliceDynamicData(args))
    }

    fn on_after_splice_dynamic_data(&self, store: &mut Store, args: &SpliceDynamicArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::AfterSpliceDynamicData, HookCall::SpliceDynamicData(args))
    }

    fn on_before_delete_record(&self, store: &mut Store, args: &DeleteRecordArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::BeforeDeleteRecord, HookCall::DeleteRecord(args))
    }

    fn on_after_delete_record(&self, store: &mut Store, args: &DeleteRecordArgs<'_>) -> HookResult {
        (self.f)(store, HookEvent::AfterDeleteRecord, HookCall::DeleteRecord(args))
    }
}
