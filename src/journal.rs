use crate::layout::EncodedLengths;
use crate::types::{KeyTuple, TableId};
use serde::{Deserialize, Serialize};

/// A committed-by-dispatch mutation, in the shape indexers replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StoreEvent {
    SetRecord {
        table: TableId,
        key_tuple: KeyTuple,
        static_data: Vec<u8>,
        encoded_lengths: EncodedLengths,
        dynamic_data: Vec<u8>,
    },
    SpliceStaticData {
        table: TableId,
        key_tuple: KeyTuple,
        start: usize,
        data: Vec<u8>,
    },
    SpliceDynamicData {
        table: TableId,
        key_tuple: KeyTuple,
        field_index: usize,
        start: usize,
        delete_count: usize,
        encoded_lengths: EncodedLengths,
        data: Vec<u8>,
    },
    DeleteRecord {
        table: TableId,
        key_tuple: KeyTuple,
    },
}

impl StoreEvent {
    pub fn table(&self) -> TableId {
        match self {
            StoreEvent::SetRecord { table, .. }
            | StoreEvent::SpliceStaticData { table, .. }
            | StoreEvent::SpliceDynamicData { table, .. }
            | StoreEvent::DeleteRecord { table, .. } => *table,
        }
    }
}

/// Ordered log of mutations applied by the dispatcher.
///
/// Positions are absolute: they keep counting across drains, so a savepoint
/// taken before a drain still rewinds to the right event. Only events at or
/// below the committed mark are handed out by [`Journal::drain`].
#[derive(Debug, Default)]
pub(crate) struct Journal {
    enabled: bool,
    events: Vec<StoreEvent>,
    drained: usize,
    committed: usize,
}

impl Journal {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// `make` is only evaluated when recording is on.
    #[inline]
    pub fn record(&mut self, make: impl FnOnce() -> StoreEvent) {
        if self.enabled {
            self.events.push(make());
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.drained + self.events.len()
    }

    /// Drop every event recorded after `position`. Committed events stay.
    pub fn truncate(&mut self, position: usize) {
        let position = position.max(self.committed);
        self.events.truncate(position - self.drained);
    }

    /// Mark everything recorded so far as committed.
    pub fn commit(&mut self) {
        self.committed = self.position();
    }

    /// Take the committed events not drained yet. Uncommitted ones stay.
    pub fn drain(&mut self) -> Vec<StoreEvent> {
        let ready = self.committed - self.drained;
        self.drained = self.committed;
        self.events.drain(..ready).collect()
    }
}
