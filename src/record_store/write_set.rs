use crate::backend::WriteBatch;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pending {
    Put(Vec<u8>),
    Delete,
}

#[derive(Debug)]
struct UndoEntry {
    key: Vec<u8>,
    prior: Option<Pending>,
}

/// Uncommitted region writes of the dispatch in flight.
///
/// Every write appends the entry it replaced to an undo log, so the set can be
/// rewound to any earlier savepoint without copying it.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    pending: BTreeMap<Vec<u8>, Pending>,
    undo: Vec<UndoEntry>,
}

impl WriteSet {
    #[inline]
    pub fn get(&self, key: &[u8]) -> Option<&Pending> {
        self.pending.get(key)
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.record(key, Pending::Put(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.record(key, Pending::Delete);
    }

    fn record(&mut self, key: Vec<u8>, next: Pending) {
        let prior = self.pending.insert(key.clone(), next);
        self.undo.push(UndoEntry { key, prior });
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[inline]
    pub fn savepoint(&self) -> usize {
        self.undo.len()
    }

    pub fn rollback_to(&mut self, savepoint: usize) {
        while self.undo.len() > savepoint {
            let Some(entry) = self.undo.pop() else { break };
            match entry.prior {
                Some(prior) => {
                    self.pending.insert(entry.key, prior);
                }
                None => {
                    self.pending.remove(&entry.key);
                }
            }
        }
    }

    /// Drain everything into a batch and forget the undo log.
    pub fn take_batch(&mut self) -> WriteBatch {
        self.undo.clear();
        let writes = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(key, pending)| match pending {
                Pending::Put(value) => (key, Some(value)),
                Pending::Delete => (key, None),
            })
            .collect();
        WriteBatch {
            removed_prefixes: Vec::new(),
            writes,
        }
    }
}
