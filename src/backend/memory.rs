use super::{StorageBackend, WriteBatch};
use crate::error::StoreError;
use std::collections::BTreeMap;

/// Process-local backend. Ordered so prefix listing is a range scan.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn apply_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for prefix in &batch.removed_prefixes {
            self.entries.retain(|k, _| !k.starts_with(prefix));
        }
        for (key, value) in batch.writes {
            match value {
                Some(bytes) => {
                    self.entries.insert(key, bytes);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
