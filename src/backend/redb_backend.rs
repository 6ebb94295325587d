use super::{StorageBackend, WriteBatch};
use crate::error::StoreError;
use lru::LruCache;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::num::NonZeroUsize;
use std::path::Path;

// Key: encoded region key
// Value: raw region bytes
const REGIONS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("regions");

/// On-disk backend over a single redb table.
///
/// Recently written regions are kept in an LRU cache; when it is full the
/// least-recently-written region is evicted and re-read from disk on access.
pub struct RedbBackend {
    db: Database,
    cache: LruCache<Vec<u8>, Vec<u8>>,
}

impl RedbBackend {
    /// Open or create the database at the specified path.
    /// Also ensures that the regions table exists.
    pub fn open(path: impl AsRef<Path>, cache_capacity: NonZeroUsize) -> Result<Self, StoreError> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REGIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            cache: LruCache::new(cache_capacity),
        })
    }
}

impl StorageBackend for RedbBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(cached) = self.cache.peek(key) {
            return Ok(Some(cached.clone()));
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REGIONS_TABLE)?;
        Ok(table.get(key)?.map(|access| access.value().to_vec()))
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REGIONS_TABLE)?;
        let mut keys = Vec::new();
        for entry in table.range::<&[u8]>(prefix..)? {
            let (key, _) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    fn apply_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REGIONS_TABLE)?;
            for prefix in &batch.removed_prefixes {
                let mut doomed = Vec::new();
                for entry in table.range::<&[u8]>(prefix.as_slice()..)? {
                    let (key, _) = entry?;
                    let key = key.value();
                    if !key.starts_with(prefix) {
                        break;
                    }
                    doomed.push(key.to_vec());
                }
                for key in doomed {
                    table.remove(key.as_slice())?;
                }
            }
            for (key, value) in &batch.writes {
                match value {
                    Some(bytes) => {
                        table.insert(key.as_slice(), bytes.as_slice())?;
                    }
                    None => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        write_txn.commit()?;

        // Cache only after the commit succeeded.
        for prefix in &batch.removed_prefixes {
            let stale: Vec<Vec<u8>> = self
                .cache
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect();
            for key in stale {
                self.cache.pop(&key);
            }
        }
        for (key, value) in batch.writes {
            match value {
                Some(bytes) => {
                    self.cache.put(key, bytes);
                }
                None => {
                    self.cache.pop(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_redb_backend_basics() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_file = NamedTempFile::new()?;
        let mut backend = RedbBackend::open(tmp_file.path(), capacity(16))?;

        backend.apply_batch(WriteBatch {
            removed_prefixes: vec![],
            writes: vec![
                (b"r1-a".to_vec(), Some(b"one".to_vec())),
                (b"r1-b".to_vec(), Some(b"two".to_vec())),
                (b"r2-a".to_vec(), Some(b"three".to_vec())),
            ],
        })?;
        assert_eq!(backend.get(b"r1-b")?, Some(b"two".to_vec()));
        assert_eq!(backend.keys_with_prefix(b"r1")?.len(), 2);

        backend.apply_batch(WriteBatch {
            removed_prefixes: vec![b"r1".to_vec()],
            writes: vec![(b"r2-a".to_vec(), None)],
        })?;
        assert_eq!(backend.get(b"r1-a")?, None);
        assert_eq!(backend.get(b"r2-a")?, None);
        assert!(backend.keys_with_prefix(b"r")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_evicted_regions_are_read_from_disk() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_file = NamedTempFile::new()?;
        let mut backend = RedbBackend::open(tmp_file.path(), capacity(1))?;

        backend.apply_batch(WriteBatch {
            removed_prefixes: vec![],
            writes: vec![
                (b"k1".to_vec(), Some(b"v1".to_vec())),
                (b"k2".to_vec(), Some(b"v2".to_vec())),
            ],
        })?;
        assert_eq!(backend.cache.len(), 1);
        assert_eq!(backend.get(b"k1")?, Some(b"v1".to_vec()));
        assert_eq!(backend.get(b"k2")?, Some(b"v2".to_vec()));
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_data() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_file = NamedTempFile::new()?;
        {
            let mut backend = RedbBackend::open(tmp_file.path(), capacity(4))?;
            backend.apply_batch(WriteBatch {
                removed_prefixes: vec![],
                writes: vec![(b"persist".to_vec(), Some(b"yes".to_vec()))],
            })?;
        }
        let backend = RedbBackend::open(tmp_file.path(), capacity(4))?;
        assert_eq!(backend.get(b"persist")?, Some(b"yes".to_vec()));
        Ok(())
    }
}
