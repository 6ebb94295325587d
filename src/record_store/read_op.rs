use super::RecordStore;
use super::record::Record;
use super::write_set::Pending;
use crate::backend::{Region, region_key};
use crate::error::StoreError;
use crate::layout::EncodedLengths;
use crate::types::{KeyTuple, TableId, Word};

impl RecordStore {
    // ════════════════════════════════════════════════════════════════════════
    // Internal: region reads (write set first, then backend)
    // ════════════════════════════════════════════════════════════════════════

    pub(super) fn read_region(
        &self,
        table: TableId,
        key: &KeyTuple,
        region: Region,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let region_key = region_key(table, key, region);
        match self.writes.get(&region_key) {
            Some(Pending::Put(bytes)) => Ok(Some(bytes.clone())),
            Some(Pending::Delete) => Ok(None),
            None => self.backend.get(&region_key),
        }
    }

    pub(super) fn check_dynamic_index(&self, table: TableId, index: usize) -> Result<(), StoreError> {
        let field_count = self.field_layout(table)?.num_dynamic_fields();
        if index >= field_count {
            return Err(StoreError::FieldIndexOutOfRange {
                field_index: index,
                field_count,
            });
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Read access. Absent records read as their zero value.
    // ════════════════════════════════════════════════════════════════════════

    /// A record exists from its first mutation until it is deleted.
    pub fn record_exists(&self, table: TableId, key: &KeyTuple) -> Result<bool, StoreError> {
        self.field_layout(table)?;
        Ok(self.read_region(table, key, Region::Static)?.is_some())
    }

    pub fn get_static_data(&self, table: TableId, key: &KeyTuple) -> Result<Vec<u8>, StoreError> {
        let static_len = self.field_layout(table)?.static_data_length();
        Ok(self
            .read_region(table, key, Region::Static)?
            .unwrap_or_else(|| vec![0; static_len]))
    }

    pub fn get_encoded_lengths(
        &self,
        table: TableId,
        key: &KeyTuple,
    ) -> Result<EncodedLengths, StoreError> {
        let num_dynamic = self.field_layout(table)?.num_dynamic_fields();
        match self.read_region(table, key, Region::EncodedLengths)? {
            Some(bytes) => {
                let word: Word = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::InvalidEncodedLengths("stored lengths are not one word"))?;
                EncodedLengths::from_word(&word, num_dynamic)
            }
            None => Ok(EncodedLengths::zeroed(num_dynamic)),
        }
    }

    pub fn get_dynamic_field(
        &self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        self.check_dynamic_index(table, index)?;
        Ok(self
            .read_region(table, key, Region::Dynamic(index as u8))?
            .unwrap_or_default())
    }

    /// All dynamic fields concatenated in field order.
    pub fn get_dynamic_data(&self, table: TableId, key: &KeyTuple) -> Result<Vec<u8>, StoreError> {
        let num_dynamic = self.field_layout(table)?.num_dynamic_fields();
        let mut out = Vec::new();
        for i in 0..num_dynamic {
            if let Some(bytes) = self.read_region(table, key, Region::Dynamic(i as u8))? {
                out.extend_from_slice(&bytes);
            }
        }
        Ok(out)
    }

    pub fn get_record(&self, table: TableId, key: &KeyTuple) -> Result<Record, StoreError> {
        Ok(Record {
            static_data: self.get_static_data(table, key)?,
            encoded_lengths: self.get_encoded_lengths(table, key)?,
            dynamic_data: self.get_dynamic_data(table, key)?,
        })
    }

    /// Like [`get_record`](Self::get_record) but fails on absent records.
    pub fn require_record(&self, table: TableId, key: &KeyTuple) -> Result<Record, StoreError> {
        if !self.record_exists(table, key)? {
            return Err(StoreError::RecordNotFound { table });
        }
        self.get_record(table, key)
    }

    pub fn get_dynamic_field_length(
        &self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
    ) -> Result<u64, StoreError> {
        self.check_dynamic_index(table, index)?;
        let lengths = self.get_encoded_lengths(table, key)?;
        Ok(lengths.get(index).unwrap_or(0))
    }

    /// Length of field `field_index` counted over static then dynamic fields.
    /// Static fields always report their fixed width.
    pub fn get_field_length(
        &self,
        table: TableId,
        key: &KeyTuple,
        field_index: usize,
    ) -> Result<u64, StoreError> {
        let layout = self.field_layout(table)?;
        if let Some(len) = layout.static_field_length(field_index) {
            return Ok(len as u64);
        }
        if field_index >= layout.num_fields() {
            return Err(StoreError::FieldIndexOutOfRange {
                field_index,
                field_count: layout.num_fields(),
            });
        }
        let dynamic_index = field_index - layout.num_static_fields();
        self.get_dynamic_field_length(table, key, dynamic_index)
    }

    pub fn get_static_field(
        &self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        let layout = self.field_layout(table)?;
        let (Some(offset), Some(len)) = (
            layout.static_field_offset(index),
            layout.static_field_length(index),
        ) else {
            return Err(StoreError::FieldIndexOutOfRange {
                field_index: index,
                field_count: layout.num_static_fields(),
            });
        };
        let data = self.get_static_data(table, key)?;
        Ok(data[offset..offset + len].to_vec())
    }

    /// Field `field_index` counted over static then dynamic fields.
    pub fn get_field(
        &self,
        table: TableId,
        key: &KeyTuple,
        field_index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        let layout = self.field_layout(table)?;
        let num_static = layout.num_static_fields();
        if field_index < num_static {
            return self.get_static_field(table, key, field_index);
        }
        if field_index >= layout.num_fields() {
            return Err(StoreError::FieldIndexOutOfRange {
                field_index,
                field_count: layout.num_fields(),
            });
        }
        self.get_dynamic_field(table, key, field_index - num_static)
    }

    /// Bytes `start..end` of dynamic field `index`.
    pub fn get_dynamic_field_slice(
        &self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
        start: usize,
        end: usize,
    ) -> Result<Vec<u8>, StoreError> {
        let field = self.get_dynamic_field(table, key, index)?;
        if start > end || end > field.len() {
            return Err(StoreError::OutOfBounds {
                start,
                end,
                length: field.len(),
            });
        }
        Ok(field[start..end].to_vec())
    }
}
