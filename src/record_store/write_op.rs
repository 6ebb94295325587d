use super::RecordStore;
use crate::backend::{Region, region_key};
use crate::error::StoreError;
use crate::layout::EncodedLengths;
use crate::types::{KeyTuple, TableId};

/// Replace `old_len` bytes at `offset` with `new_data`.
/// Handles grow, shrink, and same-size cases.
fn splice_bytes(buf: &mut Vec<u8>, offset: usize, old_len: usize, new_data: &[u8]) {
    let new_len = new_data.len();
    let old_end = offset + old_len;
    let tail_len = buf.len() - old_end;

    if new_len == old_len {
        buf[offset..offset + new_len].copy_from_slice(new_data);
    } else if new_len > old_len {
        let growth = new_len - old_len;
        buf.resize(buf.len() + growth, 0);
        // Shift tail right
        buf.copy_within(old_end..old_end + tail_len, old_end + growth);
        buf[offset..offset + new_len].copy_from_slice(new_data);
    } else {
        let shrink = old_len - new_len;
        buf[offset..offset + new_len].copy_from_slice(new_data);
        // Shift tail left
        buf.copy_within(old_end..old_end + tail_len, old_end - shrink);
        buf.truncate(buf.len() - shrink);
    }
}

fn check_range(start: usize, delete_count: usize, length: usize) -> Result<(), StoreError> {
    match start.checked_add(delete_count) {
        Some(end) if end <= length => Ok(()),
        end => Err(StoreError::OutOfBounds {
            start,
            end: end.unwrap_or(usize::MAX),
            length,
        }),
    }
}

impl RecordStore {
    // ════════════════════════════════════════════════════════════════════════
    // Internal: region writes
    // ════════════════════════════════════════════════════════════════════════

    fn write_region(&mut self, table: TableId, key: &KeyTuple, region: Region, bytes: Vec<u8>) {
        self.writes.put(region_key(table, key, region), bytes);
    }

    fn clear_region(&mut self, table: TableId, key: &KeyTuple, region: Region) {
        self.writes.delete(region_key(table, key, region));
    }

    fn write_dynamic_field(&mut self, table: TableId, key: &KeyTuple, index: usize, bytes: Vec<u8>) {
        let region = Region::Dynamic(index as u8);
        if bytes.is_empty() {
            self.clear_region(table, key, region);
        } else {
            self.write_region(table, key, region, bytes);
        }
    }

    /// Splices into an absent record bring it into existence with a zeroed
    /// static region.
    fn materialize(&mut self, table: TableId, key: &KeyTuple) -> Result<(), StoreError> {
        if self.read_region(table, key, Region::Static)?.is_none() {
            let static_len = self.field_layout(table)?.static_data_length();
            self.write_region(table, key, Region::Static, vec![0; static_len]);
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Validation (no side effects)
    // ════════════════════════════════════════════════════════════════════════

    pub fn check_set_record(
        &self,
        table: TableId,
        static_data: &[u8],
        encoded_lengths: &EncodedLengths,
        dynamic_data: &[u8],
    ) -> Result<(), StoreError> {
        let layout = self.field_layout(table)?;
        if static_data.len() != layout.static_data_length() {
            return Err(StoreError::LayoutMismatch {
                expected: layout.static_data_length(),
                actual: static_data.len(),
            });
        }
        if encoded_lengths.len() != layout.num_dynamic_fields() {
            return Err(StoreError::LengthEncodingMismatch {
                expected: layout.num_dynamic_fields(),
                actual: encoded_lengths.len(),
            });
        }
        if encoded_lengths.total() != dynamic_data.len() as u64 {
            return Err(StoreError::LengthEncodingMismatch {
                expected: encoded_lengths.total() as usize,
                actual: dynamic_data.len(),
            });
        }
        Ok(())
    }

    pub fn check_splice_static(
        &self,
        table: TableId,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let static_len = self.field_layout(table)?.static_data_length();
        if data.len() != delete_count {
            return Err(StoreError::StaticLengthInvariantViolated {
                delete_count,
                inserted: data.len(),
            });
        }
        check_range(start, delete_count, static_len)
    }

    /// Validate a dynamic splice and compute the lengths it will produce.
    pub fn plan_splice_dynamic(
        &self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<EncodedLengths, StoreError> {
        self.check_dynamic_index(table, index)?;
        let lengths = self.get_encoded_lengths(table, key)?;
        let current = lengths.get(index).unwrap_or(0) as usize;
        check_range(start, delete_count, current)?;
        lengths.with_length(index, (current - delete_count + data.len()) as u64)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Mutation primitives
    // ════════════════════════════════════════════════════════════════════════

    /// Replace the full record, creating it if absent.
    pub fn set_record(
        &mut self,
        table: TableId,
        key: &KeyTuple,
        static_data: &[u8],
        encoded_lengths: &EncodedLengths,
        dynamic_data: &[u8],
    ) -> Result<(), StoreError> {
        self.check_set_record(table, static_data, encoded_lengths, dynamic_data)?;

        self.write_region(table, key, Region::Static, static_data.to_vec());
        self.write_region(
            table,
            key,
            Region::EncodedLengths,
            encoded_lengths.to_word().to_vec(),
        );
        let mut offset = 0usize;
        for (i, len) in encoded_lengths.as_slice().iter().enumerate() {
            let end = offset + *len as usize;
            self.write_dynamic_field(table, key, i, dynamic_data[offset..end].to_vec());
            offset = end;
        }
        Ok(())
    }

    /// Overwrite `delete_count` bytes of the static region at `start`.
    /// The static region never changes length.
    pub fn splice_static_data(
        &mut self,
        table: TableId,
        key: &KeyTuple,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        self.check_splice_static(table, start, delete_count, data)?;
        let mut static_data = self.get_static_data(table, key)?;
        splice_bytes(&mut static_data, start, delete_count, data);
        self.write_region(table, key, Region::Static, static_data);
        Ok(())
    }

    /// Replace `delete_count` bytes at `start` within dynamic field `index`;
    /// the field may grow or shrink. Returns the record's updated lengths.
    pub fn splice_dynamic_data(
        &mut self,
        table: TableId,
        key: &KeyTuple,
        index: usize,
        start: usize,
        delete_count: usize,
        data: &[u8],
    ) -> Result<EncodedLengths, StoreError> {
        let lengths = self.plan_splice_dynamic(table, key, index, start, delete_count, data)?;
        self.materialize(table, key)?;

        let mut field = self.get_dynamic_field(table, key, index)?;
        splice_bytes(&mut field, start, delete_count, data);
        self.write_dynamic_field(table, key, index, field);
        self.write_region(table, key, Region::EncodedLengths, lengths.to_word().to_vec());
        Ok(lengths)
    }

    /// Clear every region of the record. Deleting an absent record is a no-op.
    pub fn delete_record(&mut self, table: TableId, key: &KeyTuple) -> Result<(), StoreError> {
        let num_dynamic = self.field_layout(table)?.num_dynamic_fields();
        if !self.record_exists(table, key)? {
            return Ok(());
        }
        self.clear_region(table, key, Region::Static);
        self.clear_region(table, key, Region::EncodedLengths);
        for i in 0..num_dynamic {
            self.clear_region(table, key, Region::Dynamic(i as u8));
        }
        Ok(())
    }
}
