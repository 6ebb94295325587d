use super::Store;
use crate::error::StoreError;
use crate::types::{KeyTuple, TableId};

/// Field-granular helpers. Writes go through the splice primitives, so they
/// trigger the splice hooks rather than the set-record ones.
impl Store {
    // ════════════════════════════════════════════════════════════════════════
    // Writes
    // ════════════════════════════════════════════════════════════════════════

    /// Overwrite static field `index`; `data` must match the field's width.
    pub fn set_static_field(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
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
        if data.len() != len {
            return Err(StoreError::LayoutMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        self.splice_static_data(table, key_tuple, offset, len, data)
    }

    /// Replace the whole content of dynamic field `index`.
    pub fn set_dynamic_field(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let current = self.get_dynamic_field_length(table, key_tuple, index)? as usize;
        self.splice_dynamic_data(table, key_tuple, index, 0, current, data)
    }

    /// Write field `field_index`, counted over static then dynamic fields.
    pub fn set_field(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        field_index: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let layout = self.field_layout(table)?;
        let num_static = layout.num_static_fields();
        let num_fields = layout.num_fields();
        if field_index < num_static {
            self.set_static_field(table, key_tuple, field_index, data)
        } else if field_index < num_fields {
            self.set_dynamic_field(table, key_tuple, field_index - num_static, data)
        } else {
            Err(StoreError::FieldIndexOutOfRange {
                field_index,
                field_count: num_fields,
            })
        }
    }

    /// Append `data` to the end of dynamic field `index`.
    pub fn push_to_dynamic_field(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let current = self.get_dynamic_field_length(table, key_tuple, index)? as usize;
        self.splice_dynamic_data(table, key_tuple, index, current, 0, data)
    }

    /// Remove the last `byte_count` bytes of dynamic field `index`.
    pub fn pop_from_dynamic_field(
        &mut self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
        byte_count: usize,
    ) -> Result<(), StoreError> {
        let current = self.get_dynamic_field_length(table, key_tuple, index)? as usize;
        let Some(start) = current.checked_sub(byte_count) else {
            return Err(StoreError::OutOfBounds {
                start: 0,
                end: byte_count,
                length: current,
            });
        };
        self.splice_dynamic_data(table, key_tuple, index, start, byte_count, &[])
    }

    // ════════════════════════════════════════════════════════════════════════
    // Reads
    // ════════════════════════════════════════════════════════════════════════

    pub fn get_field(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        field_index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        self.records.get_field(table, key_tuple, field_index)
    }

    pub fn get_static_field(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        self.records.get_static_field(table, key_tuple, index)
    }

    pub fn get_dynamic_field(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
    ) -> Result<Vec<u8>, StoreError> {
        self.records.get_dynamic_field(table, key_tuple, index)
    }

    pub fn get_dynamic_field_slice(
        &self,
        table: TableId,
        key_tuple: &KeyTuple,
        index: usize,
        start: usize,
        end: usize,
    ) -> Result<Vec<u8>, StoreError> {
        self.records
            .get_dynamic_field_slice(table, key_tuple, index, start, end)
    }
}
