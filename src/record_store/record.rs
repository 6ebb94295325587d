use crate::layout::{EncodedLengths, FieldLayout};

/// Full contents of one record: static region, dynamic field lengths and the
/// concatenated dynamic fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub static_data: Vec<u8>,
    pub encoded_lengths: EncodedLengths,
    pub dynamic_data: Vec<u8>,
}

impl Record {
    /// The zero value a read of an absent record yields.
    pub fn empty(layout: &FieldLayout) -> Self {
        Self {
            static_data: vec![0; layout.static_data_length()],
            encoded_lengths: EncodedLengths::zeroed(layout.num_dynamic_fields()),
            dynamic_data: Vec::new(),
        }
    }

    /// Bytes of dynamic field `index`, sliced out of `dynamic_data`.
    pub fn dynamic_field(&self, index: usize) -> Option<&[u8]> {
        let start = self.encoded_lengths.offset_of(index)? as usize;
        let len = self.encoded_lengths.get(index)? as usize;
        self.dynamic_data.get(start..start + len)
    }

    /// Iterate over all dynamic fields in order.
    pub fn dynamic_fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.encoded_lengths.len()).filter_map(|i| self.dynamic_field(i))
    }
}
