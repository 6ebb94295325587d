use super::field_layout::MAX_DYNAMIC_FIELDS;
use crate::error::StoreError;
use crate::types::Word;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Largest byte length a single dynamic field may have (40 bits).
pub const MAX_FIELD_LENGTH: u64 = (1 << 40) - 1;

// ─── Packed Word ────────────────────────────────────────────────────────────
//
//  bytes  0..5   field 4 length (40 bit BE)
//  bytes  5..10  field 3 length
//  bytes 10..15  field 2 length
//  bytes 15..20  field 1 length
//  bytes 20..25  field 0 length
//  bytes 25..32  total length   (56 bit BE)

const TOTAL_START: usize = 25;
const SLOT_LEN: usize = 5;

#[inline]
fn slot_range(i: usize) -> std::ops::Range<usize> {
    let end = TOTAL_START - SLOT_LEN * i;
    end - SLOT_LEN..end
}

/// Byte length of every dynamic field of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodedLengthsRepr")]
pub struct EncodedLengths {
    lengths: ArrayVec<u64, MAX_DYNAMIC_FIELDS>,
}

#[derive(Deserialize)]
struct EncodedLengthsRepr {
    lengths: Vec<u64>,
}

impl TryFrom<EncodedLengthsRepr> for EncodedLengths {
    type Error = StoreError;

    fn try_from(repr: EncodedLengthsRepr) -> Result<Self, Self::Error> {
        EncodedLengths::new(&repr.lengths)
    }
}

impl EncodedLengths {
    pub fn new(lengths: &[u64]) -> Result<Self, StoreError> {
        if lengths.len() > MAX_DYNAMIC_FIELDS {
            return Err(StoreError::InvalidEncodedLengths("more than 5 dynamic fields"));
        }
        if lengths.iter().any(|l| *l > MAX_FIELD_LENGTH) {
            return Err(StoreError::InvalidEncodedLengths("field length exceeds 40 bits"));
        }
        Ok(Self {
            lengths: lengths.iter().copied().collect(),
        })
    }

    /// All-zero lengths for `num_fields` dynamic fields.
    pub fn zeroed(num_fields: usize) -> Self {
        Self {
            lengths: std::iter::repeat_n(0, num_fields.min(MAX_DYNAMIC_FIELDS)).collect(),
        }
    }

    pub fn from_fields(fields: &[&[u8]]) -> Result<Self, StoreError> {
        let lengths: Vec<u64> = fields.iter().map(|f| f.len() as u64).collect();
        Self::new(&lengths)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<u64> {
        self.lengths.get(index).copied()
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.lengths.iter().sum()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.lengths
    }

    /// Byte offset of a dynamic field within the concatenated dynamic data.
    pub fn offset_of(&self, index: usize) -> Option<u64> {
        if index >= self.lengths.len() {
            return None;
        }
        Some(self.lengths[..index].iter().sum())
    }

    /// Copy with field `index` set to `length`.
    pub fn with_length(&self, index: usize, length: u64) -> Result<Self, StoreError> {
        if index >= self.lengths.len() {
            return Err(StoreError::FieldIndexOutOfRange {
                field_index: index,
                field_count: self.lengths.len(),
            });
        }
        if length > MAX_FIELD_LENGTH {
            return Err(StoreError::InvalidEncodedLengths("field length exceeds 40 bits"));
        }
        let mut next = self.clone();
        next.lengths[index] = length;
        Ok(next)
    }

    pub fn to_word(&self) -> Word {
        let mut word = [0u8; 32];
        word[TOTAL_START..].copy_from_slice(&self.total().to_be_bytes()[1..]);
        for (i, len) in self.lengths.iter().enumerate() {
            word[slot_range(i)].copy_from_slice(&len.to_be_bytes()[3..]);
        }
        word
    }

    pub fn from_word(word: &Word, num_fields: usize) -> Result<Self, StoreError> {
        if num_fields > MAX_DYNAMIC_FIELDS {
            return Err(StoreError::InvalidEncodedLengths("more than 5 dynamic fields"));
        }
        let mut lengths = ArrayVec::new();
        for i in 0..MAX_DYNAMIC_FIELDS {
            let mut buf = [0u8; 8];
            buf[3..].copy_from_slice(&word[slot_range(i)]);
            let len = u64::from_be_bytes(buf);
            if i < num_fields {
                lengths.push(len);
            } else if len != 0 {
                return Err(StoreError::InvalidEncodedLengths("length set for unused field"));
            }
        }
        let mut total = [0u8; 8];
        total[1..].copy_from_slice(&word[TOTAL_START..]);
        let decoded = Self { lengths };
        if u64::from_be_bytes(total) != decoded.total() {
            return Err(StoreError::InvalidEncodedLengths("total does not match field lengths"));
        }
        Ok(decoded)
    }
}
