use crate::error::StoreError;
use crate::types::Word;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

pub const MAX_TOTAL_FIELDS: usize = 28;
pub const MAX_DYNAMIC_FIELDS: usize = 5;
pub const MAX_STATIC_FIELD_LENGTH: usize = 32;

// ─── Binary Layout ──────────────────────────────────────────────────────────
//
//  ┌──────────────────────────────────────────────┐
//  │ static data length:   u16 (BE)     bytes 0-1 │
//  │ static field count:   u8           byte 2    │
//  │ dynamic field count:  u8           byte 3    │
//  │ static field lengths: u8 × count   bytes 4.. │
//  └──────────────────────────────────────────────┘

const LENGTHS_START: usize = 4;

/// Shape of a table's records: widths of the static fields and the number of
/// dynamic fields. Immutable once a table is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldLayoutRepr")]
pub struct FieldLayout {
    static_lengths: ArrayVec<u8, MAX_TOTAL_FIELDS>,
    num_dynamic: u8,
}

/// Unchecked serde shape; converted through [`FieldLayout::new`].
#[derive(Deserialize)]
struct FieldLayoutRepr {
    static_lengths: Vec<usize>,
    num_dynamic: usize,
}

impl TryFrom<FieldLayoutRepr> for FieldLayout {
    type Error = StoreError;

    fn try_from(repr: FieldLayoutRepr) -> Result<Self, Self::Error> {
        FieldLayout::new(&repr.static_lengths, repr.num_dynamic)
    }
}

impl FieldLayout {
    pub fn new(static_lengths: &[usize], num_dynamic_fields: usize) -> Result<Self, StoreError> {
        if static_lengths.len() + num_dynamic_fields > MAX_TOTAL_FIELDS {
            return Err(StoreError::InvalidFieldLayout("more than 28 fields"));
        }
        if num_dynamic_fields > MAX_DYNAMIC_FIELDS {
            return Err(StoreError::InvalidFieldLayout("more than 5 dynamic fields"));
        }
        let mut lengths = ArrayVec::new();
        for &len in static_lengths {
            if len == 0 {
                return Err(StoreError::InvalidFieldLayout("static field of length zero"));
            }
            if len > MAX_STATIC_FIELD_LENGTH {
                return Err(StoreError::InvalidFieldLayout("static field wider than a word"));
            }
            lengths.push(len as u8);
        }
        Ok(Self {
            static_lengths: lengths,
            num_dynamic: num_dynamic_fields as u8,
        })
    }

    #[inline]
    pub fn static_data_length(&self) -> usize {
        self.static_lengths.iter().map(|l| *l as usize).sum()
    }

    #[inline]
    pub fn num_static_fields(&self) -> usize {
        self.static_lengths.len()
    }

    #[inline]
    pub fn num_dynamic_fields(&self) -> usize {
        self.num_dynamic as usize
    }

    #[inline]
    pub fn num_fields(&self) -> usize {
        self.num_static_fields() + self.num_dynamic_fields()
    }

    pub fn static_field_length(&self, index: usize) -> Option<usize> {
        self.static_lengths.get(index).map(|l| *l as usize)
    }

    /// Byte offset of a static field within the static region.
    pub fn static_field_offset(&self, index: usize) -> Option<usize> {
        if index >= self.static_lengths.len() {
            return None;
        }
        Some(self.static_lengths[..index].iter().map(|l| *l as usize).sum())
    }

    pub fn encode(&self) -> Word {
        let mut word = [0u8; 32];
        word[0..2].copy_from_slice(&(self.static_data_length() as u16).to_be_bytes());
        word[2] = self.static_lengths.len() as u8;
        word[3] = self.num_dynamic;
        word[LENGTHS_START..LENGTHS_START + self.static_lengths.len()]
            .copy_from_slice(&self.static_lengths);
        word
    }

    pub fn decode(word: &Word) -> Result<Self, StoreError> {
        let num_static = word[2] as usize;
        let num_dynamic = word[3] as usize;
        if num_static + num_dynamic > MAX_TOTAL_FIELDS {
            return Err(StoreError::InvalidFieldLayout("more than 28 fields"));
        }
        let lengths: Vec<usize> = word[LENGTHS_START..LENGTHS_START + num_static]
            .iter()
            .map(|b| *b as usize)
            .collect();
        if word[LENGTHS_START + num_static..].iter().any(|b| *b != 0) {
            return Err(StoreError::InvalidFieldLayout("trailing bytes after static lengths"));
        }
        let layout = Self::new(&lengths, num_dynamic)?;
        let declared = u16::from_be_bytes([word[0], word[1]]) as usize;
        if declared != layout.static_data_length() {
            return Err(StoreError::InvalidFieldLayout("static length does not match fields"));
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_and_lengths() {
        let layout = FieldLayout::new(&[1, 32, 4], 2).unwrap();
        assert_eq!(layout.static_data_length(), 37);
        assert_eq!(layout.num_fields(), 5);
        assert_eq!(layout.static_field_offset(0), Some(0));
        assert_eq!(layout.static_field_offset(2), Some(33));
        assert_eq!(layout.static_field_offset(3), None);
        assert_eq!(layout.static_field_length(1), Some(32));
    }

    #[test]
    fn word_encoding_matches_wire_format() {
        let layout = FieldLayout::new(&[8, 20], 1).unwrap();
        let word = layout.encode();
        assert_eq!(&word[..6], &[0, 28, 2, 1, 8, 20]);
        assert!(word[6..].iter().all(|b| *b == 0));
        assert_eq!(FieldLayout::decode(&word).unwrap(), layout);
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(FieldLayout::new(&[0], 0).is_err());
        assert!(FieldLayout::new(&[33], 0).is_err());
        assert!(FieldLayout::new(&[], 6).is_err());
        assert!(FieldLayout::new(&[1; 24], 5).is_err());
        assert!(FieldLayout::new(&[1; 23], 5).is_ok());
        assert!(FieldLayout::new(&[], 0).is_ok());
    }

    #[test]
    fn decode_rejects_inconsistent_total() {
        let mut word = FieldLayout::new(&[4], 0).unwrap().encode();
        word[1] = 5;
        assert!(matches!(
            FieldLayout::decode(&word),
            Err(StoreError::InvalidFieldLayout(_))
        ));
    }

    #[test]
    fn deserialize_runs_layout_checks() {
        let layout = FieldLayout::new(&[4, 2], 1).unwrap();
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(serde_json::from_str::<FieldLayout>(&json).unwrap(), layout);

        for bad in [
            r#"{"static_lengths":[0,0],"num_dynamic":9}"#,
            r#"{"static_lengths":[33],"num_dynamic":0}"#,
            r#"{"static_lengths":[1],"num_dynamic":6}"#,
        ] {
            assert!(serde_json::from_str::<FieldLayout>(bad).is_err(), "{bad}");
        }
    }
}
