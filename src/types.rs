use crate::error::StoreError;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;

pub type FastMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A 32-byte storage word. Keys, table ids and packed schema words all use it.
pub type Word = [u8; 32];

// ─── Resource Id Layout ─────────────────────────────────────────────────────
//
//  ┌──────────┬──────────────────────┬──────────────────────────┐
//  │ type (2) │ namespace (14)       │ name (16)                │
//  └──────────┴──────────────────────┴──────────────────────────┘
//
//  Namespace and name are right-padded with zero bytes.

pub const RESOURCE_TYPE_TABLE: [u8; 2] = *b"tb";
pub const NAMESPACE_LEN: usize = 14;
pub const NAME_LEN: usize = 16;

const NAMESPACE_START: usize = 2;
const NAME_START: usize = NAMESPACE_START + NAMESPACE_LEN;

// ─── TableId ────────────────────────────────────────────────────────────────

/// Globally unique handle naming a table (namespace + name).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Word")]
pub struct TableId(Word);

impl TryFrom<Word> for TableId {
    type Error = StoreError;

    fn try_from(word: Word) -> Result<Self, Self::Error> {
        TableId::from_word(word)
    }
}

impl TableId {
    pub fn new(namespace: &str, name: &str) -> Result<Self, StoreError> {
        if namespace.len() > NAMESPACE_LEN {
            return Err(StoreError::InvalidResourceId(format!(
                "namespace {namespace:?} longer than {NAMESPACE_LEN} bytes"
            )));
        }
        if name.len() > NAME_LEN {
            return Err(StoreError::InvalidResourceId(format!(
                "name {name:?} longer than {NAME_LEN} bytes"
            )));
        }
        if name.is_empty() {
            return Err(StoreError::InvalidResourceId("empty table name".into()));
        }
        let mut word = [0u8; 32];
        word[..NAMESPACE_START].copy_from_slice(&RESOURCE_TYPE_TABLE);
        word[NAMESPACE_START..NAMESPACE_START + namespace.len()].copy_from_slice(namespace.as_bytes());
        word[NAME_START..NAME_START + name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(word))
    }

    /// Reinterpret a raw resource word. Only table resources are accepted.
    pub fn from_word(word: Word) -> Result<Self, StoreError> {
        if word[..NAMESPACE_START] != RESOURCE_TYPE_TABLE {
            return Err(StoreError::InvalidResourceId(format!(
                "resource type {:02x?} is not a table",
                &word[..NAMESPACE_START]
            )));
        }
        let id = Self(word);
        if id.name().is_empty() {
            return Err(StoreError::InvalidResourceId("empty table name".into()));
        }
        Ok(id)
    }

    #[inline]
    pub fn as_word(&self) -> &Word {
        &self.0
    }

    pub fn namespace(&self) -> SmolStr {
        trimmed(&self.0[NAMESPACE_START..NAME_START])
    }

    pub fn name(&self) -> SmolStr {
        trimmed(&self.0[NAME_START..])
    }
}

fn trimmed(bytes: &[u8]) -> SmolStr {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |p| p + 1);
    SmolStr::new(String::from_utf8_lossy(&bytes[..end]))
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tb:{}:{}", self.namespace(), self.name())
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({self})")
    }
}

// ─── KeyTuple ───────────────────────────────────────────────────────────────

/// Ordered sequence of fixed-width words identifying a record within a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyTuple(Vec<Word>);

impl KeyTuple {
    pub fn new(words: Vec<Word>) -> Self {
        Self(words)
    }

    /// Each integer becomes one big-endian, right-aligned word.
    pub fn from_u64s(values: &[u64]) -> Self {
        Self(values.iter().map(|v| word_from_u64(*v)).collect())
    }

    #[inline]
    pub fn as_slice(&self) -> &[Word] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length-prefixed so that no tuple's encoding is a prefix of another's.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.0.len() as u32).to_be_bytes());
        for word in &self.0 {
            out.extend_from_slice(word);
        }
    }
}

impl From<Vec<Word>> for KeyTuple {
    fn from(words: Vec<Word>) -> Self {
        Self(words)
    }
}

impl FromIterator<Word> for KeyTuple {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[inline]
pub fn word_from_u64(value: u64) -> Word {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_id_packs_namespace_and_name() {
        let id = TableId::new("app", "Balances").unwrap();
        assert_eq!(&id.as_word()[..2], b"tb");
        assert_eq!(&id.as_word()[2..5], b"app");
        assert_eq!(&id.as_word()[16..24], b"Balances");
        assert_eq!(id.namespace(), "app");
        assert_eq!(id.name(), "Balances");
        assert_eq!(id.to_string(), "tb:app:Balances");
        assert_eq!(TableId::from_word(*id.as_word()).unwrap(), id);
    }

    #[test]
    fn table_id_rejects_oversized_parts() {
        assert!(matches!(
            TableId::new("namespace_too_long", "t"),
            Err(StoreError::InvalidResourceId(_))
        ));
        assert!(matches!(
            TableId::new("", "a_name_that_is_too_long"),
            Err(StoreError::InvalidResourceId(_))
        ));
        assert!(TableId::new("", "").is_err());
        assert!(TableId::new("", "Root").is_ok());
    }

    #[test]
    fn from_word_requires_table_type() {
        let mut word = *TableId::new("ns", "t").unwrap().as_word();
        word[..2].copy_from_slice(b"ot");
        assert!(TableId::from_word(word).is_err());
    }

    #[test]
    fn key_tuple_encoding_is_prefix_free() {
        let mut one = Vec::new();
        KeyTuple::from_u64s(&[1]).encode_into(&mut one);
        let mut two = Vec::new();
        KeyTuple::from_u64s(&[1, 2]).encode_into(&mut two);
        assert_eq!(one.len(), 4 + 32);
        assert!(!two.starts_with(&one));
        assert_eq!(word_from_u64(1)[31], 1);
    }

    #[test]
    fn deserialize_rejects_non_table_words() {
        let id = TableId::new("app", "Balances").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<TableId>(&json).unwrap(), id);

        let zeroed = serde_json::to_string(&[0u8; 32]).unwrap();
        assert!(serde_json::from_str::<TableId>(&zeroed).is_err());
    }
}
