mod encoded_lengths;
mod field_layout;

pub use encoded_lengths::{EncodedLengths, MAX_FIELD_LENGTH};
pub use field_layout::{FieldLayout, MAX_DYNAMIC_FIELDS, MAX_STATIC_FIELD_LENGTH, MAX_TOTAL_FIELDS};
