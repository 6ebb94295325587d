// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════
use super::*;
use crate::backend::MemoryBackend;
use crate::layout::EncodedLengths;
use crate::types::KeyTuple;

fn table() -> TableId {
    TableId::new("test", "Items").unwrap()
}

/// 8-byte static region split as 4 + 4, two dynamic fields.
fn make_store() -> RecordStore {
    let mut store = RecordStore::open(Box::new(MemoryBackend::new())).unwrap();
    store
        .register_table(table(), FieldLayout::new(&[4, 4], 2).unwrap())
        .unwrap();
    store
}

fn key(n: u64) -> KeyTuple {
    KeyTuple::from_u64s(&[n])
}

fn set_sample(store: &mut RecordStore, k: &KeyTuple) {
    let lengths = EncodedLengths::from_fields(&[b"hello", b"ab"]).unwrap();
    store
        .set_record(table(), k, &[1, 2, 3, 4, 5, 6, 7, 8], &lengths, b"helloab")
        .unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
// setRecord
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_set_record_reads_back_exactly() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    assert_eq!(store.get_static_data(table(), &k).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(store.get_dynamic_data(table(), &k).unwrap(), b"helloab");
    assert_eq!(store.get_dynamic_field(table(), &k, 0).unwrap(), b"hello");
    assert_eq!(store.get_dynamic_field(table(), &k, 1).unwrap(), b"ab");
    assert_eq!(store.get_dynamic_field_length(table(), &k, 0).unwrap(), 5);
    assert_eq!(store.get_dynamic_field_length(table(), &k, 1).unwrap(), 2);

    let record = store.get_record(table(), &k).unwrap();
    assert_eq!(record.encoded_lengths.as_slice(), &[5, 2]);
    let fields: Vec<&[u8]> = record.dynamic_fields().collect();
    assert_eq!(fields, vec![&b"hello"[..], &b"ab"[..]]);
}

#[test]
fn test_set_record_overwrites_in_place() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    let lengths = EncodedLengths::from_fields(&[b"", b"xyz"]).unwrap();
    store.set_record(table(), &k, &[0; 8], &lengths, b"xyz").unwrap();
    assert_eq!(store.get_dynamic_field(table(), &k, 0).unwrap(), b"");
    assert_eq!(store.get_dynamic_data(table(), &k).unwrap(), b"xyz");
}

#[test]
fn test_set_record_layout_checks() {
    let mut store = make_store();
    let k = key(1);
    let lengths = EncodedLengths::from_fields(&[b"a", b"b"]).unwrap();

    let err = store.set_record(table(), &k, &[0; 7], &lengths, b"ab").unwrap_err();
    assert!(matches!(err, StoreError::LayoutMismatch { expected: 8, actual: 7 }));

    let one_field = EncodedLengths::from_fields(&[b"ab"]).unwrap();
    let err = store.set_record(table(), &k, &[0; 8], &one_field, b"ab").unwrap_err();
    assert!(matches!(
        err,
        StoreError::LengthEncodingMismatch { expected: 2, actual: 1 }
    ));

    let err = store.set_record(table(), &k, &[0; 8], &lengths, b"abc").unwrap_err();
    assert!(matches!(err, StoreError::LengthEncodingMismatch { .. }));

    assert!(!store.record_exists(table(), &k).unwrap());
}

#[test]
fn test_unknown_table() {
    let mut store = make_store();
    let other = TableId::new("test", "Missing").unwrap();
    let err = store.delete_record(other, &key(1)).unwrap_err();
    assert!(matches!(err, StoreError::TableNotFound(t) if t == other));
}

// ═══════════════════════════════════════════════════════════════════════
// spliceStaticData
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_splice_static_preserves_length() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    store.splice_static_data(table(), &k, 2, 3, &[9, 9, 9]).unwrap();
    assert_eq!(store.get_static_data(table(), &k).unwrap(), vec![1, 2, 9, 9, 9, 6, 7, 8]);
}

#[test]
fn test_splice_static_length_change_rejected() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    let err = store.splice_static_data(table(), &k, 0, 4, &[1, 2, 3]).unwrap_err();
    assert!(matches!(
        err,
        StoreError::StaticLengthInvariantViolated { delete_count: 4, inserted: 3 }
    ));
    assert_eq!(store.get_static_data(table(), &k).unwrap().len(), 8);
}

#[test]
fn test_splice_static_out_of_bounds() {
    let mut store = make_store();
    let k = key(1);
    let err = store.splice_static_data(table(), &k, 6, 3, &[0; 3]).unwrap_err();
    assert!(matches!(err, StoreError::OutOfBounds { start: 6, end: 9, length: 8 }));
}

#[test]
fn test_splice_static_creates_zeroed_record() {
    let mut store = make_store();
    let k = key(7);
    store.splice_static_data(table(), &k, 4, 2, &[0xAA, 0xBB]).unwrap();
    assert!(store.record_exists(table(), &k).unwrap());
    assert_eq!(store.get_static_data(table(), &k).unwrap(), vec![0, 0, 0, 0, 0xAA, 0xBB, 0, 0]);
}

// ═══════════════════════════════════════════════════════════════════════
// spliceDynamicData
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_splice_dynamic_matches_direct_set() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    let lengths = store.splice_dynamic_data(table(), &k, 0, 1, 3, b"EY!!").unwrap();
    assert_eq!(lengths.as_slice(), &[6, 2]);
    assert_eq!(store.get_dynamic_field(table(), &k, 0).unwrap(), b"hEY!!o");

    // Same final bytes written directly under another key.
    let direct = key(2);
    let direct_lengths = EncodedLengths::from_fields(&[b"hEY!!o", b"ab"]).unwrap();
    store
        .set_record(table(), &direct, &[1, 2, 3, 4, 5, 6, 7, 8], &direct_lengths, b"hEY!!oab")
        .unwrap();
    assert_eq!(
        store.get_record(table(), &k).unwrap(),
        store.get_record(table(), &direct).unwrap()
    );
}

#[test]
fn test_splice_dynamic_shrink_to_empty() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    store.splice_dynamic_data(table(), &k, 1, 0, 2, b"").unwrap();
    assert_eq!(store.get_dynamic_field_length(table(), &k, 1).unwrap(), 0);
    assert_eq!(store.get_dynamic_data(table(), &k).unwrap(), b"hello");
    assert_eq!(store.get_encoded_lengths(table(), &k).unwrap().total(), 5);
}

#[test]
fn test_splice_dynamic_errors() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    let err = store.splice_dynamic_data(table(), &k, 2, 0, 0, b"x").unwrap_err();
    assert!(matches!(
        err,
        StoreError::FieldIndexOutOfRange { field_index: 2, field_count: 2 }
    ));

    let err = store.splice_dynamic_data(table(), &k, 1, 1, 2, b"").unwrap_err();
    assert!(matches!(err, StoreError::OutOfBounds { start: 1, end: 3, length: 2 }));
}

#[test]
fn test_splice_dynamic_appends_to_absent_record() {
    let mut store = make_store();
    let k = key(3);
    store.splice_dynamic_data(table(), &k, 1, 0, 0, b"tail").unwrap();
    assert!(store.record_exists(table(), &k).unwrap());
    assert_eq!(store.get_static_data(table(), &k).unwrap(), vec![0; 8]);
    assert_eq!(store.get_encoded_lengths(table(), &k).unwrap().as_slice(), &[0, 4]);
}

// ═══════════════════════════════════════════════════════════════════════
// deleteRecord and reads
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_delete_is_idempotent() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    store.delete_record(table(), &k).unwrap();
    assert!(!store.record_exists(table(), &k).unwrap());
    let layout = store.field_layout(table()).unwrap().clone();
    assert_eq!(store.get_record(table(), &k).unwrap(), Record::empty(&layout));

    store.delete_record(table(), &k).unwrap();
    assert!(matches!(
        store.require_record(table(), &k),
        Err(StoreError::RecordNotFound { .. })
    ));
}

#[test]
fn test_field_accessors() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    assert_eq!(store.get_field(table(), &k, 1).unwrap(), vec![5, 6, 7, 8]);
    assert_eq!(store.get_field(table(), &k, 2).unwrap(), b"hello");
    assert_eq!(store.get_field_length(table(), &k, 0).unwrap(), 4);
    assert_eq!(store.get_field_length(table(), &k, 3).unwrap(), 2);
    assert!(matches!(
        store.get_field(table(), &k, 4),
        Err(StoreError::FieldIndexOutOfRange { field_index: 4, field_count: 4 })
    ));
    assert_eq!(
        store.get_dynamic_field_slice(table(), &k, 0, 1, 4).unwrap(),
        b"ell"
    );
    assert!(matches!(
        store.get_dynamic_field_slice(table(), &k, 0, 2, 9),
        Err(StoreError::OutOfBounds { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Write set and tables
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_rollback_and_commit() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);
    store.commit().unwrap();
    assert!(!store.has_pending_writes());

    let sp = store.savepoint();
    store.delete_record(table(), &k).unwrap();
    assert!(!store.record_exists(table(), &k).unwrap());
    store.rollback_to(sp);
    assert!(store.record_exists(table(), &k).unwrap());

    store.splice_static_data(table(), &k, 0, 1, &[42]).unwrap();
    store.discard();
    assert_eq!(store.get_static_data(table(), &k).unwrap()[0], 1);
}

#[test]
fn test_drop_table_removes_records_and_schema() {
    let mut store = make_store();
    let k = key(1);
    set_sample(&mut store, &k);

    assert!(matches!(
        store.drop_table(table()),
        Err(StoreError::SchemaLocked(_))
    ));
    store.commit().unwrap();
    store.drop_table(table()).unwrap();
    assert!(!store.has_table(table()));

    store
        .register_table(table(), FieldLayout::new(&[4, 4], 2).unwrap())
        .unwrap();
    assert!(!store.record_exists(table(), &k).unwrap());
    assert!(matches!(
        store.register_table(table(), FieldLayout::new(&[1], 0).unwrap()),
        Err(StoreError::TableAlreadyExists(_))
    ));
}
