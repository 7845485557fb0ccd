use std::sync::Arc;

use heapdb::common::{PageId, PAGE_HEADER_SIZE};
use heapdb::row::{ColumnType, Row, TableSchema, Value};
use heapdb::storage::{DiskManager, HeapPage};

use tempfile::tempdir;

fn order_schema() -> Arc<TableSchema> {
    TableSchema::builder("orders")
        .column("id", ColumnType::Int)
        .column("item", ColumnType::String)
        .column("paid", ColumnType::Boolean)
        .column("total", ColumnType::Double)
        .build_arc()
}

fn order(schema: &Arc<TableSchema>, id: i32, item: &str, paid: bool, total: f64) -> Row {
    Row::new(
        Arc::clone(schema),
        vec![
            Value::Int(id),
            Value::String(item.to_string()),
            Value::Boolean(paid),
            Value::Double(total),
        ],
    )
    .unwrap()
}

/// A slot is a 1-byte flag followed by the encoded row; this is the shape
/// TableFile writes. Build a few by hand, push them through a page and the
/// disk manager, and walk them back with the codec.
#[test]
fn test_rows_through_page_and_disk() {
    let dir = tempdir().unwrap();
    let dm = DiskManager::new(dir.path().join("orders.tbl")).unwrap();
    let schema = order_schema();

    let rows = vec![
        order(&schema, 1, "keyboard", true, 59.99),
        order(&schema, 2, "a much longer item description", false, 120.0),
        order(&schema, 3, "mug", true, 8.5),
    ];

    let mut page = HeapPage::new();
    for row in &rows {
        let mut slot = vec![0u8];
        slot.extend_from_slice(&row.encode().unwrap());
        assert!(page.try_append(&slot));
    }
    dm.write_page(PageId::new(0), &page).unwrap();

    let read = dm.read_page(PageId::new(0)).unwrap();
    assert_eq!(read.row_count(), 3);

    let data = read.data();
    let end = read.free_offset() as usize;
    let mut pos = PAGE_HEADER_SIZE;
    for expected in &rows {
        assert_eq!(data[pos], 0, "slot flag");
        let mut buf = &data[pos + 1..end];
        let before = buf.len();
        let row = Row::decode(&mut buf, &schema).unwrap();
        assert_eq!(&row, expected);
        pos += 1 + (before - buf.len());
    }
    assert_eq!(pos, end, "walk must land exactly on the free offset");
}

/// `encoded_len` must step over a slot without decoding it, landing on the
/// next slot's flag byte.
#[test]
fn test_encoded_len_walks_variable_slots() {
    let schema = order_schema();
    let first = order(&schema, 10, "short", true, 1.0);
    let second = order(&schema, 11, "a longer item string than the first", false, 2.0);

    let mut page = HeapPage::new();
    for row in [&first, &second] {
        let mut slot = vec![0u8];
        slot.extend_from_slice(&row.encode().unwrap());
        assert!(page.try_append(&slot));
    }

    let data = page.data();
    let end = page.free_offset() as usize;
    let skipped = Row::encoded_len(&data[PAGE_HEADER_SIZE + 1..end], &schema).unwrap();

    let second_pos = PAGE_HEADER_SIZE + 1 + skipped;
    let mut buf = &data[second_pos + 1..end];
    assert_eq!(Row::decode(&mut buf, &schema).unwrap(), second);
}

#[test]
fn test_decode_rejects_garbage() {
    let schema = order_schema();

    // a string length prefix pointing far past the buffer
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&7i32.to_be_bytes());
    bytes.extend_from_slice(&1_000_000i32.to_be_bytes());
    let mut buf = bytes.as_slice();
    assert!(Row::decode(&mut buf, &schema).is_err());

    // an empty buffer
    let mut buf: &[u8] = &[];
    assert!(Row::decode(&mut buf, &schema).is_err());
    assert!(Row::encoded_len(&[], &schema).is_err());
}
