use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::{
    DatabaseError, PageId, Result, RowLocation, MAX_SLOT_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE,
};
use crate::row::{Row, TableSchema, Value};
use crate::storage::disk::DiskManager;
use crate::storage::page::HeapPage;

/// Tombstone flag values. The flag is the first byte of every row slot;
/// nothing below this module knows it exists.
const LIVE_FLAG: u8 = 0;
const TOMBSTONE_FLAG: u8 = 1;

/// One table backed by one heap file.
///
/// TableFile owns the disk manager, the in-memory primary-key index, and
/// the insert/update/delete/find/scan/compact algorithms. The heap is
/// append-only: a live slot's bytes are never overwritten except for the
/// in-place tombstone flip, and reclaimed space only ever comes back
/// through [`compact`](TableFile::compact).
///
/// A key moves through ABSENT -> LIVE on insert, LIVE -> DELETED on
/// delete, and DELETED -> LIVE again on re-insert, which appends a fresh
/// slot rather than reviving the old one. Update is a logical delete
/// followed by a fresh insert, since variable-length rows cannot safely be
/// rewritten in place.
pub struct TableFile {
    schema: Arc<TableSchema>,
    disk: DiskManager,
    path: PathBuf,
    pk_index: HashMap<Value, RowLocation>,
    deleted_keys: HashSet<Value>,
}

impl TableFile {
    /// Opens (creating if absent) the table file at `path` and rebuilds the
    /// primary-key index by scanning every page. The rebuilt index matches
    /// what incremental maintenance across the file's whole history would
    /// have produced.
    pub fn open<P: AsRef<Path>>(schema: Arc<TableSchema>, path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let disk = DiskManager::new(&path)?;
        let mut table = Self {
            schema,
            disk,
            path,
            pk_index: HashMap::new(),
            deleted_keys: HashSet::new(),
        };
        table.rebuild_index()?;
        Ok(table)
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let Self {
            disk,
            schema,
            pk_index,
            deleted_keys,
            ..
        } = self;

        // Later slots win: a key's last slot decides both its location and
        // its deleted state.
        Self::scan_slots(disk, schema, |page_id, row_index, flag, row| {
            let key = row.primary_key().clone();
            pk_index.insert(key.clone(), RowLocation::new(page_id, row_index));
            if flag == TOMBSTONE_FLAG {
                deleted_keys.insert(key);
            } else {
                deleted_keys.remove(&key);
            }
        })?;

        tracing::debug!(
            "opened table {}: {} keys indexed, {} tombstoned",
            self.schema.table_name(),
            self.pk_index.len(),
            self.deleted_keys.len()
        );
        Ok(())
    }

    /// Walks every slot of every page in write order, handing
    /// `(page, row index, tombstone flag, row)` to `visit`.
    fn scan_slots(
        disk: &DiskManager,
        schema: &Arc<TableSchema>,
        mut visit: impl FnMut(PageId, u32, u8, Row),
    ) -> Result<()> {
        for page_no in 0..disk.page_count()? {
            let page_id = PageId::new(page_no);
            let page = disk.read_page(page_id)?;
            let data = page.data();
            let end = page.free_offset() as usize;
            if end > PAGE_SIZE {
                return Err(DatabaseError::MalformedSlot(format!(
                    "free offset {} exceeds page size in {}",
                    end, page_id
                )));
            }

            let mut pos = PAGE_HEADER_SIZE;
            for row_index in 0..page.row_count() {
                if pos >= end {
                    return Err(DatabaseError::MalformedSlot(format!(
                        "slot {} overruns {}",
                        row_index, page_id
                    )));
                }
                let flag = data[pos];
                let mut buf = &data[pos + 1..end];
                let before = buf.len();
                let row = Row::decode(&mut buf, schema)?;
                pos += 1 + (before - buf.len());
                visit(page_id, row_index, flag, row);
            }
        }
        Ok(())
    }

    /// Inserts a row. Fails with `PrimaryKeyViolation` when the key is
    /// already live; a previously deleted key gets a fresh slot.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        let key = row.primary_key().clone();
        if self.is_live(&key) {
            return Err(DatabaseError::PrimaryKeyViolation(key));
        }

        // A re-inserted key must not keep pointing at its dead slot.
        if self.deleted_keys.remove(&key) {
            self.pk_index.remove(&key);
        }

        self.append_row(&row)?;
        Ok(())
    }

    /// Replaces the row stored under `key`. Returns `Ok(false)` when the
    /// key is absent or deleted; fails with `PrimaryKeyImmutable` when the
    /// new row carries a different key. The replacement lands in a freshly
    /// appended slot and the index follows it there.
    pub fn update(&mut self, key: &Value, new_row: Row) -> Result<bool> {
        if !self.is_live(key) {
            return Ok(false);
        }
        if new_row.primary_key() != key {
            return Err(DatabaseError::PrimaryKeyImmutable {
                expected: key.clone(),
                actual: new_row.primary_key().clone(),
            });
        }

        self.delete(key)?;
        self.insert(new_row)?;
        Ok(true)
    }

    /// Soft-deletes the row stored under `key` by flipping its slot's
    /// tombstone byte in place. Returns `Ok(false)` when the key is absent
    /// or already deleted. The index entry stays, pointing at the dead
    /// slot, until a re-insert replaces it.
    pub fn delete(&mut self, key: &Value) -> Result<bool> {
        if !self.is_live(key) {
            return Ok(false);
        }

        let location = self.pk_index[key];
        let mut page = self.disk.read_page(location.page_id)?;
        let offset = self.slot_offset(&page, location)?;
        page.data_mut()[offset] = TOMBSTONE_FLAG;
        self.disk.write_page(location.page_id, &page)?;

        self.deleted_keys.insert(key.clone());
        Ok(true)
    }

    /// Looks up a single live row by its primary key.
    pub fn find_by_primary_key(&self, key: &Value) -> Result<Option<Row>> {
        if !self.is_live(key) {
            return Ok(None);
        }

        let location = self.pk_index[key];
        let page = self.disk.read_page(location.page_id)?;
        let offset = self.slot_offset(&page, location)?;
        let data = page.data();

        if data[offset] == TOMBSTONE_FLAG {
            // The index said live but the slot disagrees; trust the disk.
            tracing::warn!(
                "key {} indexed as live but slot at {} is tombstoned",
                key,
                location
            );
            return Ok(None);
        }

        let end = (page.free_offset() as usize).min(PAGE_SIZE);
        let mut buf = &data[offset + 1..end];
        let row = Row::decode(&mut buf, &self.schema)?;
        Ok(Some(row))
    }

    /// Returns every live row in (page, slot) write order. This full
    /// ascending scan is the only way to enumerate rows.
    pub fn read_all(&self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        Self::scan_slots(&self.disk, &self.schema, |_, _, flag, row| {
            if flag == LIVE_FLAG {
                rows.push(row);
            }
        })?;
        Ok(rows)
    }

    /// Rewrites the heap with only live rows, in scan order, into gapless
    /// pages starting at page 0. Tombstoned slots and their space are gone
    /// afterward; the index is rebuilt against the new layout.
    pub fn compact(&mut self) -> Result<()> {
        let live_rows = self.read_all()?;
        let reclaimed = self.total_row_count()?.saturating_sub(live_rows.len());

        self.pk_index.clear();
        self.deleted_keys.clear();

        // Swap in a truncated file; the old handle closes after the swap so
        // stale tail pages cannot survive.
        let old_disk = std::mem::replace(&mut self.disk, DiskManager::create(&self.path)?);
        old_disk.close()?;

        let mut page = HeapPage::new();
        let mut page_no = 0u32;
        let mut row_index = 0u32;

        for row in &live_rows {
            let slot = Self::encode_slot(row)?;
            if !page.try_append(&slot) {
                self.disk.write_page(PageId::new(page_no), &page)?;
                page_no += 1;
                row_index = 0;
                page = HeapPage::new();
                let appended = page.try_append(&slot);
                debug_assert!(appended, "slot must fit in an empty page");
            }
            self.pk_index.insert(
                row.primary_key().clone(),
                RowLocation::new(PageId::new(page_no), row_index),
            );
            row_index += 1;
        }

        if page.row_count() > 0 {
            self.disk.write_page(PageId::new(page_no), &page)?;
        }

        tracing::info!(
            "compacted table {}: {} live rows kept, {} slots reclaimed",
            self.schema.table_name(),
            live_rows.len(),
            reclaimed
        );
        Ok(())
    }

    /// Number of live rows.
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    /// Number of slots ever written and not yet compacted away, live and
    /// tombstoned alike.
    pub fn total_row_count(&self) -> Result<usize> {
        let mut count = 0usize;
        for page_no in 0..self.disk.page_count()? {
            count += self.disk.read_page(PageId::new(page_no))?.row_count() as usize;
        }
        Ok(count)
    }

    /// Occupancy counts, for deciding when compaction is worthwhile.
    pub fn stats(&self) -> Result<TableStats> {
        let total_rows = self.total_row_count()?;
        let active_rows = self.row_count()?;
        Ok(TableStats {
            total_rows,
            active_rows,
            deleted_rows: total_rows - active_rows,
        })
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the underlying disk manager. No further calls are valid.
    pub fn close(self) -> Result<()> {
        self.disk.close()
    }

    fn is_live(&self, key: &Value) -> bool {
        self.pk_index.contains_key(key) && !self.deleted_keys.contains(key)
    }

    /// Builds the on-page slot for a live row and rejects rows no page
    /// could ever hold.
    fn encode_slot(row: &Row) -> Result<Vec<u8>> {
        let encoded = row.encode()?;
        let mut slot = Vec::with_capacity(1 + encoded.len());
        slot.push(LIVE_FLAG);
        slot.extend_from_slice(&encoded);
        if slot.len() > MAX_SLOT_SIZE {
            return Err(DatabaseError::PageOverflow {
                row_size: slot.len(),
                available: MAX_SLOT_SIZE,
            });
        }
        Ok(slot)
    }

    /// Appends a live slot to the tail page (or a fresh page when the tail
    /// is full or no pages exist) and points the index at it.
    fn append_row(&mut self, row: &Row) -> Result<RowLocation> {
        let slot = Self::encode_slot(row)?;
        let page_count = self.disk.page_count()?;

        let location = if page_count == 0 {
            let mut page = HeapPage::new();
            let appended = page.try_append(&slot);
            debug_assert!(appended, "slot must fit in an empty page");
            self.disk.write_page(PageId::new(0), &page)?;
            RowLocation::new(PageId::new(0), 0)
        } else {
            let last = PageId::new(page_count - 1);
            let mut page = self.disk.read_page(last)?;
            let row_index = page.row_count();
            if page.try_append(&slot) {
                self.disk.write_page(last, &page)?;
                RowLocation::new(last, row_index)
            } else {
                let mut page = HeapPage::new();
                let appended = page.try_append(&slot);
                debug_assert!(appended, "slot must fit in an empty page");
                let fresh = PageId::new(page_count);
                self.disk.write_page(fresh, &page)?;
                RowLocation::new(fresh, 0)
            }
        };

        self.pk_index.insert(row.primary_key().clone(), location);
        Ok(location)
    }

    /// Byte offset of the slot at `location` inside `page`, found by
    /// stepping over each preceding slot's flag byte and encoded row.
    fn slot_offset(&self, page: &HeapPage, location: RowLocation) -> Result<usize> {
        let data = page.data();
        let end = (page.free_offset() as usize).min(PAGE_SIZE);
        let mut pos = PAGE_HEADER_SIZE;
        for _ in 0..location.row_index {
            if pos >= end {
                return Err(DatabaseError::MalformedSlot(format!(
                    "walk overran {} before reaching row {}",
                    location.page_id, location.row_index
                )));
            }
            pos += 1 + Row::encoded_len(&data[pos + 1..end], &self.schema)?;
        }
        if pos >= end {
            return Err(DatabaseError::MalformedSlot(format!(
                "row {} lies past the used bytes of {}",
                location.row_index, location.page_id
            )));
        }
        Ok(pos)
    }
}

/// Occupancy snapshot of one table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub total_rows: usize,
    pub active_rows: usize,
    pub deleted_rows: usize,
}

impl TableStats {
    /// Share of slots that are tombstoned, in [0, 1].
    pub fn deleted_fraction(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.deleted_rows as f64 / self.total_rows as f64
        }
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, active: {}, deleted: {} ({:.1}% reclaimable)",
            self.total_rows,
            self.active_rows,
            self.deleted_rows,
            self.deleted_fraction() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::ColumnType;
    use tempfile::tempdir;

    fn user_schema() -> Arc<TableSchema> {
        TableSchema::builder("users")
            .column("id", ColumnType::Int)
            .column("name", ColumnType::String)
            .build_arc()
    }

    fn user(schema: &Arc<TableSchema>, id: i32, name: &str) -> Row {
        Row::new(
            Arc::clone(schema),
            vec![Value::Int(id), Value::String(name.to_string())],
        )
        .unwrap()
    }

    #[test]
    fn test_stats_display() {
        let stats = TableStats {
            total_rows: 4,
            active_rows: 3,
            deleted_rows: 1,
        };
        assert_eq!(stats.to_string(), "total: 4, active: 3, deleted: 1 (25.0% reclaimable)");
        assert_eq!(stats.deleted_fraction(), 0.25);
    }

    #[test]
    fn test_empty_table_stats() {
        let dir = tempdir().unwrap();
        let table = TableFile::open(user_schema(), dir.path().join("users.tbl")).unwrap();
        let stats = table.stats().unwrap();
        assert_eq!(stats.total_rows, 0);
        assert_eq!(stats.deleted_fraction(), 0.0);
    }

    #[test]
    fn test_row_too_large_fails_fast() {
        let dir = tempdir().unwrap();
        let mut table = TableFile::open(user_schema(), dir.path().join("users.tbl")).unwrap();

        let schema = Arc::clone(table.schema());
        let oversized = user(&schema, 1, &"x".repeat(PAGE_SIZE));
        let err = table.insert(oversized).unwrap_err();
        assert!(matches!(err, DatabaseError::PageOverflow { .. }));

        // nothing may have been written
        assert_eq!(table.total_row_count().unwrap(), 0);
    }
}
