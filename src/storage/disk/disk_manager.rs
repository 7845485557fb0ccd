use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::common::{PageId, Result, PAGE_SIZE};
use crate::storage::page::HeapPage;

/// DiskManager moves whole pages between memory and one backing table file,
/// addressed by zero-based page index. It knows nothing about what a page
/// contains.
pub struct DiskManager {
    file: Mutex<File>,
    path: PathBuf,
}

impl DiskManager {
    /// Opens the table file at `path`, creating it (and its parent
    /// directory) if absent. Existing contents are kept.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_options(path, false)
    }

    /// Opens the table file at `path`, discarding any existing contents.
    /// Compaction rebuilds through this.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_options(path, true)
    }

    fn open_options<P: AsRef<Path>>(path: P, truncate: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Writes all 4096 bytes of `page` at the page's file offset. Writing
    /// one page past the current end extends the file.
    pub fn write_page(&self, page_id: PageId, page: &HeapPage) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset()))?;
        file.write_all(page.data())?;
        file.flush()?;
        Ok(())
    }

    /// Reads the page at `page_id` into a fresh buffer. Fails with an I/O
    /// error if the file holds fewer than 4096 bytes there; that never
    /// happens for `page_id < page_count()` on an intact file.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        let mut data = Box::new([0u8; PAGE_SIZE]);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset()))?;
        file.read_exact(&mut data[..])?;
        Ok(HeapPage::from_data(data))
    }

    /// Number of whole pages in the file (file length / 4096, floored).
    pub fn page_count(&self) -> Result<u32> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes all written data to disk and releases the file handle. No
    /// further operations are valid afterward.
    pub fn close(self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let _ = self.file.get_mut().sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_file_has_no_pages() {
        let dir = tempdir().unwrap();
        let dm = DiskManager::new(dir.path().join("t.tbl")).unwrap();
        assert_eq!(dm.page_count().unwrap(), 0);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("t.tbl");
        let dm = DiskManager::new(&path).unwrap();
        assert!(path.exists());
        assert_eq!(dm.page_count().unwrap(), 0);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let dm = DiskManager::new(dir.path().join("t.tbl")).unwrap();

        let mut page = HeapPage::new();
        assert!(page.try_append(b"hello page"));
        dm.write_page(PageId::new(0), &page).unwrap();
        assert_eq!(dm.page_count().unwrap(), 1);

        let read = dm.read_page(PageId::new(0)).unwrap();
        assert_eq!(read.row_count(), 1);
        assert_eq!(read.data(), page.data());
    }

    #[test]
    fn test_write_past_end_extends_file() {
        let dir = tempdir().unwrap();
        let dm = DiskManager::new(dir.path().join("t.tbl")).unwrap();

        dm.write_page(PageId::new(2), &HeapPage::new()).unwrap();
        assert_eq!(dm.page_count().unwrap(), 3);
    }

    #[test]
    fn test_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let dm = DiskManager::new(dir.path().join("t.tbl")).unwrap();

        assert!(dm.read_page(PageId::new(0)).is_err());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");

        {
            let dm = DiskManager::new(&path).unwrap();
            let mut page = HeapPage::new();
            page.try_append(b"durable");
            dm.write_page(PageId::new(0), &page).unwrap();
            dm.close().unwrap();
        }

        let dm = DiskManager::new(&path).unwrap();
        assert_eq!(dm.page_count().unwrap(), 1);
        let page = dm.read_page(PageId::new(0)).unwrap();
        assert_eq!(page.row_count(), 1);
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.tbl");

        {
            let dm = DiskManager::new(&path).unwrap();
            dm.write_page(PageId::new(4), &HeapPage::new()).unwrap();
        }

        let dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count().unwrap(), 0);
    }
}
