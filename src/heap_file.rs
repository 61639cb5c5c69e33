use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::buffer_pool::PAGE_SIZE;
use crate::concurrency::LockMode;
use crate::database::Database;
use crate::error::SmallError;
use crate::page::HeapPage;
use crate::page_id::{PageId, RecordId};
use crate::schema::Schema;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;
use crate::types::{Pod, SmallResult};
use crate::utils::HandyRwLock;

/// On-disk table: a flat file of fixed-size heap pages. Identity is the
/// absolute path hashed down to an `i32`, the same quantity used to key
/// pages and to look the file back up in the [`crate::catalog::Catalog`].
pub struct HeapFile {
    path: PathBuf,
    file: Mutex<File>,
    schema: Arc<Schema>,
    id: i32,
}

impl HeapFile {
    pub fn new(path: impl AsRef<Path>, schema: Arc<Schema>) -> Result<HeapFile, SmallError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| SmallError::db_error(&format!("opening heap file {:?}: {}", path, e)))?;

        let id = Self::hash_path(&path);

        Ok(HeapFile {
            path,
            file: Mutex::new(file),
            schema,
            id,
        })
    }

    fn hash_path(path: &Path) -> i32 {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        hasher.finish() as i32
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_pages(&self) -> usize {
        let file = self.file.lock().unwrap();
        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        (len as usize) / PAGE_SIZE
    }

    /// Reads page `pid.page_index`. Reading exactly the one-past-the-end
    /// index grows the file by one freshly zeroed page and returns it --
    /// this is how the buffer pool allocates new pages for insertion.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage, SmallError> {
        let num_pages = self.num_pages();
        if pid.page_index > num_pages {
            return Err(SmallError::db_error(&format!(
                "page index {} out of range ({} pages in file)",
                pid.page_index, num_pages
            )));
        }

        let mut file = self.file.lock().unwrap();
        if pid.page_index == num_pages {
            let empty = HeapPage::empty(pid, Arc::clone(&self.schema), PAGE_SIZE);
            file.seek(SeekFrom::Start((pid.page_index * PAGE_SIZE) as u64))
                .map_err(|e| SmallError::db_error(&format!("seeking to grow file: {}", e)))?;
            file.write_all(&empty.get_page_data())
                .map_err(|e| SmallError::db_error(&format!("growing heap file: {}", e)))?;
            file.flush()
                .map_err(|e| SmallError::db_error(&format!("flushing grown heap file: {}", e)))?;
            return Ok(empty);
        }

        let mut buf = vec![0u8; PAGE_SIZE];
        file.seek(SeekFrom::Start((pid.page_index * PAGE_SIZE) as u64))
            .map_err(|e| SmallError::db_error(&format!("seeking to read page: {}", e)))?;
        file.read_exact(&mut buf)
            .map_err(|e| SmallError::db_error(&format!("reading page: {}", e)))?;
        HeapPage::new(pid, Arc::clone(&self.schema), &buf, PAGE_SIZE)
    }

    pub fn write_page(&self, page: &HeapPage) -> SmallResult {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(
            (page.pid().page_index * PAGE_SIZE) as u64,
        ))
        .map_err(|e| SmallError::db_error(&format!("seeking to write page: {}", e)))?;
        file.write_all(&page.get_page_data())
            .map_err(|e| SmallError::db_error(&format!("writing page: {}", e)))?;
        file.flush()
            .map_err(|e| SmallError::db_error(&format!("flushing page write: {}", e)))
    }

    /// Probes existing pages under a read lock for free space, releasing
    /// that lock and re-acquiring for write only on the page it actually
    /// inserts into (or the newly allocated one past the end). Returns the
    /// page that was modified so the caller can mark it dirty.
    pub fn insert_tuple(&self, tid: TransactionId, t: &mut Tuple) -> Result<Vec<Pod<HeapPage>>, SmallError> {
        let pool = Database::global().buffer_pool();
        let num_pages = self.num_pages();

        for i in 0..num_pages {
            let pid = PageId::new(self.id, i);
            let page = pool.get_page(tid, pid, LockMode::Read)?;
            let has_room = page.rl().get_num_empty_slots() > 0;
            pool.release_page(tid, pid)?;
            if !has_room {
                continue;
            }

            let page = pool.get_page(tid, pid, LockMode::Write)?;
            let mut guard = page.wl();
            if guard.get_num_empty_slots() > 0 {
                guard.insert_tuple(t)?;
                drop(guard);
                return Ok(vec![page]);
            }
            // lost the race to another writer between probe and upgrade; fall through to append
        }

        let new_pid = PageId::new(self.id, num_pages);
        let page = pool.get_page(tid, new_pid, LockMode::Write)?;
        page.wl().insert_tuple(t)?;
        Ok(vec![page])
    }

    pub fn delete_tuple(&self, tid: TransactionId, t: &Tuple) -> Result<Pod<HeapPage>, SmallError> {
        let rid: RecordId = t
            .record_id()
            .ok_or_else(|| SmallError::db_error("tuple has no record id"))?;
        let pool = Database::global().buffer_pool();
        let page = pool.get_page(tid, rid.page_id, LockMode::Write)?;
        page.wl().delete_tuple(t)?;
        Ok(page)
    }

    /// Lazily walks every page in page-number order, each fetched under a
    /// read lock through the buffer pool.
    pub fn iterator(&self, tid: TransactionId) -> HeapFileIter {
        HeapFileIter {
            table_id: self.id,
            tid,
            num_pages: self.num_pages(),
            next_page: 0,
            buffered: Vec::new(),
            buf_pos: 0,
        }
    }
}

pub struct HeapFileIter {
    table_id: i32,
    tid: TransactionId,
    num_pages: usize,
    next_page: usize,
    buffered: Vec<Tuple>,
    buf_pos: usize,
}

impl Iterator for HeapFileIter {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        loop {
            if self.buf_pos < self.buffered.len() {
                let t = self.buffered[self.buf_pos].clone();
                self.buf_pos += 1;
                return Some(t);
            }
            if self.next_page >= self.num_pages {
                return None;
            }
            let pid = PageId::new(self.table_id, self.next_page);
            self.next_page += 1;
            let pool = Database::global().buffer_pool();
            let page = match pool.get_page(self.tid, pid, LockMode::Read) {
                Ok(p) => p,
                Err(_) => return None,
            };
            self.buffered = page.rl().iter().collect();
            self.buf_pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::schema::simple_int_schema;
    use tempfile::NamedTempFile;

    #[test]
    fn grows_on_first_page_read() {
        let tmp = NamedTempFile::new().unwrap();
        let schema = Arc::new(simple_int_schema(2, "c"));
        let file = HeapFile::new(tmp.path(), schema).unwrap();
        assert_eq!(file.num_pages(), 0);

        let page = file.read_page(PageId::new(file.id(), 0)).unwrap();
        assert_eq!(page.num_slots() > 0, true);
        assert_eq!(file.num_pages(), 1);
    }

    #[test]
    fn write_then_read_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let schema = Arc::new(simple_int_schema(2, "c"));
        let file = HeapFile::new(tmp.path(), schema.clone()).unwrap();
        let mut page = file.read_page(PageId::new(file.id(), 0)).unwrap();
        let mut t = Tuple::new(schema, vec![Field::Int(5), Field::Int(6)]).unwrap();
        page.insert_tuple(&mut t).unwrap();
        file.write_page(&page).unwrap();

        let reread = file.read_page(PageId::new(file.id(), 0)).unwrap();
        let tuples: Vec<Tuple> = reread.iter().collect();
        assert_eq!(tuples, vec![t]);
    }
}
