use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};

use crate::concurrency::LockMode;
use crate::database::Database;
use crate::error::SmallError;
use crate::wal;
use crate::page::HeapPage;
use crate::page_id::PageId;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;
use crate::types::{Pod, ResultPod, SmallResult};
use crate::utils::HandyRwLock;

pub const PAGE_SIZE: usize = 4096;
pub const DEFAULT_CAPACITY: usize = 50;

struct Cache {
    pages: HashMap<PageId, Pod<HeapPage>>,
    /// Insertion order, oldest first -- eviction walks this front-to-back
    /// looking for the first page that isn't dirty.
    order: Vec<PageId>,
}

/// Bounded, insertion-ordered page cache with NO-STEAL eviction: a dirty
/// page is never written out to make room, only ever flushed at commit.
pub struct BufferPool {
    cache: Mutex<Cache>,
    /// Every PageId each live transaction has acquired a lock on, so
    /// `transaction_complete` knows exactly which pages to flush/discard
    /// and release without having to ask the lock manager about pages
    /// belonging to other transactions.
    touched: Mutex<HashMap<TransactionId, HashSet<PageId>>>,
    capacity: usize,
}

impl BufferPool {
    pub fn new() -> BufferPool {
        BufferPool::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> BufferPool {
        BufferPool {
            cache: Mutex::new(Cache {
                pages: HashMap::new(),
                order: Vec::new(),
            }),
            touched: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Acquires `mode` on `pid` through the lock manager, records it in
    /// `tid`'s touched-set, then returns the cached page, loading it from
    /// its backing file on a miss.
    pub fn get_page(&self, tid: TransactionId, pid: PageId, mode: LockMode) -> ResultPod<HeapPage> {
        Database::global().lock_manager().acquire(tid, pid, mode)?;
        self.touched.lock().unwrap().entry(tid).or_default().insert(pid);

        {
            let cache = self.cache.lock().unwrap();
            if let Some(page) = cache.pages.get(&pid) {
                return Ok(Arc::clone(page));
            }
        }

        let file = Database::global().catalog().get_file(pid.table_id)?;
        let page = file.read_page(pid)?;
        let pod: Pod<HeapPage> = Arc::new(RwLock::new(page));

        let mut cache = self.cache.lock().unwrap();
        if let Some(existing) = cache.pages.get(&pid) {
            return Ok(Arc::clone(existing));
        }
        if cache.pages.len() >= self.capacity {
            Self::evict_one(&mut cache)?;
        }
        cache.pages.insert(pid, Arc::clone(&pod));
        cache.order.push(pid);
        Ok(pod)
    }

    fn evict_one(cache: &mut Cache) -> SmallResult {
        let victim = cache
            .order
            .iter()
            .position(|pid| {
                cache
                    .pages
                    .get(pid)
                    .map(|p| p.rl().is_dirty().is_none())
                    .unwrap_or(true)
            });

        match victim {
            Some(idx) => {
                let pid = cache.order.remove(idx);
                cache.pages.remove(&pid);
                debug!("evicted clean page {:?}", pid);
                Ok(())
            }
            None => Err(SmallError::db_error(
                "buffer pool full and every page is dirty (NO-STEAL forbids evicting them)",
            )),
        }
    }

    pub fn release_page(&self, tid: TransactionId, pid: PageId) -> SmallResult {
        Database::global().lock_manager().release(tid, pid)
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        Database::global().lock_manager().holds_lock(tid, pid)
    }

    /// `HeapFile::insert_tuple`/`delete_tuple` do the actual page mutation
    /// (they need to probe for space); this wrapper marks whatever pages
    /// come back dirty under `tid`.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: i32, t: &mut Tuple) -> SmallResult {
        let file = Database::global().catalog().get_file(table_id)?;
        let pages = file.insert_tuple(tid, t)?;
        for page in pages {
            page.wl().mark_dirty(true, tid);
        }
        Ok(())
    }

    pub fn delete_tuple(&self, tid: TransactionId, t: &Tuple) -> SmallResult {
        let rid = t
            .record_id()
            .ok_or_else(|| SmallError::db_error("tuple has no record id"))?;
        let file = Database::global().catalog().get_file(rid.page_id.table_id)?;
        let page = file.delete_tuple(tid, t)?;
        page.wl().mark_dirty(true, tid);
        Ok(())
    }

    fn flush_page(&self, pid: PageId, page: &Pod<HeapPage>) -> SmallResult {
        let dirty_by = page.rl().is_dirty();
        let tid = match dirty_by {
            Some(tid) => tid,
            None => return Ok(()),
        };

        let (before, after) = {
            let guard = page.rl();
            (guard.get_before_image(), guard.get_page_data())
        };
        wal::log_write(tid, &before, &after)?;
        wal::force()?;

        let file = Database::global().catalog().get_file(pid.table_id)?;
        file.write_page(&page.rl())?;

        let mut guard = page.wl();
        guard.mark_dirty(false, tid);
        guard.set_before_image();
        Ok(())
    }

    /// Flushes every dirty page regardless of owner. Used at checkpoints
    /// and in tests; transaction-scoped commit flushing goes through
    /// [`BufferPool::transaction_complete`].
    pub fn flush_all_pages(&self) -> SmallResult {
        let snapshot: Vec<(PageId, Pod<HeapPage>)> = {
            let cache = self.cache.lock().unwrap();
            cache.pages.iter().map(|(k, v)| (*k, Arc::clone(v))).collect()
        };
        for (pid, page) in snapshot {
            self.flush_page(pid, &page)?;
        }
        Ok(())
    }

    /// Drops `pid` from the cache unconditionally, dirty or not. The next
    /// fetch re-reads from disk.
    pub fn discard_page(&self, pid: PageId) {
        let mut cache = self.cache.lock().unwrap();
        cache.pages.remove(&pid);
        cache.order.retain(|p| *p != pid);
    }

    /// On commit, flushes every page `tid` left dirty (log-then-force
    /// ordering happens inside `flush_page`). On abort, simply discards
    /// `tid`'s cached pages: NO-STEAL guarantees they were never written
    /// to disk, so the on-disk image is already the pre-transaction one.
    /// Either way, every lock `tid` holds is released.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> SmallResult {
        let pages = self.touched.lock().unwrap().remove(&tid).unwrap_or_default();
        for pid in pages {
            let cached = {
                let cache = self.cache.lock().unwrap();
                cache.pages.get(&pid).cloned()
            };

            if let Some(page) = cached {
                if commit {
                    if page.rl().is_dirty() == Some(tid) {
                        self.flush_page(pid, &page)?;
                    }
                } else if page.rl().is_dirty() == Some(tid) {
                    warn!("aborting {}: discarding dirty page {:?}", tid, pid);
                    self.discard_page(pid);
                }
            }

            // The heap-file insertion probe (see HeapFile::insert_tuple) may
            // have already fully released a page it only speculatively
            // touched; release_all on a page tid no longer holds would
            // otherwise fail spuriously.
            if Database::global().lock_manager().holds_lock(tid, pid) {
                Database::global().lock_manager().release_all(tid, pid)?;
            }
        }
        Ok(())
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new()
    }
}
