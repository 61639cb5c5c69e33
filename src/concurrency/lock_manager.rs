use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::concurrency::page_lock::{LockMode, PageLock};
use crate::error::SmallError;
use crate::page_id::PageId;
use crate::transaction::TransactionId;

/// Default time a transaction waits on a contended page before aborting.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Page-level two-phase lock table: one [`PageLock`] per page, created on
/// first touch. Holds no graph of who-waits-for-whom; contention is
/// resolved purely by timeout (see `spec` Non-goals on deadlock detection).
pub struct LockManager {
    locks: Mutex<HashMap<PageId, Arc<PageLock>>>,
    timeout: Duration,
}

impl LockManager {
    pub fn new() -> LockManager {
        LockManager {
            locks: Mutex::new(HashMap::new()),
            timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> LockManager {
        LockManager {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn lock_for(&self, pid: PageId) -> Arc<PageLock> {
        let mut table = self.locks.lock().unwrap();
        Arc::clone(table.entry(pid).or_insert_with(|| Arc::new(PageLock::new())))
    }

    pub fn acquire(
        &self,
        tid: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> Result<(), SmallError> {
        let lock = self.lock_for(pid);
        match mode {
            LockMode::Read => lock.read_lock(tid, self.timeout),
            LockMode::Write => lock.write_lock(tid, self.timeout),
        }
    }

    pub fn release(&self, tid: TransactionId, pid: PageId) -> Result<(), SmallError> {
        self.lock_for(pid).release_one(tid)
    }

    pub fn release_all(&self, tid: TransactionId, pid: PageId) -> Result<(), SmallError> {
        self.lock_for(pid).release_all(tid)
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_for(pid).holds_lock(tid)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        LockManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_pages_do_not_contend() {
        let mgr = LockManager::new();
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        let p1 = PageId::new(0, 0);
        let p2 = PageId::new(0, 1);
        mgr.acquire(t1, p1, LockMode::Write).unwrap();
        mgr.acquire(t2, p2, LockMode::Write).unwrap();
        assert!(mgr.holds_lock(t1, p1));
        assert!(mgr.holds_lock(t2, p2));
    }

    #[test]
    fn release_all_drops_every_held_mode() {
        let mgr = LockManager::new();
        let tid = TransactionId::new();
        let pid = PageId::new(0, 0);
        mgr.acquire(tid, pid, LockMode::Read).unwrap();
        mgr.acquire(tid, pid, LockMode::Write).unwrap();
        mgr.release_all(tid, pid).unwrap();
        assert!(!mgr.holds_lock(tid, pid));
    }
}
