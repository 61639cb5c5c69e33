use std::collections::HashMap;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::SmallError;
use crate::transaction::TransactionId;

/// Shared or exclusive acquisition mode.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LockMode {
    Read,
    Write,
}

struct Inner {
    read_count: usize,
    write_count: usize,
    /// Per-transaction stack of acquired modes, LIFO release order. This is
    /// what makes reentrant acquisition and the heap-file's speculative
    /// read-probe release (see `HeapFile::insert_tuple`) both safe: a
    /// transaction always releases whatever it most recently acquired.
    stacks: HashMap<TransactionId, Vec<LockMode>>,
}

impl Inner {
    fn new() -> Inner {
        Inner {
            read_count: 0,
            write_count: 0,
            stacks: HashMap::new(),
        }
    }

    fn writer(&self) -> Option<TransactionId> {
        if self.write_count == 1 {
            self.stacks
                .iter()
                .find(|(_, modes)| modes.iter().any(|m| *m == LockMode::Write))
                .map(|(tid, _)| *tid)
        } else {
            None
        }
    }

    fn sole_holder(&self, tid: TransactionId) -> bool {
        self.stacks.len() == 1 && self.stacks.contains_key(&tid)
    }
}

/// Per-page lock state: read/write holder counts plus the per-transaction
/// acquisition stacks, guarded by a monitor (mutex + condvar) so waiters
/// block rather than poll.
pub struct PageLock {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl PageLock {
    pub fn new() -> PageLock {
        PageLock {
            inner: Mutex::new(Inner::new()),
            cond: Condvar::new(),
        }
    }

    /// Grants a read lock to `tid`, blocking up to `timeout` if a different
    /// transaction holds the write lock. Reentrant: if `tid` already holds
    /// the write lock it is granted read immediately (a downgrade stacked
    /// on top of the existing write entry).
    pub fn read_lock(&self, tid: TransactionId, timeout: Duration) -> Result<(), SmallError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock().unwrap();

        loop {
            match guard.writer() {
                Some(holder) if holder != tid => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(SmallError::transaction_aborted(&format!(
                            "{} timed out waiting for read lock (held for write by {})",
                            tid, holder
                        )));
                    }
                    let (g, timeout_result) =
                        self.cond.wait_timeout(guard, deadline - now).unwrap();
                    guard = g;
                    if timeout_result.timed_out() && guard.writer().map_or(false, |h| h != tid) {
                        return Err(SmallError::transaction_aborted(&format!(
                            "{} timed out waiting for read lock",
                            tid
                        )));
                    }
                }
                _ => {
                    guard.read_count += 1;
                    guard.stacks.entry(tid).or_default().push(LockMode::Read);
                    debug!("{} granted read lock", tid);
                    return Ok(());
                }
            }
        }
    }

    /// Grants a write lock to `tid`, blocking up to `timeout` unless `tid`
    /// is already the sole holder of the lock (in any mode), which is the
    /// only upgrade path.
    pub fn write_lock(&self, tid: TransactionId, timeout: Duration) -> Result<(), SmallError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock().unwrap();

        loop {
            let held_by_others = !guard.stacks.is_empty() && !guard.sole_holder(tid);
            if !held_by_others {
                guard.write_count = 1;
                guard.stacks.entry(tid).or_default().push(LockMode::Write);
                debug!("{} granted write lock", tid);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SmallError::transaction_aborted(&format!(
                    "{} timed out waiting for write lock",
                    tid
                )));
            }
            let (g, timeout_result) = self.cond.wait_timeout(guard, deadline - now).unwrap();
            guard = g;
            if timeout_result.timed_out() && !guard.stacks.is_empty() && !guard.sole_holder(tid) {
                return Err(SmallError::transaction_aborted(&format!(
                    "{} timed out waiting for write lock",
                    tid
                )));
            }
        }
    }

    /// Pops the most recently acquired mode from `tid`'s stack and wakes
    /// one waiter. Fails if `tid` holds no lock on this page.
    pub fn release_one(&self, tid: TransactionId) -> Result<(), SmallError> {
        let mut guard = self.inner.lock().unwrap();
        let empty_after = {
            let stack = guard
                .stacks
                .get_mut(&tid)
                .ok_or_else(|| SmallError::db_error(&format!("{} holds no lock to release", tid)))?;
            let mode = stack
                .pop()
                .ok_or_else(|| SmallError::db_error(&format!("{} holds no lock to release", tid)))?;
            match mode {
                LockMode::Read => guard.read_count -= 1,
                LockMode::Write => guard.write_count = 0,
            }
            stack.is_empty()
        };
        if empty_after {
            guard.stacks.remove(&tid);
        }
        self.cond.notify_all();
        Ok(())
    }

    /// Drains `tid`'s entire stack, decrementing counters for every mode
    /// held, and wakes waiters.
    pub fn release_all(&self, tid: TransactionId) -> Result<(), SmallError> {
        let mut guard = self.inner.lock().unwrap();
        let stack = guard.stacks.remove(&tid).ok_or_else(|| {
            SmallError::db_error(&format!("{} holds no lock to release", tid))
        })?;
        for mode in stack {
            match mode {
                LockMode::Read => guard.read_count -= 1,
                LockMode::Write => guard.write_count = 0,
            }
        }
        self.cond.notify_all();
        Ok(())
    }

    pub fn holds_lock(&self, tid: TransactionId) -> bool {
        self.inner.lock().unwrap().stacks.contains_key(&tid)
    }

    #[cfg(test)]
    pub(crate) fn counts(&self) -> (usize, usize) {
        let guard = self.inner.lock().unwrap();
        (guard.read_count, guard.write_count)
    }
}

impl Default for PageLock {
    fn default() -> Self {
        PageLock::new()
    }
}

impl fmt::Debug for PageLock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let guard = self.inner.lock().unwrap();
        write!(
            f,
            "PageLock {{ read: {}, write: {}, holders: {} }}",
            guard.read_count,
            guard.write_count,
            guard.stacks.len()
        )
    }
}
