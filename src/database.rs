use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::OnceCell;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::concurrency::LockManager;

/// Process-wide handle tying the [`Catalog`], [`BufferPool`] and
/// [`LockManager`] together.
///
/// The three collaborate constantly (a page fetch needs the lock manager, a
/// page load needs the catalog to find the right file) but none of them
/// owns another directly -- that would tangle them into a reference cycle.
/// Instead every component reaches the others through this singleton, the
/// same way the teacher's `database.rs` does it, so cross-references are by
/// lookup rather than by back-pointer.
pub struct Database {
    catalog: RwLock<Catalog>,
    buffer_pool: BufferPool,
    lock_manager: LockManager,
}

static INSTANCE: OnceCell<Database> = OnceCell::new();

impl Database {
    fn new() -> Database {
        Database {
            catalog: RwLock::new(Catalog::new()),
            buffer_pool: BufferPool::new(),
            lock_manager: LockManager::new(),
        }
    }

    pub fn global() -> &'static Database {
        INSTANCE.get_or_init(Database::new)
    }

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap()
    }

    pub fn mut_catalog(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap()
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }
}
