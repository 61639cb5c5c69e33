use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing per-process transaction identity. A client
/// thread drives one transaction at a time under this id; the id is the
/// key under which the lock manager and buffer pool track held locks and
/// touched pages.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct TransactionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl TransactionId {
    pub fn new() -> TransactionId {
        TransactionId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
    }
}
