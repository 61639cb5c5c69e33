use std::sync::Mutex;

use log::info;
use once_cell::sync::OnceCell;

use crate::transaction::TransactionId;
use crate::types::SmallResult;

/// Install the `env_logger` backend. Safe to call more than once; only the
/// first call has any effect. Applications embedding this crate are
/// expected to call it themselves (a library never initializes logging on
/// its own), the same way the teacher's binaries do.
pub fn init_log() {
    let _ = env_logger::try_init();
}

/// One record of the narrow write-ahead interface: which transaction
/// dirtied a page, and its before/after images. The encoding and on-disk
/// format of the log itself is out of scope for this core; what matters
/// here is only that every page write is preceded by a call to
/// [`log_write`] and a subsequent [`force`], establishing log-before-data
/// ordering.
struct LogRecord {
    tid: TransactionId,
    before_image: Vec<u8>,
    after_image: Vec<u8>,
}

struct LogState {
    records: Vec<LogRecord>,
    forced_through: usize,
}

static LOG: OnceCell<Mutex<LogState>> = OnceCell::new();

fn state() -> &'static Mutex<LogState> {
    LOG.get_or_init(|| {
        Mutex::new(LogState {
            records: Vec::new(),
            forced_through: 0,
        })
    })
}

/// Appends a record to the in-memory log. Must be called, and must
/// complete, before the corresponding page write reaches disk.
pub fn log_write(tid: TransactionId, before_image: &[u8], after_image: &[u8]) -> SmallResult {
    let mut guard = state().lock().unwrap();
    guard.records.push(LogRecord {
        tid,
        before_image: before_image.to_vec(),
        after_image: after_image.to_vec(),
    });
    info!("{} logged a page write ({} bytes)", tid, after_image.len());
    Ok(())
}

/// Forces every record appended so far to be durable before the caller's
/// subsequent page write proceeds. This implementation has nothing to
/// flush to (the log lives in memory only), so it is a synchronization
/// point rather than real I/O -- real WAL durability is explicitly out of
/// scope.
pub fn force() -> SmallResult {
    let mut guard = state().lock().unwrap();
    guard.forced_through = guard.records.len();
    Ok(())
}

#[cfg(test)]
pub(crate) fn record_count() -> usize {
    state().lock().unwrap().records.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_force_is_idempotent_on_count() {
        let before = record_count();
        let tid = TransactionId::new();
        log_write(tid, &[0u8; 4], &[1u8; 4]).unwrap();
        force().unwrap();
        assert_eq!(record_count(), before + 1);
    }
}
