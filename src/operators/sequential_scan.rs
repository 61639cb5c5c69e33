use std::iter::Peekable;
use std::sync::Arc;

use crate::database::Database;
use crate::error::SmallError;
use crate::heap_file::HeapFileIter;
use crate::operator::OpIterator;
use crate::schema::Schema;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

/// Full scan of one table's [`crate::heap_file::HeapFile`], pulling pages
/// through the buffer pool under read locks.
pub struct SequentialScan {
    tid: TransactionId,
    table_id: i32,
    schema: Arc<Schema>,
    iter: Option<Peekable<HeapFileIter>>,
}

impl SequentialScan {
    pub fn new(tid: TransactionId, table_id: i32, alias: &str) -> Result<SequentialScan, SmallError> {
        let file = Database::global().catalog().get_file(table_id)?;
        let schema = Arc::new(file.schema().with_alias(alias));
        Ok(SequentialScan {
            tid,
            table_id,
            schema,
            iter: None,
        })
    }
}

impl OpIterator for SequentialScan {
    fn open(&mut self) -> Result<(), SmallError> {
        let file = Database::global().catalog().get_file(self.table_id)?;
        self.iter = Some(file.iterator(self.tid).peekable());
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        let iter = self
            .iter
            .as_mut()
            .ok_or_else(|| SmallError::db_error("sequential scan not open"))?;
        Ok(iter.peek().is_some())
    }

    fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
        let iter = self
            .iter
            .as_mut()
            .ok_or_else(|| SmallError::db_error("sequential scan not open"))?;
        Ok(iter.next())
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.open()
    }

    fn close(&mut self) {
        self.iter = None;
    }

    fn get_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }
}
