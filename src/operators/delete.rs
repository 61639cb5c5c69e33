use std::sync::Arc;

use crate::database::Database;
use crate::error::SmallError;
use crate::field::Field;
use crate::operator::OpIterator;
use crate::schema::{simple_int_schema, Schema};
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

/// Mirror of [`crate::operators::insert::Insert`]: pulls tuples from
/// `child` (which must carry a [`crate::page_id::RecordId`] on each one,
/// i.e. come from a scan) and deletes each through the buffer pool,
/// yielding a single count tuple.
pub struct Delete {
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    result_schema: Arc<Schema>,
    done: bool,
}

impl Delete {
    pub fn new(tid: TransactionId, child: Box<dyn OpIterator>) -> Delete {
        Delete {
            tid,
            child,
            result_schema: Arc::new(simple_int_schema(1, "deleted")),
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> Result<(), SmallError> {
        self.done = false;
        self.child.open()
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        Ok(!self.done)
    }

    fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.done {
            return Ok(None);
        }
        let mut count: i32 = 0;
        while let Some(t) = self.child.next()? {
            Database::global().buffer_pool().delete_tuple(self.tid, &t)?;
            count += 1;
        }
        self.done = true;
        Ok(Some(Tuple::new(
            Arc::clone(&self.result_schema),
            vec![Field::Int(count)],
        )?))
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.done = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn get_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.result_schema)
    }
}
