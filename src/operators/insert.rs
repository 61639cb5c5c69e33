use std::sync::Arc;

use crate::database::Database;
use crate::error::SmallError;
use crate::field::Field;
use crate::operator::OpIterator;
use crate::schema::{simple_int_schema, Schema};
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

/// Pulls every tuple from `child`, inserting each into `table_id` via the
/// buffer pool, then yields a single one-column tuple holding the count of
/// rows inserted. Exhausted after that one tuple, like the teacher's
/// blocking DML operators.
pub struct Insert {
    tid: TransactionId,
    table_id: i32,
    child: Box<dyn OpIterator>,
    result_schema: Arc<Schema>,
    done: bool,
}

impl Insert {
    pub fn new(tid: TransactionId, table_id: i32, child: Box<dyn OpIterator>) -> Insert {
        Insert {
            tid,
            table_id,
            child,
            result_schema: Arc::new(simple_int_schema(1, "inserted")),
            done: false,
        }
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> Result<(), SmallError> {
        self.done = false;
        self.child.open()?;
        let table_schema = Database::global().catalog().get_schema(self.table_id)?;
        if self.child.get_schema().as_ref() != table_schema.as_ref() {
            return Err(SmallError::db_error(
                "insert child schema does not match table schema",
            ));
        }
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        Ok(!self.done)
    }

    fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.done {
            return Ok(None);
        }
        let mut count: i32 = 0;
        while let Some(mut t) = self.child.next()? {
            Database::global()
                .buffer_pool()
                .insert_tuple(self.tid, self.table_id, &mut t)?;
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
