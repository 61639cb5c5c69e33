use std::sync::Arc;

use crate::error::SmallError;
use crate::schema::Schema;
use crate::tuple::Tuple;

/// Pull-based iterator protocol every query operator implements: open it,
/// pull tuples with `next` while `has_next` says there are more, `rewind`
/// to restart, `close` to release whatever state `open` acquired.
pub trait OpIterator {
    fn open(&mut self) -> Result<(), SmallError>;
    fn has_next(&mut self) -> Result<bool, SmallError>;
    fn next(&mut self) -> Result<Option<Tuple>, SmallError>;
    fn rewind(&mut self) -> Result<(), SmallError>;
    fn close(&mut self);
    fn get_schema(&self) -> Arc<Schema>;
}
