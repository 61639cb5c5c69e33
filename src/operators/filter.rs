use std::sync::Arc;

use crate::error::SmallError;
use crate::operator::OpIterator;
use crate::predicate::Predicate;
use crate::schema::Schema;
use crate::tuple::Tuple;

/// Pulls from `child` and hands back only the tuples matching `predicate`.
/// Buffers at most one tuple ahead so `has_next` never consumes one.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    buffered: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Filter {
        Filter {
            predicate,
            child,
            buffered: None,
        }
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        while let Some(t) = self.child.next()? {
            let field = t.get_field(self.predicate.field_index())?;
            if self.predicate.filter(field) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> Result<(), SmallError> {
        self.child.open()
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if self.buffered.is_none() {
            self.buffered = self.fetch_next()?;
        }
        Ok(self.buffered.is_some())
    }

    fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.buffered.is_none() {
            self.buffered = self.fetch_next()?;
        }
        Ok(self.buffered.take())
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.buffered = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.buffered = None;
        self.child.close();
    }

    fn get_schema(&self) -> Arc<Schema> {
        self.child.get_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::predicate::Op;
    use crate::schema::simple_int_schema;

    struct VecScan {
        schema: Arc<Schema>,
        tuples: std::vec::IntoIter<Tuple>,
        source: Vec<Tuple>,
    }

    impl VecScan {
        fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> VecScan {
            VecScan {
                schema,
                tuples: tuples.clone().into_iter(),
                source: tuples,
            }
        }
    }

    impl OpIterator for VecScan {
        fn open(&mut self) -> Result<(), SmallError> {
            self.tuples = self.source.clone().into_iter();
            Ok(())
        }
        fn has_next(&mut self) -> Result<bool, SmallError> {
            Ok(self.tuples.as_slice().first().is_some())
        }
        fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
            Ok(self.tuples.next())
        }
        fn rewind(&mut self) -> Result<(), SmallError> {
            self.open()
        }
        fn close(&mut self) {}
        fn get_schema(&self) -> Arc<Schema> {
            Arc::clone(&self.schema)
        }
    }

    #[test]
    fn filters_out_non_matching_tuples() {
        let schema = Arc::new(simple_int_schema(1, "c"));
        let tuples = vec![
            Tuple::new(Arc::clone(&schema), vec![Field::Int(1)]).unwrap(),
            Tuple::new(Arc::clone(&schema), vec![Field::Int(2)]).unwrap(),
            Tuple::new(Arc::clone(&schema), vec![Field::Int(3)]).unwrap(),
        ];
        let scan = VecScan::new(Arc::clone(&schema), tuples);
        let predicate = Predicate::new(0, Op::GreaterThan, Field::Int(1));
        let mut filter = Filter::new(predicate, Box::new(scan));
        filter.open().unwrap();

        let mut out = Vec::new();
        while filter.has_next().unwrap() {
            out.push(filter.next().unwrap().unwrap());
        }
        assert_eq!(out.len(), 2);
    }
}
