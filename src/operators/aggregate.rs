use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SmallError;
use crate::field::{Field, Type};
use crate::operator::OpIterator;
use crate::schema::{FieldItem, Schema};
use crate::tuple::Tuple;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

struct GroupState {
    count: i64,
    sum: i64,
    min: Option<Field>,
    max: Option<Field>,
}

impl GroupState {
    fn new() -> GroupState {
        GroupState {
            count: 0,
            sum: 0,
            min: None,
            max: None,
        }
    }

    fn accumulate(&mut self, field: &Field) {
        self.count += 1;
        if let Field::Int(v) = field {
            self.sum += *v as i64;
        }
        self.min = Some(match self.min.take() {
            Some(cur) if cur.partial_cmp(field) != Some(std::cmp::Ordering::Greater) => cur,
            _ => field.clone(),
        });
        self.max = Some(match self.max.take() {
            Some(cur) if cur.partial_cmp(field) != Some(std::cmp::Ordering::Less) => cur,
            _ => field.clone(),
        });
    }

    fn result(&self, op: AggOp) -> Field {
        match op {
            AggOp::Count => Field::Int(self.count as i32),
            AggOp::Sum => Field::Int(self.sum as i32),
            AggOp::Avg => Field::Int(if self.count == 0 {
                0
            } else {
                (self.sum / self.count) as i32
            }),
            AggOp::Min => self.min.clone().unwrap_or(Field::Int(0)),
            AggOp::Max => self.max.clone().unwrap_or(Field::Int(0)),
        }
    }
}

/// Blocking aggregate: consumes every tuple from `child` at `open` time,
/// accumulating one [`GroupState`] per distinct value of the (optional)
/// group-by field, then streams out one result tuple per group.
///
/// Non-COUNT aggregates only accept `Type::Int` aggregate fields -- summing
/// or averaging a `Char` field makes no sense, and MIN/MAX over strings,
/// while well-defined, is outside what this core offers (COUNT is the only
/// aggregate the teacher's query language exposes for string columns).
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
    schema: Arc<Schema>,
    results: Option<std::vec::IntoIter<Tuple>>,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggOp,
    ) -> Result<Aggregate, SmallError> {
        let child_schema = child.get_schema();
        if op != AggOp::Count && child_schema.field_type(agg_field)? != Type::Int {
            return Err(SmallError::illegal_argument(
                "only COUNT may aggregate a non-integer field",
            ));
        }

        let result_name = format!("{:?}", op).to_lowercase();
        let mut fields = Vec::new();
        if let Some(gf) = group_field {
            fields.push(FieldItem {
                field_type: child_schema.field_type(gf)?,
                field_name: "groupby".to_string(),
            });
        }
        fields.push(FieldItem {
            field_type: Type::Int,
            field_name: result_name,
        });
        let schema = Arc::new(Schema::new(fields)?);

        Ok(Aggregate {
            child,
            agg_field,
            group_field,
            op,
            schema,
            results: None,
        })
    }

    fn compute(&mut self) -> Result<(), SmallError> {
        let mut groups: HashMap<Option<Field>, GroupState> = HashMap::new();
        let mut order: Vec<Option<Field>> = Vec::new();

        while let Some(t) = self.child.next()? {
            let key = match self.group_field {
                Some(gf) => Some(t.get_field(gf)?.clone()),
                None => None,
            };
            let value = t.get_field(self.agg_field)?.clone();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_insert_with(GroupState::new).accumulate(&value);
        }

        let op = self.op;
        let has_group = self.group_field.is_some();
        let out: Vec<Tuple> = order
            .into_iter()
            .map(|key| {
                let state = groups.get(&key).expect("key was just inserted above");
                let mut values = Vec::new();
                if has_group {
                    values.push(key.clone().expect("group key present when grouping"));
                }
                values.push(state.result(op));
                Tuple::new(Arc::clone(&self.schema), values).expect("result matches declared schema")
            })
            .collect();

        self.results = Some(out.into_iter());
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> Result<(), SmallError> {
        self.child.open()?;
        self.compute()
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        Ok(self
            .results
            .as_ref()
            .map(|it| it.as_slice().first().is_some())
            .unwrap_or(false))
    }

    fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
        Ok(self.results.as_mut().and_then(|it| it.next()))
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.child.rewind()?;
        self.compute()
    }

    fn close(&mut self) {
        self.child.close();
        self.results = None;
    }

    fn get_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::simple_int_schema;

    struct VecScan {
        schema: Arc<Schema>,
        source: Vec<Tuple>,
        iter: std::vec::IntoIter<Tuple>,
    }

    impl VecScan {
        fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> VecScan {
            VecScan {
                schema,
                iter: tuples.clone().into_iter(),
                source: tuples,
            }
        }
    }

    impl OpIterator for VecScan {
        fn open(&mut self) -> Result<(), SmallError> {
            self.iter = self.source.clone().into_iter();
            Ok(())
        }
        fn has_next(&mut self) -> Result<bool, SmallError> {
            Ok(self.iter.as_slice().first().is_some())
        }
        fn next(&mut self) -> Result<Option<Tuple>, SmallError> {
            Ok(self.iter.next())
        }
        fn rewind(&mut self) -> Result<(), SmallError> {
            self.open()
        }
        fn close(&mut self) {}
        fn get_schema(&self) -> Arc<Schema> {
            Arc::clone(&self.schema)
        }
    }

    fn rows(schema: &Arc<Schema>, pairs: &[(i32, i32)]) -> Vec<Tuple> {
        pairs
            .iter()
            .map(|(g, v)| Tuple::new(Arc::clone(schema), vec![Field::Int(*g), Field::Int(*v)]).unwrap())
            .collect()
    }

    #[test]
    fn sum_without_group_by() {
        let schema = Arc::new(simple_int_schema(2, "c"));
        let tuples = rows(&schema, &[(0, 1), (0, 2), (0, 3)]);
        let scan = VecScan::new(Arc::clone(&schema), tuples);
        let mut agg = Aggregate::new(Box::new(scan), 1, None, AggOp::Sum).unwrap();
        agg.open().unwrap();
        let t = agg.next().unwrap().unwrap();
        assert_eq!(*t.get_field(0).unwrap(), Field::Int(6));
        assert!(agg.next().unwrap().is_none());
    }

    #[test]
    fn avg_truncates_towards_zero_bias_of_integer_division() {
        let schema = Arc::new(simple_int_schema(2, "c"));
        let tuples = rows(&schema, &[(0, 1), (0, 2)]);
        let scan = VecScan::new(Arc::clone(&schema), tuples);
        let mut agg = Aggregate::new(Box::new(scan), 1, None, AggOp::Avg).unwrap();
        agg.open().unwrap();
        let t = agg.next().unwrap().unwrap();
        assert_eq!(*t.get_field(0).unwrap(), Field::Int(1));
    }

    #[test]
    fn groups_are_kept_separate() {
        let schema = Arc::new(simple_int_schema(2, "c"));
        let tuples = rows(&schema, &[(0, 1), (1, 10), (0, 2), (1, 20)]);
        let scan = VecScan::new(Arc::clone(&schema), tuples);
        let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Sum).unwrap();
        agg.open().unwrap();

        let mut out = Vec::new();
        while let Some(t) = agg.next().unwrap() {
            out.push((t.get_field(0).unwrap().clone(), t.get_field(1).unwrap().clone()));
        }
        assert_eq!(out.len(), 2);
        assert!(out.contains(&(Field::Int(0), Field::Int(3))));
        assert!(out.contains(&(Field::Int(1), Field::Int(30))));
    }

    #[test]
    fn non_count_aggregate_rejects_string_field() {
        use crate::field::Type as FType;
        let fields = vec![
            FieldItem { field_type: FType::Int, field_name: "g".into() },
            FieldItem { field_type: FType::Char(16), field_name: "name".into() },
        ];
        let schema = Arc::new(Schema::new(fields).unwrap());
        let scan = VecScan::new(Arc::clone(&schema), vec![]);
        assert!(Aggregate::new(Box::new(scan), 1, None, AggOp::Sum).is_err());
    }
}
