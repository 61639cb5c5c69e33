use std::fmt;
use std::sync::Arc;

use crate::error::SmallError;
use crate::field::Field;
use crate::page_id::RecordId;
use crate::schema::Schema;

/// A schema plus a position-indexed sequence of field values. Optionally
/// carries a [`RecordId`] once placed on a page.
#[derive(Clone, Debug)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(schema: Arc<Schema>, fields: Vec<Field>) -> Result<Tuple, SmallError> {
        if fields.len() != schema.num_fields() {
            return Err(SmallError::illegal_argument(
                "field count does not match schema",
            ));
        }
        for (i, f) in fields.iter().enumerate() {
            if f.field_type() != schema.field_type(i)? {
                return Err(SmallError::illegal_argument(&format!(
                    "field {} type mismatch",
                    i
                )));
            }
        }
        Ok(Tuple {
            schema,
            fields,
            record_id: None,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get_field(&self, i: usize) -> Result<&Field, SmallError> {
        self.fields
            .get(i)
            .ok_or_else(|| SmallError::no_such_element(&format!("no field at index {}", i)))
    }

    pub fn set_field(&mut self, i: usize, value: Field) -> Result<(), SmallError> {
        if i >= self.fields.len() {
            return Err(SmallError::no_such_element(&format!(
                "no field at index {}",
                i
            )));
        }
        self.fields[i] = value;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.schema.byte_size());
        for (i, field) in self.fields.iter().enumerate() {
            let type_len = self.schema.field_type(i).unwrap().len_bytes();
            bytes.extend_from_slice(&field.encode(type_len));
        }
        bytes
    }

    pub fn decode(schema: Arc<Schema>, bytes: &[u8]) -> Result<Tuple, SmallError> {
        let mut fields = Vec::with_capacity(schema.num_fields());
        let mut offset = 0;
        for i in 0..schema.num_fields() {
            let t = schema.field_type(i)?;
            let len = t.len_bytes();
            let slice = bytes
                .get(offset..offset + len)
                .ok_or_else(|| SmallError::db_error("tuple bytes too short to decode"))?;
            fields.push(Field::decode(t, slice));
            offset += len;
        }
        Ok(Tuple {
            schema,
            fields,
            record_id: None,
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::schema::simple_int_schema;

    #[test]
    fn encode_decode_round_trips() {
        let schema = Arc::new(simple_int_schema(3, "c"));
        let t = Tuple::new(
            Arc::clone(&schema),
            vec![Field::Int(1), Field::Int(2), Field::Int(3)],
        )
        .unwrap();
        let bytes = t.encode();
        let back = Tuple::decode(schema, &bytes).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn rejects_schema_mismatch() {
        let schema = Arc::new(simple_int_schema(2, "c"));
        assert!(Tuple::new(schema, vec![Field::Int(1)]).is_err());
    }
}
