use std::fmt;

use crate::error::SmallError;
use crate::field::Type;

/// One named, typed column of a [`Schema`].
#[derive(Clone, PartialEq, Debug)]
pub struct FieldItem {
    pub field_type: Type,
    pub field_name: String,
}

/// An ordered, non-empty sequence of (Type, optional name). Immutable once
/// constructed. Two schemas are equal iff their type sequences match
/// position-wise; names are not compared.
#[derive(Clone, Debug)]
pub struct Schema {
    fields: Vec<FieldItem>,
}

impl Schema {
    pub fn new(fields: Vec<FieldItem>) -> Result<Schema, SmallError> {
        if fields.is_empty() {
            return Err(SmallError::illegal_argument(
                "schema must have at least one field",
            ));
        }
        Ok(Schema { fields })
    }

    pub fn merge(left: &Schema, right: &Schema) -> Schema {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.clone());
        Schema { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> Result<Type, SmallError> {
        self.fields
            .get(i)
            .map(|f| f.field_type)
            .ok_or_else(|| SmallError::no_such_element(&format!("no field at index {}", i)))
    }

    pub fn field_name(&self, i: usize) -> Result<&str, SmallError> {
        self.fields
            .get(i)
            .map(|f| f.field_name.as_str())
            .ok_or_else(|| SmallError::no_such_element(&format!("no field at index {}", i)))
    }

    pub fn index_of(&self, name: &str) -> Result<usize, SmallError> {
        self.fields
            .iter()
            .position(|f| f.field_name == name)
            .ok_or_else(|| SmallError::no_such_element(&format!("no field named {}", name)))
    }

    pub fn fields(&self) -> &[FieldItem] {
        &self.fields
    }

    /// Sum of the on-disk byte length of every field; the tuple byte width.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.len_bytes()).sum()
    }

    /// Build a new schema with every field name prefixed `alias.`, the way
    /// `SequentialScan` exposes its child table's columns.
    pub fn with_alias(&self, alias: &str) -> Schema {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldItem {
                field_type: f.field_type,
                field_name: if alias.is_empty() {
                    f.field_name.clone()
                } else {
                    format!("{}.{}", alias, f.field_name)
                },
            })
            .collect();
        Schema { fields }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}({:?})", field.field_name, field.field_type))
            .collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// A schema of `width` int columns named `prefix-0`, `prefix-1`, ... Handy
/// for tests, mirroring the teacher's `simple_int_tuple_scheme`.
pub fn simple_int_schema(width: usize, prefix: &str) -> Schema {
    let fields = (0..width)
        .map(|i| FieldItem {
            field_type: Type::Int,
            field_name: format!("{}{}", prefix, i),
        })
        .collect();
    Schema::new(fields).expect("width must be > 0")
}
