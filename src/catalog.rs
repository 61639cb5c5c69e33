use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SmallError;
use crate::heap_file::HeapFile;
use crate::schema::Schema;

/// Name↔table-id bimap; each table's schema and backing [`HeapFile`].
///
/// Mirrors the teacher's `Catalog`/`common::catalog` pairing of a
/// `table_id -> HeapFile` map with a name index, generalized to carry the
/// schema alongside the file the way `database.rs`'s `Catalog` does.
pub struct Catalog {
    tables: HashMap<i32, Arc<HeapFile>>,
    name_to_id: HashMap<String, i32>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog {
            tables: HashMap::new(),
            name_to_id: HashMap::new(),
        }
    }

    pub fn add_table(&mut self, name: &str, file: HeapFile) -> i32 {
        let table_id = file.id();
        self.name_to_id.insert(name.to_string(), table_id);
        self.tables.insert(table_id, Arc::new(file));
        table_id
    }

    pub fn get_file(&self, table_id: i32) -> Result<Arc<HeapFile>, SmallError> {
        self.tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| SmallError::no_such_element(&format!("no table with id {}", table_id)))
    }

    pub fn get_table_id(&self, name: &str) -> Result<i32, SmallError> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| SmallError::no_such_element(&format!("no table named {}", name)))
    }

    pub fn get_schema(&self, table_id: i32) -> Result<Arc<Schema>, SmallError> {
        Ok(self.get_file(table_id)?.schema())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}
