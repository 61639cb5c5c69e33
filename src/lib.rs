pub mod buffer_pool;
pub mod catalog;
pub mod concurrency;
pub mod database;
pub mod error;
pub mod field;
pub mod heap_file;
pub mod operator;
pub mod operators;
pub mod page;
pub mod page_id;
pub mod predicate;
pub mod schema;
pub mod transaction;
pub mod tuple;
pub mod types;
pub mod utils;
pub mod wal;

pub use database::Database;
pub use error::SmallError;
pub use transaction::TransactionId;
