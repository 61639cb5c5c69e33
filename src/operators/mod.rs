pub mod aggregate;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod sequential_scan;

pub use aggregate::{AggOp, Aggregate};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use sequential_scan::SequentialScan;
