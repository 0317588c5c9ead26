//! Persistence layer: the owned store handle plus the row-level queries.

mod connection;
mod records;

pub use connection::{ensure_schema, Store};
pub use records::{delete, insert, list_all, update};
