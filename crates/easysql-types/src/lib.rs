//! Shared value and schema types for easysql.
//!
//! This crate holds the data shapes that cross the adapter boundary: scalar
//! [`Value`]s, ordered [`Row`]s, and the DDL fragments ([`ColumnDef`],
//! [`ForeignKey`]) a caller hands to `create_table`. It has no database
//! dependency so that callers can build rows and schemas without pulling in
//! a driver.

mod row;
mod schema;
mod value;

pub use row::Row;
pub use schema::{ColumnDef, Columns, ForeignKey};
pub use value::Value;
