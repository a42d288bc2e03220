//! Database access layer for easysql.
//!
//! Provides a small, uniform CRUD surface ([`Store`]) over SQLite files,
//! private in-memory SQLite databases, and (with the `mysql` feature) MySQL
//! servers. Each call opens a connection, runs one unit of work, and releases
//! the connection before returning.
//!
//! # Design decisions
//!
//! - **Connection per call**: no pool, no long-lived handles. The backend is
//!   an injected [`Backend`] strategy, so tests run against
//!   [`MemoryBackend`] without touching the filesystem.
//! - **Values bound, identifiers interpolated**: row values and condition
//!   parameters always travel as bound parameters. Table names, column
//!   names and DDL fragments are spliced into SQL text, which is the
//!   caller's responsibility (see [`IdentifierPolicy`]).
//! - **Explicit outcomes**: an insert is `Inserted`, `Skipped` (duplicate),
//!   or an error. Failed queries are errors, never an empty result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use easysql_db::{InsertOutcome, Store};
//! use easysql_types::{ColumnDef, Row};
//!
//! let store = Store::in_memory()?;
//! store.create_table(
//!     "employees",
//!     &[
//!         ColumnDef::new("id", "INTEGER").constraints("PRIMARY KEY"),
//!         ColumnDef::new("email", "TEXT"),
//!     ],
//!     &[],
//! )?;
//!
//! let row = Row::new().with("id", 1).with("email", "a@x.com");
//! assert_eq!(store.insert("employees", &row, &["email"])?, InsertOutcome::Inserted);
//! assert_eq!(store.insert("employees", &row, &["email"])?, InsertOutcome::Skipped);
//! ```

mod backend;
mod descriptor;
mod dialect;
mod error;
mod identifier;
pub mod statement;
mod store;

pub use backend::{Backend, MemoryBackend, Session, SqliteBackend, SqliteSettings};
#[cfg(feature = "mysql")]
pub use backend::MySqlBackend;
pub use descriptor::{ConnectionDescriptor, Secret};
pub use dialect::Dialect;
pub use error::{DriverError, StoreError};
pub use identifier::{validate_identifier, IdentifierPolicy};
pub use store::{InsertOutcome, Store};

#[cfg(test)]
mod tests;
