//! Connection strategies.
//!
//! A [`Backend`] knows how to reach one database and hands out a fresh
//! [`Session`] per operation. The session owns (or borrows) the connection
//! and releases it when dropped, so every early return in the store still
//! closes the connection.

mod sqlite;

#[cfg(feature = "mysql")]
mod mysql;

pub use sqlite::{MemoryBackend, SqliteBackend, SqliteSettings};

#[cfg(feature = "mysql")]
pub use self::mysql::MySqlBackend;

use easysql_types::{Row, Value};

use crate::dialect::Dialect;
use crate::error::DriverError;

/// Source of connections for a [`crate::Store`].
pub trait Backend: Send + Sync {
    /// SQL flavor spoken by this backend.
    fn dialect(&self) -> Dialect;

    /// Credential-free description for logs and errors.
    fn describe(&self) -> String;

    /// Creates the database if it does not exist yet. Must be idempotent.
    fn ensure_database(&self) -> Result<(), DriverError>;

    /// Opens a connection scoped to one operation.
    fn connect(&self) -> Result<Box<dyn Session + '_>, DriverError>;
}

/// One open connection. Dropping it releases the connection.
pub trait Session {
    /// Executes a statement that returns no rows; returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Executes a query and collects every row.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;
}
