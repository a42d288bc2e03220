//! Error types for the store adapter.

use thiserror::Error;

/// A failure raised by the underlying driver, before classification.
#[derive(Debug, Error)]
pub enum DriverError {
    /// SQLite reported an error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// MySQL reported an error.
    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MySql(#[from] mysql::Error),

    /// Filesystem access failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The call could not be turned into a valid statement.
    #[error("{0}")]
    Usage(String),
}

/// Errors returned by [`crate::Store`] operations.
///
/// A duplicate insert is not an error; it is reported as
/// [`crate::InsertOutcome::Skipped`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection to the database could not be opened.
    #[error("backend unavailable ({target}): {source}")]
    BackendUnavailable {
        /// Human-readable description of the backend, without credentials.
        target: String,
        /// The driver failure.
        source: DriverError,
    },

    /// A DDL statement failed.
    #[error("schema error on '{object}': {source}")]
    Schema {
        /// The database or table the statement targeted.
        object: String,
        /// The driver failure.
        source: DriverError,
    },

    /// A DML or query statement failed.
    #[error("query error on '{table}': {source}")]
    Query {
        /// The table the statement targeted.
        table: String,
        /// The driver failure.
        source: DriverError,
    },

    /// An identifier was rejected by [`crate::IdentifierPolicy::Validated`].
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl StoreError {
    pub(crate) fn unavailable(target: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::BackendUnavailable {
            target: target.into(),
            source: source.into(),
        }
    }

    pub(crate) fn schema(object: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::Schema {
            object: object.into(),
            source: source.into(),
        }
    }

    pub(crate) fn query(table: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::Query {
            table: table.into(),
            source: source.into(),
        }
    }
}
