//! Connection descriptors: where a store's database lives.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, SqliteBackend, SqliteSettings};
use crate::error::StoreError;

/// A credential that is never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

fn default_mysql_port() -> u16 {
    3306
}

/// Addresses one database on one backend.
///
/// Deserializes from a table tagged by `backend`:
///
/// ```toml
/// backend = "sqlite"
/// path = "employees.db"
/// ```
///
/// ```toml
/// backend = "mysql"
/// host = "localhost"
/// user = "app"
/// password = "secret"
/// database = "hr"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ConnectionDescriptor {
    /// A SQLite database file.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
    /// A database on a MySQL server.
    Mysql {
        /// Server host name or IP address.
        host: String,
        /// Server port.
        #[serde(default = "default_mysql_port")]
        port: u16,
        /// Login user.
        user: String,
        /// Login password.
        #[serde(default)]
        password: Secret,
        /// Database (schema) name.
        database: String,
    },
}

impl ConnectionDescriptor {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite { path: path.into() }
    }

    /// A MySQL descriptor on the default port.
    pub fn mysql(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self::Mysql {
            host: host.into(),
            port: default_mysql_port(),
            user: user.into(),
            password: Secret::new(password),
            database: database.into(),
        }
    }

    /// A credential-free label, used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Sqlite { path } => format!("sqlite:{}", path.display()),
            Self::Mysql {
                host,
                port,
                user,
                database,
                ..
            } => format!("mysql://{user}@{host}:{port}/{database}"),
        }
    }

    /// Builds the backend strategy for this descriptor.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` for a MySQL descriptor when
    /// the crate was built without the `mysql` feature.
    pub fn into_backend(self, settings: SqliteSettings) -> Result<Box<dyn Backend>, StoreError> {
        match self {
            Self::Sqlite { path } => Ok(Box::new(SqliteBackend::new(path, settings))),
            #[cfg(feature = "mysql")]
            Self::Mysql {
                host,
                port,
                user,
                password,
                database,
            } => Ok(Box::new(crate::backend::MySqlBackend::new(
                host, port, user, password, database,
            ))),
            #[cfg(not(feature = "mysql"))]
            other @ Self::Mysql { .. } => Err(StoreError::unavailable(
                other.describe(),
                crate::error::DriverError::Usage(
                    "easysql-db was built without the `mysql` feature".to_string(),
                ),
            )),
        }
    }
}
