//! SQLite backends: a database file, or a private in-memory database.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use easysql_types::{Row, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::{Backend, Session};
use crate::dialect::Dialect;
use crate::error::DriverError;

/// Per-connection tunables applied every time a connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Whether `PRAGMA foreign_keys` is switched on.
    pub foreign_keys: bool,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            foreign_keys: true,
        }
    }
}

fn configure(conn: &Connection, settings: SqliteSettings) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
    conn.execute_batch(if settings.foreign_keys {
        "PRAGMA foreign_keys = ON;"
    } else {
        "PRAGMA foreign_keys = OFF;"
    })
}

/// A SQLite database file. Every session opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
    settings: SqliteSettings,
}

impl SqliteBackend {
    pub fn new(path: impl Into<PathBuf>, settings: SqliteSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags)?;
        configure(&conn, self.settings)?;
        Ok(conn)
    }

    /// Looks for an entry with exactly this file name (case-sensitive) in the
    /// containing directory.
    ///
    /// This is informational only. Another process may create the file
    /// between the listing and the open; opening with `SQLITE_OPEN_CREATE`
    /// tolerates that.
    fn listed_in_directory(&self) -> std::io::Result<bool> {
        let Some(file_name) = self.path.file_name() else {
            return Ok(false);
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        for entry in std::fs::read_dir(dir)? {
            if entry?.file_name() == file_name {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Backend for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn ensure_database(&self) -> Result<(), DriverError> {
        if self.listed_in_directory()? {
            tracing::info!(path = %self.path.display(), "database file already exists");
            return Ok(());
        }

        let conn = self.open()?;
        // Touch the file so it exists on disk once we return.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))?;
        tracing::info!(path = %self.path.display(), "created database file");
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn Session + '_>, DriverError> {
        let conn = self.open()?;
        Ok(Box::new(SqliteSession {
            handle: Handle::Owned(conn),
        }))
    }
}

/// A single in-memory SQLite database shared by every session of this backend.
///
/// Sessions take turns on one connection, because an in-memory database
/// disappears with the last connection that references it. Useful for tests
/// and scratch work.
#[derive(Debug)]
pub struct MemoryBackend {
    conn: Mutex<Connection>,
}

impl MemoryBackend {
    /// Opens a fresh, empty in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Sqlite` if SQLite cannot allocate the database.
    pub fn new(settings: SqliteSettings) -> Result<Self, DriverError> {
        let conn = Connection::open_in_memory()?;
        configure(&conn, settings)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Backend for MemoryBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn describe(&self) -> String {
        "sqlite::memory:".to_string()
    }

    fn ensure_database(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn Session + '_>, DriverError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| DriverError::Usage("in-memory connection lock poisoned".to_string()))?;
        Ok(Box::new(SqliteSession {
            handle: Handle::Shared(guard),
        }))
    }
}

enum Handle<'a> {
    Owned(Connection),
    Shared(MutexGuard<'a, Connection>),
}

struct SqliteSession<'a> {
    handle: Handle<'a>,
}

impl SqliteSession<'_> {
    fn conn(&self) -> &Connection {
        match &self.handle {
            Handle::Owned(conn) => conn,
            Handle::Shared(guard) => &**guard,
        }
    }
}

impl Session for SqliteSession<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        let changed = self.conn().execute(sql, params_from_iter(params.iter().map(to_sql)))?;
        Ok(changed as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        let mut stmt = self.conn().prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter().map(to_sql)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, name) in names.iter().enumerate() {
                record.insert(name.clone(), from_sql(row.get_ref(idx)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
