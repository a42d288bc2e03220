//! Per-backend SQL differences.

/// The SQL flavor a backend speaks.
///
/// Statement builders ask the dialect for every token that differs between
/// backends, so the rest of the crate works with a single notion of "value
/// placeholder" and "list tables".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite: numbered `?N` placeholders.
    Sqlite,
    /// MySQL / MariaDB: positional `?` placeholders.
    MySql,
}

impl Dialect {
    /// Placeholder for the `index`-th bound value (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::MySql => "?".to_string(),
        }
    }

    /// Query returning one row per user table, name in the first column.
    ///
    /// SQLite reserves the exact, case-sensitive `sqlite_` prefix; `LIKE`
    /// would also match `sqlitelogs` or `SQLiteCache`.
    pub fn list_tables_sql(self) -> &'static str {
        match self {
            Self::Sqlite => {
                "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' ORDER BY name"
            }
            Self::MySql => "SHOW TABLES",
        }
    }

    /// `INSERT` verb that turns unique-key conflicts into a no-op.
    pub fn insert_ignore(self) -> &'static str {
        match self {
            Self::Sqlite => "INSERT OR IGNORE INTO",
            Self::MySql => "INSERT IGNORE INTO",
        }
    }

    /// Tail of an `INSERT` that supplies no columns.
    pub fn default_values(self) -> &'static str {
        match self {
            Self::Sqlite => "DEFAULT VALUES",
            Self::MySql => "() VALUES ()",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
