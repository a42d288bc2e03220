//! The store adapter: one connection, one unit of work, per call.
//!
//! Every public method acquires a [`Session`] from the backend, runs its
//! statement(s), and lets the session drop on return. There is no state
//! between calls apart from the backend itself.
//!
//! # Trust boundary
//!
//! Table names, column names, column types, constraint clauses, foreign-key
//! references and `condition` strings are spliced into SQL text. Row values
//! and `params` are always bound. Callers own the safety of the former;
//! [`IdentifierPolicy::Validated`] can vet table and column names for them.

use easysql_types::{ColumnDef, Columns, ForeignKey, Row, Value};

use crate::backend::{Backend, MemoryBackend, Session, SqliteSettings};
use crate::descriptor::ConnectionDescriptor;
use crate::dialect::Dialect;
use crate::error::{DriverError, StoreError};
use crate::identifier::IdentifierPolicy;
use crate::statement::{self, Conflict, Statement};

/// Result of an insert that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written.
    Inserted,
    /// A matching row already existed; the table was not touched.
    Skipped,
}

/// Uniform CRUD over one database.
pub struct Store {
    backend: Box<dyn Backend>,
    identifiers: IdentifierPolicy,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.describe())
            .field("identifiers", &self.identifiers)
            .finish()
    }
}

impl Store {
    /// Builds the backend for `descriptor` and makes sure its database exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the backend cannot be
    /// reached, or `StoreError::Schema` if the database cannot be created.
    pub fn open(
        descriptor: ConnectionDescriptor,
        settings: SqliteSettings,
    ) -> Result<Self, StoreError> {
        let store = Self::from_boxed(descriptor.into_backend(settings)?);
        store.ensure_database_exists()?;
        Ok(store)
    }

    /// Wraps an already-built backend. Does not touch the database.
    pub fn with_backend<B: Backend + 'static>(backend: B) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    /// Like [`Store::with_backend`], for a backend chosen at runtime.
    pub fn from_boxed(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            identifiers: IdentifierPolicy::default(),
        }
    }

    /// A store over a fresh private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if SQLite cannot open it.
    pub fn in_memory() -> Result<Self, StoreError> {
        let backend = MemoryBackend::new(SqliteSettings::default())
            .map_err(|e| StoreError::unavailable("sqlite::memory:", e))?;
        Ok(Self::with_backend(backend))
    }

    /// Sets how table and column names are vetted before interpolation.
    pub fn with_identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifiers = policy;
        self
    }

    /// Creates the database (or database file) if it is missing.
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// `StoreError::BackendUnavailable` if the server or filesystem cannot be
    /// reached; `StoreError::Schema` if the server refuses the creation.
    pub fn ensure_database_exists(&self) -> Result<(), StoreError> {
        self.backend.ensure_database().map_err(|e| {
            let target = self.backend.describe();
            // A server that answered but refused the statement is reachable.
            let err = if rejected_by_server(&e) {
                StoreError::schema(target, e)
            } else {
                StoreError::unavailable(target, e)
            };
            self.fail(err)
        })
    }

    /// `CREATE TABLE IF NOT EXISTS`.
    ///
    /// No shape check is made against an existing table of the same name.
    ///
    /// # Errors
    ///
    /// `StoreError::Schema` if the generated DDL is rejected.
    pub fn create_table(
        &self,
        name: &str,
        columns: &[ColumnDef],
        foreign_keys: &[ForeignKey],
    ) -> Result<(), StoreError> {
        self.vet(name)?;
        self.vet_all(columns.iter().map(|c| c.name.as_str()))?;
        self.vet_all(foreign_keys.iter().flat_map(|fk| {
            [
                fk.column.as_str(),
                fk.references_table.as_str(),
                fk.references_column.as_str(),
            ]
        }))?;

        let sql = statement::create_table(name, columns, foreign_keys);
        let mut session = self.connect()?;
        run(session.as_mut(), &sql, &[]).map_err(|e| self.fail(StoreError::schema(name, e)))?;
        tracing::info!(table = name, columns = columns.len(), "table ensured");
        Ok(())
    }

    /// Inserts `row`, unless a row with the same values on `unique_columns`
    /// already exists.
    ///
    /// Only unique columns present in `row` take part in the comparison.
    /// With no such column the check is skipped and the row always goes in.
    /// The check and the insert share one connection but not one
    /// transaction, so concurrent writers can still race past the check;
    /// see [`Store::insert_ignoring_conflicts`] for the constraint-backed
    /// alternative.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the duplicate check or the insert fails.
    pub fn insert(
        &self,
        table: &str,
        row: &Row,
        unique_columns: &[&str],
    ) -> Result<InsertOutcome, StoreError> {
        self.check_row(table, row)?;
        self.vet_all(unique_columns.iter().copied())?;

        let mut session = self.connect()?;
        if self.duplicate_in(session.as_mut(), table, row, unique_columns)? {
            tracing::info!(table, "duplicate record found, insertion skipped");
            return Ok(InsertOutcome::Skipped);
        }

        let stmt = statement::insert(self.dialect(), table, row, Conflict::Fail);
        self.execute(session.as_mut(), table, &stmt)?;
        tracing::debug!(table, columns = row.len(), "row inserted");
        Ok(InsertOutcome::Inserted)
    }

    /// Inserts `row` in a single statement that lets the backend drop it on a
    /// unique-key conflict (`INSERT OR IGNORE` / `INSERT IGNORE`).
    ///
    /// Duplicate detection is only as strong as the UNIQUE or PRIMARY KEY
    /// constraints declared on the table. On MySQL, `INSERT IGNORE` also
    /// downgrades some other errors (such as NOT NULL violations) to
    /// warnings, which surface here as `Skipped`.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the statement fails.
    pub fn insert_ignoring_conflicts(
        &self,
        table: &str,
        row: &Row,
    ) -> Result<InsertOutcome, StoreError> {
        self.check_row(table, row)?;

        let stmt = statement::insert(self.dialect(), table, row, Conflict::Ignore);
        let mut session = self.connect()?;
        let affected = self.execute(session.as_mut(), table, &stmt)?;
        if affected == 0 {
            tracing::info!(table, "row conflicts with a unique constraint, insertion skipped");
            Ok(InsertOutcome::Skipped)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// `UPDATE <table> SET ... WHERE <condition>`.
    ///
    /// `condition` is raw SQL; its placeholders are filled from `params`,
    /// which are bound after the values in `row`. Write them as bare `?`;
    /// numbered `?N` placeholders collide with the SET slots on SQLite.
    /// Returns the number of rows the backend reports as affected.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if `row` is empty or the statement fails.
    pub fn update(
        &self,
        table: &str,
        row: &Row,
        condition: &str,
        params: &[Value],
    ) -> Result<u64, StoreError> {
        self.check_row(table, row)?;
        if row.is_empty() {
            return Err(self.fail(StoreError::query(
                table,
                DriverError::Usage("update requires at least one column".to_string()),
            )));
        }

        let stmt = statement::update(self.dialect(), table, row, condition, params);
        let mut session = self.connect()?;
        let affected = self.execute(session.as_mut(), table, &stmt)?;
        tracing::debug!(table, affected, "rows updated");
        Ok(affected)
    }

    /// `DELETE FROM <table> WHERE <condition>`. Returns the affected row count.
    ///
    /// Placeholders in `condition` are bare `?`, filled from `params` in order.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the statement fails.
    pub fn delete(&self, table: &str, condition: &str, params: &[Value]) -> Result<u64, StoreError> {
        self.vet(table)?;

        let stmt = statement::delete(table, condition, params);
        let mut session = self.connect()?;
        let affected = self.execute(session.as_mut(), table, &stmt)?;
        tracing::debug!(table, affected, "rows deleted");
        Ok(affected)
    }

    /// `SELECT <columns> FROM <table> [WHERE <condition>]`.
    ///
    /// Rows come back in whatever order the backend produces them. A query
    /// that matches nothing returns an empty vector; a query that fails
    /// returns an error. Placeholders in `condition` are bare `?`, filled
    /// from `params` in order.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the statement fails.
    pub fn select(
        &self,
        table: &str,
        columns: impl Into<Columns>,
        condition: Option<&str>,
        params: &[Value],
    ) -> Result<Vec<Row>, StoreError> {
        let columns = columns.into();
        self.vet(table)?;
        self.vet_all(columns.names())?;

        let stmt = statement::select(table, &columns, condition, params);
        let mut session = self.connect()?;
        fetch(session.as_mut(), &stmt).map_err(|e| self.fail(StoreError::query(table, e)))
    }

    /// Names of the tables currently defined.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the catalog query fails.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let sql = self.dialect().list_tables_sql();
        let mut session = self.connect()?;
        let rows = fetch(
            session.as_mut(),
            &Statement {
                sql: sql.to_string(),
                params: Vec::new(),
            },
        )
        .map_err(|e| self.fail(StoreError::query("<catalog>", e)))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get_index(0))
            .map(|name| match name {
                Value::Text(text) => text.clone(),
                other => other.to_string(),
            })
            .collect())
    }

    /// `DROP TABLE IF EXISTS`. Dropping a missing table is not an error.
    ///
    /// # Errors
    ///
    /// `StoreError::Schema` if the backend rejects the drop, e.g. because
    /// another table still references it.
    pub fn drop_table(&self, name: &str) -> Result<(), StoreError> {
        self.vet(name)?;

        let sql = statement::drop_table(name);
        let mut session = self.connect()?;
        run(session.as_mut(), &sql, &[]).map_err(|e| self.fail(StoreError::schema(name, e)))?;
        tracing::info!(table = name, "table dropped");
        Ok(())
    }

    /// Whether a row with the same values on the present `unique_columns`
    /// already exists in `table`.
    ///
    /// Returns `false` without touching the database when `unique_columns`
    /// is empty or none of them appear in `row`.
    ///
    /// # Errors
    ///
    /// `StoreError::Query` if the count query fails.
    pub fn is_duplicate(
        &self,
        table: &str,
        row: &Row,
        unique_columns: &[&str],
    ) -> Result<bool, StoreError> {
        self.vet(table)?;
        self.vet_all(unique_columns.iter().copied())?;

        if statement::count_matching(self.dialect(), table, row, unique_columns).is_none() {
            return Ok(false);
        }
        let mut session = self.connect()?;
        self.duplicate_in(session.as_mut(), table, row, unique_columns)
    }

    fn duplicate_in(
        &self,
        session: &mut dyn Session,
        table: &str,
        row: &Row,
        unique_columns: &[&str],
    ) -> Result<bool, StoreError> {
        let Some(stmt) = statement::count_matching(self.dialect(), table, row, unique_columns)
        else {
            return Ok(false);
        };

        let rows = fetch(session, &stmt).map_err(|e| self.fail(StoreError::query(table, e)))?;
        let count = rows
            .first()
            .and_then(|r| r.get_index(0))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count > 0)
    }

    fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    fn vet(&self, name: &str) -> Result<(), StoreError> {
        self.identifiers.check(name).map_err(|e| self.fail(e))
    }

    fn vet_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), StoreError> {
        self.identifiers.check_all(names).map_err(|e| self.fail(e))
    }

    fn check_row(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        self.vet(table)?;
        self.vet_all(row.columns())
    }

    fn connect(&self) -> Result<Box<dyn Session + '_>, StoreError> {
        self.backend
            .connect()
            .map_err(|e| self.fail(StoreError::unavailable(self.backend.describe(), e)))
    }

    fn execute(
        &self,
        session: &mut dyn Session,
        table: &str,
        stmt: &Statement,
    ) -> Result<u64, StoreError> {
        run(session, &stmt.sql, &stmt.params).map_err(|e| self.fail(StoreError::query(table, e)))
    }

    fn fail(&self, err: StoreError) -> StoreError {
        tracing::warn!(backend = %self.backend.describe(), error = %err, "store operation failed");
        err
    }
}

fn rejected_by_server(err: &DriverError) -> bool {
    match err {
        #[cfg(feature = "mysql")]
        DriverError::MySql(::mysql::Error::MySqlError(_)) => true,
        _ => false,
    }
}

fn run(session: &mut dyn Session, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
    tracing::debug!(sql, params = params.len(), "executing statement");
    session.execute(sql, params)
}

fn fetch(session: &mut dyn Session, stmt: &Statement) -> Result<Vec<Row>, DriverError> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "executing query");
    session.query(&stmt.sql, &stmt.params)
}
