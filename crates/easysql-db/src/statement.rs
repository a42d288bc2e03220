//! SQL text generation.
//!
//! Identifiers, type names, constraint clauses and caller conditions are
//! interpolated into the SQL text. Row values and caller parameters are never
//! interpolated: they travel in [`Statement::params`] and are bound by the
//! driver. Keeping that split intact is what makes the value side of every
//! statement injection-safe.

use easysql_types::{ColumnDef, Columns, ForeignKey, Row, Value};

use crate::dialect::Dialect;

/// SQL text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

/// How an `INSERT` reacts to a unique-key conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Let the backend raise its constraint error.
    Fail,
    /// Silently skip the row.
    Ignore,
}

/// `CREATE TABLE IF NOT EXISTS` with column definitions followed by foreign keys.
pub fn create_table(name: &str, columns: &[ColumnDef], foreign_keys: &[ForeignKey]) -> String {
    let definitions: Vec<String> = columns
        .iter()
        .map(ColumnDef::render)
        .chain(foreign_keys.iter().map(ForeignKey::render))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {name} ({})",
        definitions.join(", ")
    )
}

pub fn drop_table(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {name}")
}

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {name}")
}

/// `INSERT INTO <table> (<cols>) VALUES (<placeholders>)`, binding every row value.
pub fn insert(dialect: Dialect, table: &str, row: &Row, conflict: Conflict) -> Statement {
    let verb = match conflict {
        Conflict::Fail => "INSERT INTO",
        Conflict::Ignore => dialect.insert_ignore(),
    };

    if row.is_empty() {
        return Statement::new(
            format!("{verb} {table} {}", dialect.default_values()),
            Vec::new(),
        );
    }

    let columns: Vec<&str> = row.columns().collect();
    let placeholders: Vec<String> = (1..=row.len()).map(|i| dialect.placeholder(i)).collect();
    Statement::new(
        format!(
            "{verb} {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        row.values().cloned().collect(),
    )
}

/// `UPDATE <table> SET c = ?, ... WHERE <condition>`.
///
/// SET values are bound first; `params` follow them and fill the
/// placeholders inside `condition`. The condition must use bare `?`: on
/// SQLite the SET slots are numbered `?1..?N`, so a numbered `?1` in the
/// condition would point back at the first SET value.
pub fn update(
    dialect: Dialect,
    table: &str,
    row: &Row,
    condition: &str,
    params: &[Value],
) -> Statement {
    let assignments: Vec<String> = row
        .columns()
        .enumerate()
        .map(|(i, column)| format!("{column} = {}", dialect.placeholder(i + 1)))
        .collect();

    let mut bound: Vec<Value> = row.values().cloned().collect();
    bound.extend_from_slice(params);

    Statement::new(
        format!(
            "UPDATE {table} SET {} WHERE {condition}",
            assignments.join(", ")
        ),
        bound,
    )
}

/// `DELETE FROM <table> WHERE <condition>`.
pub fn delete(table: &str, condition: &str, params: &[Value]) -> Statement {
    Statement::new(
        format!("DELETE FROM {table} WHERE {condition}"),
        params.to_vec(),
    )
}

/// `SELECT <columns> FROM <table> [WHERE <condition>]`.
///
/// An empty or whitespace-only condition is treated as absent.
pub fn select(
    table: &str,
    columns: &Columns,
    condition: Option<&str>,
    params: &[Value],
) -> Statement {
    let mut sql = format!("SELECT {} FROM {table}", columns.render());
    if let Some(condition) = condition.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(condition);
    }
    Statement::new(sql, params.to_vec())
}

/// `SELECT COUNT(*) FROM <table> WHERE c1 = ? AND ...` over the unique
/// columns that are actually present in `row`.
///
/// Returns `None` when no unique column is present, meaning there is
/// nothing to compare against.
pub fn count_matching(
    dialect: Dialect,
    table: &str,
    row: &Row,
    unique_columns: &[&str],
) -> Option<Statement> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for column in unique_columns {
        if let Some(value) = row.get(column) {
            params.push(value.clone());
            conditions.push(format!("{column} = {}", dialect.placeholder(params.len())));
        }
    }

    if conditions.is_empty() {
        return None;
    }

    Some(Statement::new(
        format!(
            "SELECT COUNT(*) FROM {table} WHERE {}",
            conditions.join(" AND ")
        ),
        params,
    ))
}
