//! DDL fragments and column selectors.
//!
//! Everything here is rendered into SQL text verbatim. None of it is ever
//! bound as a parameter, so the caller owns the safety of these strings.

use serde::{Deserialize, Serialize};

/// One column of a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type, e.g. `INTEGER` or `VARCHAR(255)`.
    pub sql_type: String,
    /// Free-form constraint clause, e.g. `PRIMARY KEY` or `NOT NULL UNIQUE`.
    #[serde(default)]
    pub constraints: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            constraints: String::new(),
        }
    }

    /// Sets the constraint clause.
    pub fn constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Renders `<name> <type> <constraints>`.
    pub fn render(&self) -> String {
        format!("{} {} {}", self.name, self.sql_type, self.constraints)
            .trim_end()
            .to_string()
    }
}

impl<N, T, C> From<(N, T, C)> for ColumnDef
where
    N: Into<String>,
    T: Into<String>,
    C: Into<String>,
{
    fn from((name, sql_type, constraints): (N, T, C)) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            constraints: constraints.into(),
        }
    }
}

/// A table-level `FOREIGN KEY` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Column in the table being created.
    pub column: String,
    /// Referenced table.
    pub references_table: String,
    /// Referenced column.
    pub references_column: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
        }
    }

    /// Renders `FOREIGN KEY (<col>) REFERENCES <table>(<col>)`.
    pub fn render(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            self.column, self.references_table, self.references_column
        )
    }
}

impl<A, B, C> From<(A, B, C)> for ForeignKey
where
    A: Into<String>,
    B: Into<String>,
    C: Into<String>,
{
    fn from((column, table, referenced): (A, B, C)) -> Self {
        Self::new(column, table, referenced)
    }
}

/// Projection for a `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// Caller-joined column text, passed through as-is.
    Raw(String),
    /// Column names, joined with `", "`.
    List(Vec<String>),
}

impl Columns {
    /// Renders the projection list.
    pub fn render(&self) -> String {
        match self {
            Self::All => "*".to_string(),
            Self::Raw(text) => text.clone(),
            Self::List(names) => names.join(", "),
        }
    }

    /// Individual column names, for identifier checks.
    ///
    /// `Raw` text is split on commas; `All` yields nothing.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::All => Vec::new(),
            Self::Raw(text) => text.split(',').map(str::trim).collect(),
            Self::List(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Columns {
    fn from(text: &str) -> Self {
        match text.trim() {
            "*" => Self::All,
            other => Self::Raw(other.to_string()),
        }
    }
}

impl From<String> for Columns {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<Vec<String>> for Columns {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(names: Vec<&str>) -> Self {
        Self::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(names: &[&str]) -> Self {
        Self::List(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.iter().map(|n| n.to_string()).collect())
    }
}
