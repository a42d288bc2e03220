//! Operator commands over a configured store.

use std::io::Write;

use easysql_db::{Store, StoreError};
use easysql_types::Columns;
use thiserror::Error;

/// One-line synopsis printed alongside usage errors.
pub const USAGE: &str =
    "easysql [config.toml] <init | tables | select <table> [columns] [condition] | drop <table>>";

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command line could not be understood.
    #[error("{0}")]
    Usage(String),

    /// The store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// A row could not be encoded as JSON.
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Make sure the configured database exists.
    Init,
    /// Print table names, one per line.
    Tables,
    /// Print matching rows as JSON lines.
    Select {
        table: String,
        columns: Columns,
        condition: Option<String>,
    },
    /// Drop a table if it exists.
    Drop { table: String },
}

impl Command {
    /// Parses the arguments that follow the optional config path.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Usage` for unknown commands or missing arguments.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut args = args.iter().map(String::as_str);
        let command = args
            .next()
            .ok_or_else(|| CliError::Usage("missing command".to_string()))?;

        let parsed = match command {
            "init" => Self::Init,
            "tables" => Self::Tables,
            "select" => {
                let table = args
                    .next()
                    .ok_or_else(|| CliError::Usage("select needs a table".to_string()))?;
                Self::Select {
                    table: table.to_string(),
                    columns: args.next().map(Columns::from).unwrap_or_default(),
                    condition: args.next().map(str::to_string),
                }
            }
            "drop" => {
                let table = args
                    .next()
                    .ok_or_else(|| CliError::Usage("drop needs a table".to_string()))?;
                Self::Drop {
                    table: table.to_string(),
                }
            }
            other => return Err(CliError::Usage(format!("unknown command '{other}'"))),
        };

        if let Some(extra) = args.next() {
            return Err(CliError::Usage(format!("unexpected argument '{extra}'")));
        }
        Ok(parsed)
    }
}

/// Runs `command` against `store`, writing results to `out`.
///
/// # Errors
///
/// Returns `CliError` if the store operation or the output fails.
pub fn run(store: &Store, command: &Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Init => {
            store.ensure_database_exists()?;
            writeln!(out, "ok")?;
        }
        Command::Tables => {
            for table in store.list_tables()? {
                writeln!(out, "{table}")?;
            }
        }
        Command::Select {
            table,
            columns,
            condition,
        } => {
            let rows = store.select(table, columns.clone(), condition.as_deref(), &[])?;
            tracing::debug!(table = %table, rows = rows.len(), "select finished");
            for row in &rows {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }
        Command::Drop { table } => {
            store.drop_table(table)?;
            writeln!(out, "dropped {table}")?;
        }
    }
    Ok(())
}
