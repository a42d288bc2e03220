//! easysql binary: runs one store command against a configured database.
//!
//! Loads configuration, initializes structured logging, opens the store
//! (creating the database if needed), and runs the requested command.

mod commands;
mod config;

use std::process::ExitCode;

use commands::{CliError, Command};
use easysql_db::Store;
use tracing_subscriber::EnvFilter;

/// Splits a leading `*.toml` argument off as the config path.
///
/// Falls back to `EASYSQL_CONFIG_PATH`, then to no explicit path.
fn resolve_config_path(args: &mut Vec<String>) -> (Option<String>, &'static str) {
    if args.first().is_some_and(|first| first.ends_with(".toml")) {
        return (Some(args.remove(0)), "cli-arg");
    }

    if let Ok(path) = std::env::var("EASYSQL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean for command output.
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn execute(config: &config::Config, command: &Command) -> Result<(), CliError> {
    let store = Store::open(
        config.database.connection.clone(),
        config.database.sqlite_settings(),
    )?
    .with_identifier_policy(config.database.identifier_policy());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&store, command, &mut out)
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let (resolved_config_path, config_source) = resolve_config_path(&mut args);
    let selected_config_path = resolved_config_path.as_deref().unwrap_or("easysql.toml");

    let (config, origin) = match config::load_config(Some(selected_config_path)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("easysql: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    if origin == config::ConfigOrigin::Defaults {
        tracing::info!(path = selected_config_path, "config file not found, using defaults");
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path,
        database = %config.database.connection.describe(),
        "resolved configuration"
    );

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("easysql: {e}\nusage: {}", commands::USAGE);
            return ExitCode::from(2);
        }
    };

    match execute(&config, &command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("easysql: {e}");
            ExitCode::FAILURE
        }
    }
}
