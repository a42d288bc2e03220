//! CLI configuration loading from file and environment variables.

use easysql_db::{ConnectionDescriptor, IdentifierPolicy, Secret, SqliteSettings};
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which database to open and how.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Backend kind and its addressing fields.
    #[serde(flatten)]
    pub connection: ConnectionDescriptor,

    /// Reject table and column names that are not plain identifiers.
    #[serde(default)]
    pub strict_identifiers: bool,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enforce foreign keys on SQLite connections.
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

impl DatabaseConfig {
    pub fn sqlite_settings(&self) -> SqliteSettings {
        SqliteSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            foreign_keys: self.foreign_keys,
        }
    }

    pub fn identifier_policy(&self) -> IdentifierPolicy {
        if self.strict_identifiers {
            IdentifierPolicy::Validated
        } else {
            IdentifierPolicy::Trusted
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "easysql_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_db_path() -> String {
    "easysql.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    SqliteSettings::default().busy_timeout_ms
}

fn default_foreign_keys() -> bool {
    SqliteSettings::default().foreign_keys
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionDescriptor::sqlite(default_db_path()),
            strict_identifiers: false,
            busy_timeout_ms: default_busy_timeout_ms(),
            foreign_keys: default_foreign_keys(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from the given file.
    File,
    /// No file was found or given; defaults were used.
    Defaults,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Runs before logging is initialized, so it reports the origin instead of
/// logging it.
///
/// Environment variable overrides:
/// - `EASYSQL_DB_PATH` overrides `database.path` (sqlite)
/// - `EASYSQL_DB_HOST`, `EASYSQL_DB_PORT`, `EASYSQL_DB_USER`,
///   `EASYSQL_DB_PASSWORD`, `EASYSQL_DB_NAME` override the mysql fields
/// - `EASYSQL_LOG_LEVEL` overrides `logging.level`
/// - `EASYSQL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<(Config, ConfigOrigin), ConfigError> {
    let (mut config, origin) = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => (toml::from_str(&contents)?, ConfigOrigin::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Config::default(), ConfigOrigin::Defaults)
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => (Config::default(), ConfigOrigin::Defaults),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok((config, origin))
}

/// Applies `EASYSQL_*` overrides read through `lookup`.
///
/// Backend-specific variables only touch the backend the configuration
/// already selects.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    match &mut config.database.connection {
        ConnectionDescriptor::Sqlite { path } => {
            if let Some(p) = lookup("EASYSQL_DB_PATH") {
                *path = p.into();
            }
        }
        ConnectionDescriptor::Mysql {
            host,
            port,
            user,
            password,
            database,
        } => {
            if let Some(h) = lookup("EASYSQL_DB_HOST") {
                *host = h;
            }
            if let Some(parsed) = lookup("EASYSQL_DB_PORT").and_then(|p| p.parse().ok()) {
                *port = parsed;
            }
            if let Some(u) = lookup("EASYSQL_DB_USER") {
                *user = u;
            }
            if let Some(pw) = lookup("EASYSQL_DB_PASSWORD") {
                *password = Secret::new(pw);
            }
            if let Some(name) = lookup("EASYSQL_DB_NAME") {
                *database = name;
            }
        }
    }

    if let Some(level) = lookup("EASYSQL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("EASYSQL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
