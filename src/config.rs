//! Environment-driven configuration.
//!
//! | Variable            | Meaning                                   |
//! |---------------------|-------------------------------------------|
//! | `HBNB_TYPE_STORAGE` | `db` selects the database, else the file  |
//! | `HBNB_FILE_PATH`    | JSON store path (default `file.json`)     |
//! | `HBNB_DB_USER`      | database user                             |
//! | `HBNB_DB_PWD`       | database password                         |
//! | `HBNB_DB_HOST`      | database host (default `localhost`)       |
//! | `HBNB_DB_NAME`      | database name, required with `db`         |
//! | `HBNB_BIND_ADDR`    | web server address (default `0.0.0.0:5000`) |

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_FILE_PATH: &str = "file.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Connection parameters for the database backend
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
}

impl DbConfig {
    /// SQLite location for the configured database name
    pub fn sqlite_path(&self) -> PathBuf {
        let name = PathBuf::from(&self.database);
        if self.database == ":memory:" || name.extension().is_some() {
            name
        } else {
            name.with_extension("db")
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            database: ":memory:".to_string(),
        }
    }
}

// Keep the password out of logs
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    Db(DbConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub file_path: PathBuf,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: StorageBackend::File,
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("HBNB_TYPE_STORAGE").as_deref() {
            Some("db") => {
                let database = lookup("HBNB_DB_NAME")
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar("HBNB_DB_NAME".to_string()))?;
                StorageBackend::Db(DbConfig {
                    user: lookup("HBNB_DB_USER").unwrap_or_default(),
                    password: lookup("HBNB_DB_PWD").unwrap_or_default(),
                    host: lookup("HBNB_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                    database,
                })
            }
            _ => StorageBackend::File,
        };

        let file_path = match lookup("HBNB_FILE_PATH") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: "HBNB_FILE_PATH".to_string(),
                    message: "must not be empty".to_string(),
                })
            }
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_FILE_PATH),
        };

        let bind_addr = lookup("HBNB_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Config {
            backend,
            file_path,
            bind_addr,
        })
    }
}
