//! Runtime configuration
//!
//! Built once at process start and passed to each role. Values come from a
//! lookup function so the environment is read in one place only.
//!
//! | Variable        | Meaning                                   | Default                      |
//! |-----------------|-------------------------------------------|------------------------------|
//! | `DATABASE_URL`  | `sqlite://<path>`, overrides `DB_*`        | unset                        |
//! | `DB_DRIVER`     | database driver                           | `sqlite`                     |
//! | `DB_SERVER`     | server host (unused by SQLite)            | unset                        |
//! | `DB_NAME`       | database name, the file path for SQLite   | `<data dir>/demand/demand.db`|
//! | `DB_USER`       | user (unused by SQLite)                   | unset                        |
//! | `DB_PASSWORD`   | password (unused by SQLite)               | unset                        |
//! | `MODEL_DIR`     | directory of model artifacts              | `models/saved_models`        |
//! | `FORECAST_DAYS` | default batch forecast horizon            | `30`                         |

use demand_model::DEFAULT_HORIZON_DAYS;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default artifact directory.
pub const DEFAULT_MODEL_DIR: &str = "models/saved_models";

const SQLITE_SCHEMES: &[&str] = &["sqlite://", "sqlite:"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Driver other than SQLite
    #[error("Unsupported database driver '{0}': only 'sqlite' is available")]
    UnsupportedDriver(String),

    /// Malformed `DATABASE_URL`
    #[error("Invalid DATABASE_URL '{0}': expected sqlite://<path>")]
    InvalidUrl(String),

    /// Variable present but unparseable
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Result type for configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Database driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseDriver {
    /// Bundled SQLite
    Sqlite,
    /// Any other driver name, kept for error reporting
    Other(String),
}

impl DatabaseDriver {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Self::Sqlite,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for DatabaseDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Connection settings for the sales store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Driver
    pub driver: DatabaseDriver,
    /// Server host
    pub server: Option<String>,
    /// Database name; the file path for SQLite
    pub name: String,
    /// User
    pub user: Option<String>,
    /// Password
    pub password: Option<String>,
}

// Hand-written so the password never reaches logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DatabaseConfig {
    /// SQLite database at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            server: None,
            name: path.into().display().to_string(),
            user: None,
            password: None,
        }
    }

    /// Path of the SQLite database file.
    pub fn sqlite_path(&self) -> Result<PathBuf> {
        match &self.driver {
            DatabaseDriver::Sqlite => Ok(PathBuf::from(&self.name)),
            DatabaseDriver::Other(name) => Err(ConfigError::UnsupportedDriver(name.clone())),
        }
    }

    fn from_url(url: &str) -> Result<Self> {
        let path = SQLITE_SCHEMES
            .iter()
            .find_map(|scheme| url.strip_prefix(scheme))
            .filter(|path| !path.is_empty())
            .ok_or_else(|| match url.split_once(':') {
                Some((scheme, _)) if !scheme.eq_ignore_ascii_case("sqlite") => {
                    ConfigError::UnsupportedDriver(scheme.to_string())
                }
                _ => ConfigError::InvalidUrl(url.to_string()),
            })?;
        Ok(Self::sqlite(path))
    }
}

/// Default SQLite location under the platform data directory.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("demand"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("demand.db")
}

/// Configuration shared by the loader, trainer and predictor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sales store connection
    pub database: DatabaseConfig,
    /// Artifact directory
    pub model_dir: PathBuf,
    /// Default batch forecast horizon in days
    pub forecast_days: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::sqlite(default_database_path()),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            forecast_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl Config {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: DatabaseConfig::from_lookup(&lookup)?,
            model_dir: Self::model_dir_from_lookup(&lookup),
            forecast_days: Self::forecast_days_from_lookup(&lookup)?,
        })
    }

    /// `MODEL_DIR` alone, for commands that never open the database.
    pub fn model_dir_from_env() -> PathBuf {
        Self::model_dir_from_lookup(env_lookup)
    }

    /// `MODEL_DIR` from an arbitrary lookup.
    pub fn model_dir_from_lookup<F>(lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        non_empty(&lookup, "MODEL_DIR").map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from)
    }

    /// `FORECAST_DAYS` alone.
    pub fn forecast_days_from_env() -> Result<usize> {
        Self::forecast_days_from_lookup(env_lookup)
    }

    /// `FORECAST_DAYS` from an arbitrary lookup. Must be a positive integer.
    pub fn forecast_days_from_lookup<F>(lookup: F) -> Result<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw) = non_empty(&lookup, "FORECAST_DAYS") else {
            return Ok(DEFAULT_HORIZON_DAYS);
        };
        raw.trim()
            .parse::<usize>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or(ConfigError::InvalidValue {
                key: "FORECAST_DAYS",
                value: raw,
            })
    }
}

impl DatabaseConfig {
    /// Connection settings from `DATABASE_URL`, or the `DB_*` variables
    /// when no URL is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(&lookup, key);

        if let Some(url) = get("DATABASE_URL") {
            return Self::from_url(url.trim());
        }

        let driver = get("DB_DRIVER").map_or(DatabaseDriver::Sqlite, |d| DatabaseDriver::parse(&d));
        if let DatabaseDriver::Other(name) = &driver {
            return Err(ConfigError::UnsupportedDriver(name.clone()));
        }
        Ok(Self {
            driver,
            server: get("DB_SERVER"),
            name: get("DB_NAME")
                .unwrap_or_else(|| default_database_path().display().to_string()),
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model_dir, PathBuf::from("models/saved_models"));
        assert_eq!(config.forecast_days, 30);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert!(config.database.sqlite_path().unwrap().ends_with("demand.db"));
    }

    #[test]
    fn test_db_variables() {
        let config = Config::from_lookup(lookup(&[
            ("DB_DRIVER", "SQLite"),
            ("DB_SERVER", "localhost"),
            ("DB_NAME", "/tmp/sales.db"),
            ("DB_USER", "admin"),
            ("DB_PASSWORD", "secret"),
            ("MODEL_DIR", "/var/models"),
            ("FORECAST_DAYS", "14"),
        ]))
        .unwrap();

        assert_eq!(config.database.sqlite_path().unwrap(), PathBuf::from("/tmp/sales.db"));
        assert_eq!(config.database.user.as_deref(), Some("admin"));
        assert_eq!(config.model_dir, PathBuf::from("/var/models"));
        assert_eq!(config.forecast_days, 14);

        let debug = format!("{:?}", config.database);
        assert!(!debug.contains("secret"));
    }

    #[rstest]
    #[case("sqlite:///tmp/a.db", "/tmp/a.db")]
    #[case("sqlite://relative.db", "relative.db")]
    #[case("sqlite:other.db", "other.db")]
    fn test_database_url(#[case] url: &str, #[case] path: &str) {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", url),
            ("DB_NAME", "ignored.db"),
        ]))
        .unwrap();
        assert_eq!(config.database.sqlite_path().unwrap(), PathBuf::from(path));
    }

    #[rstest]
    #[case(&[("DB_DRIVER", "postgresql")])]
    #[case(&[("DB_DRIVER", "ODBC Driver 17 for SQL Server")])]
    #[case(&[("DATABASE_URL", "postgres://user@host/db")])]
    fn test_unsupported_driver(#[case] pairs: &[(&str, &str)]) {
        assert!(matches!(
            Config::from_lookup(lookup(pairs)),
            Err(ConfigError::UnsupportedDriver(_))
        ));
    }

    #[rstest]
    #[case("sqlite://")]
    #[case("not a url")]
    fn test_invalid_url(#[case] url: &str) {
        assert!(matches!(
            Config::from_lookup(lookup(&[("DATABASE_URL", url)])),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[rstest]
    #[case("zero")]
    #[case("0")]
    #[case("-3")]
    fn test_invalid_forecast_days(#[case] value: &str) {
        assert!(matches!(
            Config::from_lookup(lookup(&[("FORECAST_DAYS", value)])),
            Err(ConfigError::InvalidValue { key: "FORECAST_DAYS", .. })
        ));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("MODEL_DIR", ""), ("DB_DRIVER", " ")])).unwrap();
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
    }

    #[test]
    fn test_partial_reads_ignore_unrelated_variables() {
        let env = lookup(&[
            ("DB_DRIVER", "postgresql"),
            ("FORECAST_DAYS", "abc"),
            ("MODEL_DIR", "/srv/models"),
        ]);
        assert!(Config::from_lookup(&env).is_err());
        assert_eq!(Config::model_dir_from_lookup(&env), PathBuf::from("/srv/models"));
        assert!(Config::forecast_days_from_lookup(&env).is_err());

        let env = lookup(&[("DB_DRIVER", "postgresql"), ("FORECAST_DAYS", "7")]);
        assert_eq!(Config::forecast_days_from_lookup(&env).unwrap(), 7);
        assert_eq!(Config::model_dir_from_lookup(&env), PathBuf::from(DEFAULT_MODEL_DIR));
    }
}
