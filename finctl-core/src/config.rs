//! Database connection settings.
//!
//! Settings are layered, lowest priority first:
//! 1. Built-in defaults (127.0.0.1:3306, database `finance_db`)
//! 2. ~/.finctl/config.toml, then ./finctl.toml (`[database]` table)
//! 3. Environment variables (`DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`),
//!    including anything pulled in from `.env` files
//!
//! `DB_USER` and `DB_PASSWORD` have no defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;
use tracing::{debug, info, warn};

use crate::error::{FinanceError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_DATABASE: &str = "finance_db";

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DATABASE: &str = "DB_NAME";

/// Connection parameters handed to the gateway
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl DbConfig {
    /// Credentials plus default host, port and database
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Load from every layer: `.env` files, config files, then the process environment
    pub fn load() -> Result<Self> {
        load_dotenv();
        let file = load_config_files();
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Apply variables from `lookup` over the file section and defaults.
    ///
    /// Blank host, port and database variables count as unset. Credentials
    /// are taken as given, so an empty `DB_PASSWORD` is a valid password.
    pub fn resolve<F>(file: DatabaseSection, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var(ENV_HOST)
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match var(ENV_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|err| {
                FinanceError::config(format!("{ENV_PORT} must be a port number, got '{raw}': {err}"))
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let user = lookup(ENV_USER)
            .or(file.user)
            .ok_or_else(|| FinanceError::config(format!("{ENV_USER} is not set")))?;

        let password = lookup(ENV_PASSWORD)
            .or(file.password)
            .ok_or_else(|| FinanceError::config(format!("{ENV_PASSWORD} is not set")))?;

        let database = var(ENV_DATABASE)
            .or(file.name)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Self {
            host,
            port,
            user,
            password,
            database,
        })
    }

    /// sqlx connect options for a single, unpooled connection
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

// ============================================================================
// TOML Configuration
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct FinctlFile {
    #[serde(default)]
    database: DatabaseSection,
}

/// `[database]` table of a finctl config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl DatabaseSection {
    /// Keys set in `overlay` win
    pub fn merge(self, overlay: Self) -> Self {
        Self {
            host: overlay.host.or(self.host),
            port: overlay.port.or(self.port),
            user: overlay.user.or(self.user),
            password: overlay.password.or(self.password),
            name: overlay.name.or(self.name),
        }
    }
}

/// Get the finctl config directory path (~/.finctl)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".finctl"))
}

/// Read the `[database]` table from one file. `Ok(None)` when the file does not exist.
pub fn read_config_file(path: &Path) -> Result<Option<DatabaseSection>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|err| {
        FinanceError::config(format!("failed to read {}: {err}", path.display()))
    })?;
    let parsed: FinctlFile = toml::from_str(&contents).map_err(|err| {
        FinanceError::config(format!("failed to parse {}: {err}", path.display()))
    })?;

    Ok(Some(parsed.database))
}

/// Global file first, then ./finctl.toml on top. Unreadable files are skipped.
pub fn load_config_files() -> DatabaseSection {
    let mut candidates = Vec::new();
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("config.toml"));
    }
    candidates.push(PathBuf::from("finctl.toml"));

    candidates
        .iter()
        .fold(DatabaseSection::default(), |acc, path| match read_config_file(path) {
            Ok(Some(section)) => {
                debug!("Loaded database config from {}", path.display());
                acc.merge(section)
            }
            Ok(None) => acc,
            Err(err) => {
                warn!("{}", err);
                acc
            }
        })
}

/// Load `.env` from the current directory, then ~/.finctl/.env.
///
/// dotenvy never overwrites variables that are already set, so the
/// current directory wins over the home directory and the real
/// environment wins over both.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.finctl)");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_credentials_set() {
        let config = DbConfig::resolve(
            DatabaseSection::default(),
            lookup_from(&[(ENV_USER, "ana"), (ENV_PASSWORD, "s3cret")]),
        )
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.database, "finance_db");
        assert_eq!(config.user, "ana");
        assert_eq!(config.password, "s3cret");
    }

    #[test]
    fn test_environment_overrides_everything() {
        let file = DatabaseSection {
            host: Some("file-host".into()),
            port: Some(4000),
            user: Some("file-user".into()),
            password: Some("file-pass".into()),
            name: Some("file_db".into()),
        };
        let config = DbConfig::resolve(
            file,
            lookup_from(&[
                (ENV_HOST, "db.local"),
                (ENV_PORT, "3307"),
                (ENV_USER, "ana"),
                (ENV_PASSWORD, "s3cret"),
                (ENV_DATABASE, "ledger"),
            ]),
        )
        .unwrap();

        let expected = DbConfig::new("ana", "s3cret")
            .with_host("db.local")
            .with_port(3307)
            .with_database("ledger");
        assert_eq!(config, expected);
    }

    #[test]
    fn test_file_values_fill_unset_variables() {
        let file = DatabaseSection {
            port: Some(3307),
            user: Some("file-user".into()),
            password: Some("file-pass".into()),
            ..Default::default()
        };
        let config = DbConfig::resolve(file, lookup_from(&[(ENV_HOST, "  ")])).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "file-user");
    }

    #[test]
    fn test_missing_user_is_config_error() {
        let err = DbConfig::resolve(
            DatabaseSection::default(),
            lookup_from(&[(ENV_PASSWORD, "s3cret")]),
        )
        .unwrap_err();

        assert!(matches!(err, FinanceError::Config { .. }));
        assert!(err.to_string().contains("DB_USER"));
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let err = DbConfig::resolve(DatabaseSection::default(), lookup_from(&[(ENV_USER, "ana")]))
            .unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn test_empty_password_is_accepted() {
        let config = DbConfig::resolve(
            DatabaseSection::default(),
            lookup_from(&[(ENV_USER, "root"), (ENV_PASSWORD, "")]),
        )
        .unwrap();
        assert_eq!(config.user, "root");
        assert_eq!(config.password, "");

        let file = DatabaseSection {
            user: Some("root".into()),
            password: Some(String::new()),
            ..Default::default()
        };
        let config = DbConfig::resolve(file, lookup_from(&[])).unwrap();
        assert_eq!(config.password, "");
    }

    #[test]
    fn test_empty_password_variable_overrides_file() {
        let file = DatabaseSection {
            user: Some("root".into()),
            password: Some("from-file".into()),
            ..Default::default()
        };
        let config = DbConfig::resolve(file, lookup_from(&[(ENV_PASSWORD, "")])).unwrap();
        assert_eq!(config.password, "");
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = DbConfig::resolve(
            DatabaseSection::default(),
            lookup_from(&[(ENV_USER, "ana"), (ENV_PASSWORD, "x"), (ENV_PORT, "mysql")]),
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("DB_PORT"));
        assert!(msg.contains("mysql"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", DbConfig::new("ana", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("ana"));
    }

    #[test]
    fn test_section_merge_prefers_overlay() {
        let base = DatabaseSection {
            host: Some("global".into()),
            name: Some("global_db".into()),
            ..Default::default()
        };
        let overlay = DatabaseSection {
            host: Some("local".into()),
            ..Default::default()
        };

        let merged = base.merge(overlay);
        assert_eq!(merged.host.as_deref(), Some("local"));
        assert_eq!(merged.name.as_deref(), Some("global_db"));
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finctl.toml");
        std::fs::write(
            &path,
            "[database]\nhost = \"10.0.0.5\"\nport = 3307\nname = \"household\"\n",
        )
        .unwrap();

        let section = read_config_file(&path).unwrap().unwrap();
        assert_eq!(section.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(section.port, Some(3307));
        assert_eq!(section.name.as_deref(), Some("household"));
        assert_eq!(section.user, None);
    }

    #[test]
    fn test_read_config_file_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config_file(&dir.path().join("absent.toml")).unwrap().is_none());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[database\nport = ").unwrap();
        let err = read_config_file(&bad).unwrap_err();
        assert!(matches!(err, FinanceError::Config { .. }));
    }
}
