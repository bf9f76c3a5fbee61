//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve bind address, storage path, logging and paging settings.
//! - Reject malformed values at startup instead of at first request.
//!
//! # Invariants
//! - `page_size` is within `1..=MAX_PAGE_SIZE`.
//! - `log_dir` is absolute.

use contactbook_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_BIND: &str = "CONTACTBOOK_BIND";
pub const ENV_DB_PATH: &str = "CONTACTBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CONTACTBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CONTACTBOOK_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "CONTACTBOOK_PAGE_SIZE";
pub const ENV_CACHE_CAPACITY: &str = "CONTACTBOOK_CACHE_CAPACITY";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_DB_FILE_NAME: &str = "contactbook.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "contactbook-logs";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} value `{}`: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub page_size: u32,
    pub cache_capacity: usize,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_raw = read(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| invalid(ENV_BIND, &bind_raw, err.to_string()))?;

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());

        let log_dir = read(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));
        if !log_dir.is_absolute() {
            return Err(invalid(
                ENV_LOG_DIR,
                &log_dir.display().to_string(),
                "must be an absolute path".to_string(),
            ));
        }

        let page_size = match read(ENV_PAGE_SIZE) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|value| (1..=MAX_PAGE_SIZE).contains(value))
                .ok_or_else(|| {
                    invalid(
                        ENV_PAGE_SIZE,
                        &raw,
                        format!("expected an integer in 1..={MAX_PAGE_SIZE}"),
                    )
                })?,
            None => DEFAULT_PAGE_SIZE,
        };

        let cache_capacity = match read(ENV_CACHE_CAPACITY) {
            Some(raw) => raw.parse::<usize>().map_err(|err| {
                invalid(ENV_CACHE_CAPACITY, &raw, err.to_string())
            })?,
            None => DEFAULT_CACHE_CAPACITY,
        };

        Ok(Self {
            bind,
            db_path,
            log_level,
            log_dir,
            page_size,
            cache_capacity,
        })
    }
}

fn invalid(variable: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError {
        variable,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ServerConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_PAGE_SIZE, ENV_BIND, ENV_CACHE_CAPACITY,
        ENV_DB_PATH, ENV_LOG_DIR, ENV_PAGE_SIZE,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, super::ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.log_dir.is_absolute());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_DB_PATH, " /var/lib/contactbook/data.sqlite3 "),
            (ENV_PAGE_SIZE, "20"),
            (ENV_CACHE_CAPACITY, "0"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(
            config.db_path,
            PathBuf::from("/var/lib/contactbook/data.sqlite3")
        );
        assert_eq!(config.page_size, 20);
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(ENV_PAGE_SIZE, "   ")]).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn malformed_values_are_rejected_with_variable_name() {
        let err = config_from(&[(ENV_PAGE_SIZE, "0")]).unwrap_err();
        assert_eq!(err.variable, ENV_PAGE_SIZE);

        let err = config_from(&[(ENV_BIND, "localhost")]).unwrap_err();
        assert_eq!(err.variable, ENV_BIND);

        let err = config_from(&[(ENV_LOG_DIR, "relative/logs")]).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}
