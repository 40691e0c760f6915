//! Process wiring configuration.
//!
//! # Responsibility
//! - Select the DAO backend once, at process wiring time.
//! - Describe where the store lives and how logging is set up.
//!
//! # Invariants
//! - A validated config always carries a supported log level.
//! - `log_dir`, when set, is an absolute path.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Storage technique used behind the customer DAO port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hand-written SQL with per-field updates.
    #[default]
    DirectSql,
    /// Entity-mapped repository with full-row replace.
    Mapped,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectSql => "direct-sql",
            Self::Mapped => "mapped",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct-sql" | "direct_sql" | "jdbc" | "sql" => Ok(Self::DirectSql),
            "mapped" | "repository" | "jpa" => Ok(Self::Mapped),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration errors raised before any store is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
    InvalidLogLevel(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => {
                write!(f, "unknown backend `{value}`; expected direct-sql|mapped")
            }
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidLogDir(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {}

/// Core wiring settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub backend: BackendKind,
    /// SQLite file path. `None` selects an in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory. `None` leaves logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Normalizes the log level and checks the log directory shape.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();

        if let Some(dir) = &self.log_dir {
            let dir = dir.to_str().ok_or_else(|| {
                ConfigError::InvalidLogDir(format!(
                    "log_dir must be valid UTF-8, got `{}`",
                    dir.display()
                ))
            })?;
            self.log_dir = Some(normalize_log_dir(dir).map_err(ConfigError::InvalidLogDir)?);
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, ConfigError, CoreConfig};
    use std::path::PathBuf;

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("direct-sql".parse::<BackendKind>(), Ok(BackendKind::DirectSql));
        assert_eq!(" JDBC ".parse::<BackendKind>(), Ok(BackendKind::DirectSql));
        assert_eq!("mapped".parse::<BackendKind>(), Ok(BackendKind::Mapped));
        assert!(matches!(
            "mongo".parse::<BackendKind>(),
            Err(ConfigError::UnknownBackend(value)) if value == "mongo"
        ));
    }

    #[test]
    fn backend_kind_display_roundtrips_through_from_str() {
        for kind in [BackendKind::DirectSql, BackendKind::Mapped] {
            assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn validate_normalizes_level_and_rejects_relative_log_dir() {
        let config = CoreConfig {
            log_level: "WARNING".to_string(),
            ..CoreConfig::default()
        }
        .validate()
        .unwrap();
        assert_eq!(config.log_level, "warn");

        let err = CoreConfig {
            log_dir: Some(PathBuf::from("relative/logs")),
            ..CoreConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogDir(_)));
    }

    #[test]
    fn default_config_uses_direct_sql_in_memory() {
        let config = CoreConfig::default();
        assert_eq!(config.backend, BackendKind::DirectSql);
        assert!(config.db_path.is_none());
        assert!(config.log_dir.is_none());
    }
}
