// Credvault — Runtime configuration
//
// Resolved from the environment, then overridden by CLI flags.
//   CREDVAULT_DB   path to the SQLite file (default: <data dir>/credvault/credvault.db)
//   CREDVAULT_KEY  field encryption key, 16/24/32 bytes

use std::fmt;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::codec::FieldCodec;
use crate::error::VaultError;

pub const DB_ENV: &str = "CREDVAULT_DB";
pub const KEY_ENV: &str = "CREDVAULT_KEY";

pub struct Config {
    pub db_path: PathBuf,
    key: Option<Zeroizing<String>>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_path: lookup(DB_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            key: lookup(KEY_ENV).map(Zeroizing::new),
        }
    }

    /// Apply explicit overrides; `None` keeps the current value.
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, key: Option<String>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        if let Some(key) = key {
            self.key = Some(Zeroizing::new(key));
        }
        self
    }

    /// Build the field codec from the configured key.
    pub fn codec(&self) -> Result<FieldCodec, VaultError> {
        let key = self.key.as_ref().ok_or_else(|| {
            VaultError::invalid_input(
                "config",
                format!("no encryption key: set {} or pass --key", KEY_ENV),
            )
        })?;

        FieldCodec::new(key.as_bytes()).map_err(|e| VaultError::invalid_input("config", e.to_string()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Default directory for Credvault data files.
pub fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("credvault")
}

fn default_db_path() -> PathBuf {
    data_dir().join("credvault.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_env_values_are_used() {
        let config = Config::from_lookup(|name| match name {
            DB_ENV => Some("/tmp/vault.db".to_string()),
            KEY_ENV => Some("1234567890123456".to_string()),
            _ => None,
        });

        assert_eq!(config.db_path, PathBuf::from("/tmp/vault.db"));
        assert!(config.codec().is_ok());
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(|_| None);

        assert!(config.db_path.ends_with("credvault/credvault.db"));
        assert_eq!(config.codec().unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_lookup(|name| match name {
            KEY_ENV => Some("short".to_string()),
            _ => None,
        })
        .with_overrides(
            Some(PathBuf::from("other.db")),
            Some("12345678901234567890123456789012".to_string()),
        );

        assert_eq!(config.db_path, PathBuf::from("other.db"));
        assert!(config.codec().is_ok());
    }

    #[test]
    fn test_bad_key_length_is_invalid_input() {
        let config = Config::from_lookup(|_| None).with_overrides(None, Some("short".into()));
        assert_eq!(config.codec().unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::from_lookup(|_| None)
            .with_overrides(None, Some("1234567890123456".into()));

        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("1234567890123456"));
    }
}
