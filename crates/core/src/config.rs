use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bank::{Bank, BankCredentials};

pub const CONFIG_ENV: &str = "EXPENSETREND_CONFIG";
pub const GMAIL_TOKEN_ENV: &str = "EXPENSETREND_GMAIL_TOKEN";
pub const DEFAULT_GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No home directory available to derive default paths")]
    NoProjectDirs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8000".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    /// OAuth access token with `gmail.readonly` scope.
    pub access_token: Option<String>,
    pub api_base: String,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self { access_token: None, api_base: DEFAULT_GMAIL_API.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankSettings {
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub database: PathBuf,
    /// Where downloaded statement PDFs live.
    pub statements_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub banks: BTreeMap<String, BankSettings>,
}

/// On-disk shape: every field optional, filled from the data directory.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    database: Option<PathBuf>,
    statements_dir: Option<PathBuf>,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    gmail: GmailConfig,
    #[serde(default)]
    banks: BTreeMap<String, BankSettings>,
}

impl AppConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        AppConfig {
            database: data_dir.join("expenses.db"),
            statements_dir: data_dir.join("statements"),
            server: ServerConfig::default(),
            gmail: GmailConfig::default(),
            banks: BTreeMap::new(),
        }
    }

    pub fn from_toml(toml_content: &str, data_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(toml_content)?;
        let defaults = Self::with_data_dir(data_dir);
        Ok(AppConfig {
            database: raw.database.unwrap_or(defaults.database),
            statements_dir: raw.statements_dir.unwrap_or(defaults.statements_dir),
            server: raw.server,
            gmail: raw.gmail,
            banks: raw.banks,
        })
    }

    /// Load from `path`, else `$EXPENSETREND_CONFIG`, else the per-user config
    /// file. A missing file at the default location yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("com", "expensetrend", "ExpenseTrend")
            .ok_or(ConfigError::NoProjectDirs)?;
        let data_dir = dirs.data_dir();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| dirs.config_dir().join("config.toml"));

        match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml(&content, data_dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                Ok(Self::with_data_dir(data_dir))
            }
            Err(source) => Err(ConfigError::Io { path: config_path, source }),
        }
    }

    /// Statement passwords from config, overridden by
    /// `EXPENSETREND_<BANK>_PASSWORD`.
    pub fn credentials(&self) -> BankCredentials {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    fn credentials_with(&self, env: impl Fn(&str) -> Option<String>) -> BankCredentials {
        let mut creds = BankCredentials::new();
        for (key, settings) in &self.banks {
            if let Some(password) = &settings.password {
                creds.insert(&Bank::from_key(key), password.clone());
            }
        }
        for bank in Bank::SUPPORTED {
            let var = format!("EXPENSETREND_{}_PASSWORD", bank.key().to_uppercase());
            if let Some(password) = env(&var) {
                creds.insert(&bank, password);
            }
        }
        creds
    }

    pub fn gmail_token(&self) -> Option<String> {
        std::env::var(GMAIL_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.gmail.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_data_dir_defaults() {
        let cfg = AppConfig::from_toml("", Path::new("/data")).unwrap();
        assert_eq!(cfg.database, PathBuf::from("/data/expenses.db"));
        assert_eq!(cfg.statements_dir, PathBuf::from("/data/statements"));
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
        assert_eq!(cfg.gmail.api_base, DEFAULT_GMAIL_API);
    }

    #[test]
    fn full_toml() {
        let toml = r#"
            database = "/tmp/x.db"
            statements_dir = "/tmp/pdfs"

            [server]
            bind = "0.0.0.0:9000"

            [gmail]
            access_token = "ya29.token"

            [banks.hdfc]
            password = "hd123"

            [banks.sbi]
        "#;
        let cfg = AppConfig::from_toml(toml, Path::new("/data")).unwrap();
        assert_eq!(cfg.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.gmail.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(cfg.gmail.api_base, DEFAULT_GMAIL_API);

        let creds = cfg.credentials_with(|_| None);
        assert_eq!(creds.password_for(&Bank::Hdfc), Some("hd123"));
        assert_eq!(creds.password_for(&Bank::Sbi), None);
    }

    #[test]
    fn environment_overrides_config_password() {
        let toml = "[banks.hdfc]\npassword = \"from-file\"\n";
        let cfg = AppConfig::from_toml(toml, Path::new("/data")).unwrap();
        let creds = cfg.credentials_with(|name| match name {
            "EXPENSETREND_HDFC_PASSWORD" => Some("from-env".to_string()),
            "EXPENSETREND_IDFC_PASSWORD" => Some("idfc-env".to_string()),
            _ => None,
        });
        assert_eq!(creds.password_for(&Bank::Hdfc), Some("from-env"));
        assert_eq!(creds.password_for(&Bank::Idfc), Some("idfc-env"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml("database = [", Path::new("/data")),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(AppConfig::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database = \"/srv/e.db\"\n").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.database, PathBuf::from("/srv/e.db"));
    }
}
