//! Settings and account loading for the daemon.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gradewatch_core::{Account, LoginUrl, LoginUrlError};
use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogDestination;

const DEFAULT_PORTAL_URL: &str = "https://obs.ankara.edu.tr/Account/Login";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid portal url: {0}")]
    PortalUrl(#[from] LoginUrlError),
    #[error("account label must not be empty")]
    EmptyLabel,
    #[error("duplicate account label: \"{0}\"")]
    DuplicateLabel(String),
}

/// Daemon settings, resolved from the settings file with defaults for
/// every omitted field. A missing settings file yields pure defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub portal_url: LoginUrl,
    pub accounts_path: PathBuf,
    pub database_path: PathBuf,
    pub poll_interval: Duration,
    pub log: LogDestination,
    /// Command line of the external page-driver process.
    pub driver_cmd: Vec<String>,
    /// Command line of the external CAPTCHA recognizer process.
    pub ocr_cmd: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_portal_url")]
    portal_url: String,
    #[serde(default = "default_accounts_path")]
    accounts_path: PathBuf,
    #[serde(default = "default_database_path")]
    database_path: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_log")]
    log: LogDestination,
    #[serde(default = "default_driver_cmd")]
    driver_cmd: Vec<String>,
    #[serde(default = "default_ocr_cmd")]
    ocr_cmd: Vec<String>,
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("results.db")
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_log() -> LogDestination {
    LogDestination::Both
}

fn default_driver_cmd() -> Vec<String> {
    vec!["portal-driver".to_string()]
}

fn default_ocr_cmd() -> Vec<String> {
    vec!["captcha-ocr".to_string()]
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            portal_url: default_portal_url(),
            accounts_path: default_accounts_path(),
            database_path: default_database_path(),
            poll_interval_secs: default_poll_interval_secs(),
            log: default_log(),
            driver_cmd: default_driver_cmd(),
            ocr_cmd: default_ocr_cmd(),
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str::<RawSettings>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        RawSettings::default()
    };

    Ok(Settings {
        portal_url: LoginUrl::parse(&raw.portal_url)?,
        accounts_path: raw.accounts_path,
        database_path: raw.database_path,
        poll_interval: Duration::from_secs(raw.poll_interval_secs),
        log: raw.log,
        driver_cmd: raw.driver_cmd,
        ocr_cmd: raw.ocr_cmd,
    })
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    label: String,
    username: String,
    password: String,
}

/// Loads the account list: a JSON array of label/username/password objects.
/// Labels must be non-empty and unique; they key the store's departments.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Vec<RawAccount> =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(raw.len());
    for entry in raw {
        if entry.label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        if !seen.insert(entry.label.clone()) {
            return Err(ConfigError::DuplicateLabel(entry.label));
        }
        accounts.push(Account::new(entry.label, entry.username, entry.password));
    }
    Ok(accounts)
}
