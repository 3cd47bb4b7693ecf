//! Startup settings resolved from the environment (and an optional `.env` file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 30100;
pub const DEFAULT_SECRET_FILE: &str = "./secret-github";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_MAX_LOG_FILES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub secret_file: PathBuf,
    pub log_dir: PathBuf,
    pub max_log_files: usize,
    /// Free-form label shown in the startup banner.
    pub deployment_label: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secret_file: PathBuf::from(DEFAULT_SECRET_FILE),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_log_files: DEFAULT_MAX_LOG_FILES,
            deployment_label: None,
        }
    }
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match non_empty(vars, key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        Ok(Self {
            host: non_empty(vars, "HOST").map_or(defaults.host, str::to_owned),
            port: parse_number(vars, "PORT", DEFAULT_PORT)?,
            secret_file: non_empty(vars, "SECRET_FILE").map_or(defaults.secret_file, PathBuf::from),
            log_dir: non_empty(vars, "LOG_DIR").map_or(defaults.log_dir, PathBuf::from),
            max_log_files: parse_number(vars, "LOG_MAX_FILES", DEFAULT_MAX_LOG_FILES)?,
            deployment_label: non_empty(vars, "TARGET").map(str::to_owned),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads `.env` (if any) and snapshots the process environment.
pub fn environment() -> HashMap<String, String> {
    dotenv::dotenv().ok();
    std::env::vars().collect()
}

/// Reads the webhook secret. Any failure means open mode.
pub fn load_secret(path: &Path) -> Option<Vec<u8>> {
    let mut secret = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                "The secret file {:?} could not be read ({}). The secret will be ignored.",
                path, e
            );
            return None;
        }
    };

    while matches!(secret.last(), Some(b'\n' | b'\r')) {
        secret.pop();
    }
    if secret.is_empty() {
        warn!("The secret file {:?} is empty. The secret will be ignored.", path);
        return None;
    }
    Some(secret)
}
