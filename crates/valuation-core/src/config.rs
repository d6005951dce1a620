//! Runtime configuration: JSON file with environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "VALUATION_DB_PATH";
pub const ENV_SYNC_DEBOUNCE_MS: &str = "VALUATION_SYNC_DEBOUNCE_MS";
pub const ENV_ADMIN_EMAILS: &str = "VALUATION_ADMIN_EMAILS";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ValuationConfig {
    /// SQLite file backing the document store
    pub database_path: String,
    /// Quiet period before live index fields are written
    pub sync_debounce_ms: u64,
    /// Emails with every capability, compared lowercase
    pub admin_emails: Vec<String>,
    /// Data key of the condition-grade field
    pub condition_grade_field: String,
    /// Vehicle id prefix for vehicles without registration
    pub unregistered_prefix: String,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            database_path: "valuation.db".to_string(),
            sync_debounce_ms: 1000,
            admin_emails: Vec::new(),
            condition_grade_field: "conditionGrade".to_string(),
            unregistered_prefix: "UNREG-".to_string(),
        }
    }
}

impl ValuationConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database_path = path;
        }

        if let Some(raw) = lookup(ENV_SYNC_DEBOUNCE_MS) {
            self.sync_debounce_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_SYNC_DEBOUNCE_MS.to_string(),
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_ADMIN_EMAILS) {
            self.admin_emails = raw
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }

        Ok(self)
    }

    /// Whether an email is on the admin allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().to_lowercase() == email)
    }
}
