use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Args;
use client_core::VerificationPolicy;
use tracing::warn;

const DEFAULT_CONFIG_FILE: &str = "securedoc.toml";
const ENV_PREFIX: &str = "APP__";

const KEYS: [&str; 9] = [
    "database_url",
    "identity_url",
    "token_url",
    "api_key",
    "backend_program",
    "backend_dir",
    "download_dir",
    "verification_poll_ms",
    "verification_max_attempts",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub identity_url: String,
    pub token_url: String,
    pub api_key: String,
    pub backend_program: String,
    pub backend_dir: PathBuf,
    pub download_dir: PathBuf,
    pub verification_poll_ms: u64,
    pub verification_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/session.db".into(),
            identity_url: "https://identitytoolkit.googleapis.com/v1".into(),
            token_url: "https://securetoken.googleapis.com/v1/token".into(),
            api_key: String::new(),
            backend_program: "python".into(),
            backend_dir: PathBuf::from("./backend"),
            download_dir: PathBuf::from("./downloads"),
            verification_poll_ms: 2_000,
            verification_max_attempts: 150,
        }
    }
}

/// Command-line flags; each one beats the file and the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsOverrides {
    /// Settings file (defaults to ./securedoc.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub database_url: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub backend_program: Option<String>,
    #[arg(long)]
    pub backend_dir: Option<PathBuf>,
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

/// Defaults, then the settings file, then `APP__*` variables, then flags.
pub fn load_settings(overrides: &SettingsOverrides) -> Result<Settings> {
    let mut settings = Settings::default();

    match &overrides.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            settings
                .apply_file(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                settings
                    .apply_file(&raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings.apply_overrides(overrides);
    Ok(settings)
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(raw)?;
        for (key, value) in table {
            let value = match value {
                toml::Value::String(text) => text,
                other => other.to_string(),
            };
            self.set(&key, &value);
        }
        Ok(())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in KEYS {
            let var = format!("{ENV_PREFIX}{}", key.to_ascii_uppercase());
            if let Some(value) = lookup(&var) {
                self.set(key, &value);
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(v) = &overrides.database_url {
            self.database_url = v.clone();
        }
        if let Some(v) = &overrides.api_key {
            self.api_key = v.clone();
        }
        if let Some(v) = &overrides.backend_program {
            self.backend_program = v.clone();
        }
        if let Some(v) = &overrides.backend_dir {
            self.backend_dir = v.clone();
        }
        if let Some(v) = &overrides.download_dir {
            self.download_dir = v.clone();
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "database_url" => self.database_url = value.to_string(),
            "identity_url" => self.identity_url = value.to_string(),
            "token_url" => self.token_url = value.to_string(),
            "api_key" => self.api_key = value.to_string(),
            "backend_program" => self.backend_program = value.to_string(),
            "backend_dir" => self.backend_dir = Path::new(value).to_path_buf(),
            "download_dir" => self.download_dir = Path::new(value).to_path_buf(),
            "verification_poll_ms" => match value.trim().parse() {
                Ok(parsed) => self.verification_poll_ms = parsed,
                Err(_) => warn!(key, value, "ignoring malformed number"),
            },
            "verification_max_attempts" => match value.trim().parse() {
                Ok(parsed) => self.verification_max_attempts = parsed,
                Err(_) => warn!(key, value, "ignoring malformed number"),
            },
            _ => warn!(key, "ignoring unknown setting"),
        }
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            interval: Duration::from_millis(self.verification_poll_ms.max(1)),
            max_attempts: self.verification_max_attempts.max(1),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
