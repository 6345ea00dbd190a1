//! Application configuration
//!
//! Layers, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file (`weekly-lotto.toml`)
//! 3. `LOTTO_*` environment variables
//!
//! The raw layers are flat (`LOTTO_EMAIL_SMTP_HOST` -> `email_smtp_host`) and
//! validated into [`AppConfig`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::purchase::{DEFAULT_WINDOW_MINUTES, PurchasePolicy};

/// Default file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "weekly-lotto.toml";

const ENV_PREFIX: &str = "LOTTO";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration file not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("Missing required configuration: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Vendor account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP settings for report delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Validated configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    credentials: Option<Credentials>,
    pub email: Option<EmailConfig>,
    /// Where unexpected vendor pages are dumped
    pub artifacts_dir: Option<PathBuf>,
    pub window_minutes: u32,
    /// Retries of the purchase steps after the first attempt
    pub purchase_retries: u32,
    /// Override of the vendor's base URL
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Vendor credentials; only commands that log in need them.
    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or(ConfigError::MissingField("LOTTO_USERNAME / LOTTO_PASSWORD"))
    }
}

/// Flat view of every layer before validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    email_smtp_host: Option<String>,
    email_smtp_port: Option<String>,
    email_username: Option<String>,
    email_password: Option<String>,
    email_from: Option<String>,
    email_to: Option<String>,
    artifacts_dir: Option<PathBuf>,
    window_minutes: Option<u32>,
    purchase_retries: Option<u32>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Configuration loader with layered merging support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this TOML file between defaults and the environment.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use these variables instead of the process environment.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<AppConfig> {
        let mut builder = Config::builder()
            .set_default("window_minutes", i64::from(DEFAULT_WINDOW_MINUTES))?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS.to_string())?;

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .source(self.env.clone()),
        );

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        validate(raw)
    }

    /// `./weekly-lotto.toml` if present.
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
        cwd_config.exists().then_some(cwd_config)
    }

    pub fn load_default() -> Result<AppConfig> {
        let loader = match Self::find_config_file() {
            Some(path) => ConfigLoader::new().with_file(path),
            None => ConfigLoader::new(),
        };
        loader.load()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(raw: RawConfig) -> Result<AppConfig> {
    let credentials = match (non_empty(raw.username), non_empty(raw.password)) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::MissingField("LOTTO_PASSWORD")),
        (None, Some(_)) => return Err(ConfigError::MissingField("LOTTO_USERNAME")),
    };

    let email = match (non_empty(raw.email_smtp_host), non_empty(raw.email_smtp_port)) {
        (Some(smtp_host), Some(port)) => {
            let smtp_port = port.parse::<u16>().map_err(|err| ConfigError::Invalid {
                field: "LOTTO_EMAIL_SMTP_PORT",
                reason: format!("{port:?}: {err}"),
            })?;
            let to: Vec<String> = raw
                .email_to
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(str::to_string)
                .collect();
            if to.is_empty() {
                return Err(ConfigError::MissingField("LOTTO_EMAIL_TO"));
            }

            Some(EmailConfig {
                smtp_host,
                smtp_port,
                username: non_empty(raw.email_username)
                    .ok_or(ConfigError::MissingField("LOTTO_EMAIL_USERNAME"))?,
                password: non_empty(raw.email_password)
                    .ok_or(ConfigError::MissingField("LOTTO_EMAIL_PASSWORD"))?,
                from: non_empty(raw.email_from)
                    .ok_or(ConfigError::MissingField("LOTTO_EMAIL_FROM"))?,
                to,
            })
        }
        _ => None,
    };

    let window_minutes = raw.window_minutes.unwrap_or(DEFAULT_WINDOW_MINUTES);
    if window_minutes == 0 {
        return Err(ConfigError::Invalid {
            field: "LOTTO_WINDOW_MINUTES",
            reason: "must be at least 1".to_string(),
        });
    }

    let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "LOTTO_TIMEOUT_SECS",
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        credentials,
        email,
        artifacts_dir: raw.artifacts_dir,
        window_minutes,
        purchase_retries: raw
            .purchase_retries
            .unwrap_or(PurchasePolicy::default().max_retries),
        base_url: non_empty(raw.base_url),
        timeout_secs,
    })
}
