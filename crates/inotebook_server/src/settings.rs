//! Server settings.
//!
//! Layered lowest to highest: built-in defaults, optional `inotebook.toml`
//! in the working directory, then `INOTEBOOK__SECTION__KEY` environment
//! variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

const CONFIG_FILE: &str = "inotebook";
const ENV_PREFIX: &str = "INOTEBOOK";
const ENV_SEPARATOR: &str = "__";

const DEFAULT_BIND: &str = "0.0.0.0:4000";
const DEFAULT_DATABASE_PATH: &str = "inotebook.db";
const DEFAULT_TOKEN_TTL_DAYS: u64 = 30;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4000/uploads";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// Token signing secret. No default; startup fails without one.
    pub secret: String,
    pub token_ttl_days: u64,
}

impl Debug for AuthSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub dir: String,
    pub public_base_url: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// Absolute directory for rotating log files; stderr when unset.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub uploads: UploadSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug)]
pub enum SettingsError {
    Config(ConfigError),
    Invalid(&'static str),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Invalid(details) => write!(f, "invalid settings: {details}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<ConfigError> for SettingsError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl Settings {
    /// Loads settings from the config file and process environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::from_builder(
            Config::builder()
                .add_source(
                    File::with_name(CONFIG_FILE)
                        .format(FileFormat::Toml)
                        .required(false),
                )
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator(ENV_SEPARATOR)
                        .separator(ENV_SEPARATOR)
                        .try_parsing(true),
                ),
        )
    }

    /// Loads settings from a TOML document layered over the defaults.
    pub fn from_toml(document: &str) -> Result<Self, SettingsError> {
        Self::from_builder(
            Config::builder().add_source(File::from_str(document, FileFormat::Toml)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder
            .set_default("server.bind", DEFAULT_BIND)?
            .set_default("database.path", DEFAULT_DATABASE_PATH)?
            .set_default("auth.token_ttl_days", DEFAULT_TOKEN_TTL_DAYS)?
            .set_default("uploads.dir", DEFAULT_UPLOAD_DIR)?
            .set_default("uploads.public_base_url", DEFAULT_PUBLIC_BASE_URL)?
            .set_default("uploads.max_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
            .set_default("logging.level", inotebook_core::default_log_level())?
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.auth.secret.trim().is_empty() {
            return Err(SettingsError::Invalid("auth.secret cannot be empty"));
        }
        if self.auth.token_ttl_days == 0 {
            return Err(SettingsError::Invalid("auth.token_ttl_days must be positive"));
        }
        if self.uploads.max_bytes == 0 {
            return Err(SettingsError::Invalid("uploads.max_bytes must be positive"));
        }
        Ok(())
    }
}
