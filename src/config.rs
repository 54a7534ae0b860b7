use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::remote::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_PATH: &str = ".tasksync/config.toml";
pub const ACCESS_TOKEN_ENV: &str = "TASKSYNC_ACCESS_TOKEN";
pub const API_BASE_URL_ENV: &str = "TASKSYNC_API_BASE_URL";
pub const DEFAULT_LIST_NAME: &str = "My Tasks";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_base_url: Option<String>,
    token_path: Option<PathBuf>,
    access_token: Option<String>,
    default_list_name: Option<String>,
    include_completed: Option<bool>,
    request_timeout_secs: Option<u64>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_base_url: Url,
    pub token_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub default_list_name: String,
    pub include_completed: bool,
    pub request_timeout: Duration,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("token_path", &self.token_path)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("default_list_name", &self.default_list_name)
            .field("include_completed", &self.include_completed)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url should parse"),
            token_path: None,
            access_token: None,
            default_list_name: DEFAULT_LIST_NAME.to_string(),
            include_completed: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    /// Reads the TOML file at `path`. A missing file yields defaults unless
    /// the caller named it explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut config = Self::from_toml(&raw)?;
        if let (Some(token_path), Some(parent)) = (config.token_path.as_ref(), path.parent()) {
            if token_path.is_relative() {
                config.token_path = Some(parent.join(token_path));
            }
        }
        Ok(config)
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let file: RawConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(base) = file.api_base_url {
            config.api_base_url = parse_base_url(&base)?;
        }
        config.token_path = file.token_path;
        config.access_token = file.access_token.and_then(|token| non_empty(&token));
        if let Some(name) = file.default_list_name {
            config.default_list_name = non_empty(&name).ok_or_else(|| {
                ConfigError::Invalid("default_list_name cannot be empty".to_string())
            })?;
        }
        if let Some(include_completed) = file.include_completed {
            config.include_completed = include_completed;
        }
        if let Some(secs) = file.request_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Applies `TASKSYNC_ACCESS_TOKEN` and `TASKSYNC_API_BASE_URL` through
    /// `lookup`, so tests can pass a map instead of the process environment.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ACCESS_TOKEN_ENV).and_then(|token| non_empty(&token)) {
            self.access_token = Some(token);
        }
        if let Some(base) = lookup(API_BASE_URL_ENV).and_then(|base| non_empty(&base)) {
            self.api_base_url = parse_base_url(&base)?;
        }
        Ok(self)
    }

    /// Inline token first, then the token file.
    pub fn resolve_access_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        let Some(path) = &self.token_path else {
            return Err(ConfigError::MissingToken);
        };
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        parse_token_file(&contents).ok_or_else(|| ConfigError::InvalidTokenFile(path.clone()))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            message: "url cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

/// Accepts a bare token or a JSON object with `access_token` or `token`.
fn parse_token_file(contents: &str) -> Option<String> {
    let trimmed = contents.trim();
    if !trimmed.starts_with('{') {
        return non_empty(trimmed);
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    ["access_token", "token"]
        .iter()
        .find_map(|key| value.get(key).and_then(|token| token.as_str()))
        .and_then(non_empty)
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    Invalid(String),
    InvalidBaseUrl { value: String, message: String },
    InvalidTokenFile(PathBuf),
    MissingToken,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read '{}': {}", path.display(), source)
            }
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
            ConfigError::InvalidBaseUrl { value, message } => {
                write!(f, "invalid api_base_url '{}': {}", value, message)
            }
            ConfigError::InvalidTokenFile(path) => {
                write!(f, "token file '{}' holds no access token", path.display())
            }
            ConfigError::MissingToken => write!(
                f,
                "no access token configured; set {} or token_path in the config file",
                ACCESS_TOKEN_ENV
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
            ConfigError::InvalidBaseUrl { .. } => None,
            ConfigError::InvalidTokenFile(_) => None,
            ConfigError::MissingToken => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}
