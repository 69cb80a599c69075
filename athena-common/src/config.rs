//! Configuration loading and setting resolution
//!
//! Bootstrap settings come from a TOML file. A missing file is not an error:
//! defaults are used and a warning is logged.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default, where one exists

use crate::aggregate::GroupBy;
use crate::flatten::Flattener;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_CONFIG: &str = "ATHENA_CONFIG";
pub const ENV_BASE_URL: &str = "ATHENA_BASE_URL";
pub const ENV_TOKEN_URL: &str = "ATHENA_TOKEN_URL";
pub const ENV_CLIENT_ID: &str = "ATHENA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ATHENA_CLIENT_SECRET";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Resource API base, e.g. `https://host/ords/app/v1`
    #[serde(default)]
    pub base_url: Option<String>,

    /// OAuth2 token endpoint; derived from `base_url` when absent
    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub flatten: Flattener,

    #[serde(default)]
    pub query: QueryConfig,

    /// Local login gate for the HTTP API (optional)
    #[serde(default)]
    pub login: Option<LoginConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Project query tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Upper bound on concurrent (well, source) fetches
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(default)]
    pub group_by: GroupBy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            group_by: GroupBy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginConfig {
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    4
}

/// Where a loaded [`TomlConfig`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file at this path, defaults in use
    Defaults(PathBuf),
}

impl ConfigOrigin {
    /// Report the origin; a missing file is a warning
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Defaults(path) => {
                warn!("Config file not found at {}, using defaults", path.display())
            }
        }
    }
}

impl TomlConfig {
    /// Load configuration, falling back to defaults when the file is missing
    ///
    /// # Errors
    /// A file that exists but cannot be read or parsed is a [`Error::Config`].
    pub fn load(path: &Path) -> Result<Self> {
        let (config, origin) = Self::read(path)?;
        origin.log();
        Ok(config)
    }

    /// Like [`TomlConfig::load`] but without logging, for callers that read
    /// the config before a subscriber exists
    pub fn read(path: &Path) -> Result<(Self, ConfigOrigin)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        if config.query.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "query.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }

        Ok((config, ConfigOrigin::File(path.to_path_buf())))
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_url: None,
            client_id: None,
            client_secret: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            flatten: Flattener::default(),
            query: QueryConfig::default(),
            login: None,
        }
    }
}

/// Config file path: command line, then `ATHENA_CONFIG`, then the platform
/// config directory (`~/.config/athena/athena-pricing.toml` on Linux)
pub fn config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|d| d.join("athena").join("athena-pricing.toml"))
        .unwrap_or_else(|| PathBuf::from("athena-pricing.toml"))
}

/// Resolve one setting from command line, environment and TOML
///
/// Blank values are ignored. Returns the value with the name of its source.
pub fn resolve_setting(
    name: &str,
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<(String, &'static str)> {
    let env_value = std::env::var(env_var_name).ok();
    let candidates: [(Option<&str>, &'static str); 3] = [
        (cli_arg, "command line"),
        (env_value.as_deref(), "environment"),
        (toml_value, "TOML"),
    ];

    let present: Vec<(&str, &'static str)> = candidates
        .into_iter()
        .filter_map(|(value, source)| {
            value
                .filter(|v| is_valid_value(v))
                .map(|v| (v, source))
        })
        .collect();

    if present.len() > 1 {
        let sources: Vec<&str> = present.iter().map(|(_, s)| *s).collect();
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            name,
            sources.join(", "),
            sources[0]
        );
    }

    present
        .first()
        .map(|(value, source)| (value.trim().to_string(), *source))
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolved upstream API endpoints and client credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Command-line overrides for [`ApiSettings::resolve`]
#[derive(Debug, Clone, Default)]
pub struct ApiOverrides<'a> {
    pub base_url: Option<&'a str>,
    pub token_url: Option<&'a str>,
    pub client_id: Option<&'a str>,
    pub client_secret: Option<&'a str>,
}

impl ApiSettings {
    /// Resolve endpoints and credentials from all sources
    ///
    /// Credentials may stay unresolved; the session gate asks for them later.
    ///
    /// # Errors
    /// [`Error::Config`] when no base URL is configured anywhere.
    pub fn resolve(overrides: &ApiOverrides<'_>, toml_config: &TomlConfig) -> Result<Self> {
        let (base_url, source) = resolve_setting(
            "Base URL",
            overrides.base_url,
            ENV_BASE_URL,
            toml_config.base_url.as_deref(),
        )
        .ok_or_else(|| {
            Error::Config(
                "Base URL not configured. Please configure using one of:\n\
                 1. Command line: --base-url https://host/ords/app/v1\n\
                 2. Environment: ATHENA_BASE_URL=https://host/ords/app/v1\n\
                 3. TOML config: ~/.config/athena/athena-pricing.toml (base_url = \"...\")"
                    .to_string(),
            )
        })?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Base URL loaded from {}", source);

        let token_url = match resolve_setting(
            "Token URL",
            overrides.token_url,
            ENV_TOKEN_URL,
            toml_config.token_url.as_deref(),
        ) {
            Some((url, _)) => url,
            None => derive_token_url(&base_url),
        };

        let client_id = resolve_setting(
            "Client ID",
            overrides.client_id,
            ENV_CLIENT_ID,
            toml_config.client_id.as_deref(),
        )
        .map(|(v, _)| v);

        let client_secret = resolve_setting(
            "Client secret",
            overrides.client_secret,
            ENV_CLIENT_SECRET,
            toml_config.client_secret.as_deref(),
        )
        .map(|(v, _)| v);

        Ok(Self {
            base_url,
            token_url,
            client_id,
            client_secret,
        })
    }
}

/// `https://host/ords/app/v1` → `https://host/ords/app/oauth/token`
pub fn derive_token_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let parent = match trimmed.rsplit_once('/') {
        Some((parent, _)) if parent.contains("://") && !parent.ends_with('/') => parent,
        _ => trimmed,
    };
    format!("{}/oauth/token", parent)
}
