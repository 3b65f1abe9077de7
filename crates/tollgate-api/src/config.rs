// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.
//!
//! Configuration is resolved in three steps: an optional YAML, TOML or JSON
//! file (format picked by extension), then `TOLLGATE_*` environment
//! overrides, then validation.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{password, Role, TokenConfig, MAX_TOKEN_TTL_SECS, RECOMMENDED_SECRET_LEN};
use crate::middleware::DEFAULT_COOKIE_NAME;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "TOLLGATE";

// =============================================================================
// ConfigError
// =============================================================================

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("Config file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// File I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File extension is not a known format.
    #[error("Unsupported config format: {format}")]
    UnsupportedFormat {
        /// The offending extension.
        format: String,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to deserialize configuration content.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Environment variable has an unusable value.
    #[error("Invalid environment variable {name}: {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Configuration validation failed.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Configuration for the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// Token and cookie configuration.
    pub auth: AuthConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Users loaded into the credential store at startup.
    pub users: Vec<SeedUser>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            users: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the host address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the auth configuration.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Adds a seed user.
    pub fn with_user(mut self, user: SeedUser) -> Self {
        self.users.push(user);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.auth.validate()?;
        self.cors.validate()?;

        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation(
                "request_timeout",
                "must be greater than zero",
            ));
        }

        let mut usernames = HashSet::new();
        let mut emails = HashSet::new();
        for (i, user) in self.users.iter().enumerate() {
            user.validate(i)?;
            if !usernames.insert(user.username.as_str()) {
                return Err(ConfigError::validation(
                    format!("users[{}].username", i),
                    format!("duplicate username '{}'", user.username),
                ));
            }
            if !emails.insert(user.email.as_str()) {
                return Err(ConfigError::validation(
                    format!("users[{}].email", i),
                    format!("duplicate email '{}'", user.email),
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// AuthConfig
// =============================================================================

/// Token and session cookie configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Session cookie name.
    pub cookie_name: String,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// Key required by the signup endpoint. Signup is disabled when unset.
    #[serde(skip_serializing)]
    pub signup_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            token_ttl_secs: 86400, // 24 hours
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            signup_key: None,
        }
    }
}

impl AuthConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the token lifetime in whole seconds.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.token_ttl_secs = ttl_secs;
        self
    }

    /// Sets the signup key.
    pub fn with_signup_key(mut self, key: impl Into<String>) -> Self {
        self.signup_key = Some(key.into());
        self
    }

    /// Returns the token lifetime.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Returns the signup key if signup is enabled.
    pub fn signup_key(&self) -> Option<&str> {
        self.signup_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Returns the token codec configuration.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(self.secret.clone()).with_ttl_secs(self.token_ttl_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.secret.is_empty() {
            return Err(ConfigError::missing_field("auth.secret"));
        }
        if self.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = self.secret.len(),
                "auth.secret is shorter than recommended ({} bytes)",
                RECOMMENDED_SECRET_LEN
            );
        }
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::validation(
                "auth.token_ttl_secs",
                "must be greater than zero",
            ));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::validation(
                "auth.token_ttl_secs",
                format!("must not exceed {} seconds", MAX_TOKEN_TTL_SECS),
            ));
        }
        if !is_cookie_name(&self.cookie_name) {
            return Err(ConfigError::validation(
                "auth.cookie_name",
                format!("'{}' is not a valid cookie name", self.cookie_name),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("signup_enabled", &self.signup_key().is_some())
            .finish()
    }
}

/// Cookie names are RFC 6265 tokens.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Whether to allow credentials (cookies).
    pub allow_credentials: bool,
    /// Max age for preflight cache (seconds).
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Creates a configuration for browser clients on the given origins.
    pub fn strict(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            allow_credentials: true,
            ..Default::default()
        }
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allow_credentials && self.allows_any_origin() {
            return Err(ConfigError::validation(
                "cors.allow_credentials",
                "credentials cannot be combined with a wildcard origin",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// SeedUser
// =============================================================================

/// A user created in the credential store at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// Explicit ID. Defaults to `user_{username}` when omitted.
    #[serde(default)]
    pub id: Option<String>,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Argon2 PHC string, as printed by `tollgate hash-password`.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
}

impl SeedUser {
    fn validate(&self, index: usize) -> ConfigResult<()> {
        let field = |name: &str| format!("users[{}].{}", index, name);

        if self.username.trim().is_empty() {
            return Err(ConfigError::missing_field(field("username")));
        }
        if self.email.trim().is_empty() {
            return Err(ConfigError::missing_field(field("email")));
        }
        if !password::is_valid_hash(&self.password_hash) {
            return Err(ConfigError::validation(
                field("password_hash"),
                "not a PHC password hash",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat {
                format: other.to_string(),
            }),
            None => Err(ConfigError::UnsupportedFormat {
                format: "(no extension)".to_string(),
            }),
        }
    }

    /// Parses configuration content in this format.
    pub fn parse(&self, content: &str) -> ConfigResult<ApiConfig> {
        let parsed: Result<ApiConfig, String> = match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Serialization { message })
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads [`ApiConfig`] from a file and the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    resolve_env_vars: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            resolve_env_vars: true,
        }
    }
}

impl ConfigLoader {
    /// Creates a loader with the default `TOLLGATE` prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file, applies overrides and validates.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<ApiConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let format = ConfigFormat::from_path(path)?;
        let config = format.parse(&content).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        self.finish(config)
    }

    /// Loads from `path` when given, otherwise starts from defaults.
    pub fn load_optional(&self, path: Option<&Path>) -> ConfigResult<ApiConfig> {
        match path {
            Some(path) => self.load(path),
            None => {
                debug!("No config file given, using defaults");
                self.finish(ApiConfig::default())
            }
        }
    }

    /// Parses configuration from a string, applies overrides and validates.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<ApiConfig> {
        let config = format.parse(content)?;
        self.finish(config)
    }

    fn finish(&self, mut config: ApiConfig) -> ConfigResult<ApiConfig> {
        if self.resolve_env_vars {
            self.apply_overrides(&mut config, |name| env::var(name).ok())?;
        }
        config.validate()?;

        debug!(
            addr = %config.socket_addr(),
            users = config.users.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Applies `{PREFIX}_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&self, config: &mut ApiConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{}_{}", self.env_prefix, suffix);
            lookup(&name).map(|value| (name, value))
        };

        if let Some((name, value)) = var("HOST") {
            config.host = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected an IP address"))?;
        }
        if let Some((name, value)) = var("PORT") {
            config.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected valid port number"))?;
        }
        if let Some((_, value)) = var("AUTH_SECRET") {
            config.auth.secret = value;
        }
        if let Some((name, value)) = var("TOKEN_TTL_SECS") {
            config.auth.token_ttl_secs = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected seconds"))?;
        }
        if let Some((_, value)) = var("COOKIE_NAME") {
            config.auth.cookie_name = value;
        }
        if let Some((_, value)) = var("COOKIE_SECURE") {
            config.auth.cookie_secure = parse_bool(&value);
        }
        if let Some((_, value)) = var("SIGNUP_KEY") {
            config.auth.signup_key = Some(value).filter(|k| !k.is_empty());
        }

        Ok(())
    }
}

/// Parses a string to bool.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Loads configuration with default settings.
pub fn load_config(path: Option<&Path>) -> ConfigResult<ApiConfig> {
    ConfigLoader::new().load_optional(path)
}

// =============================================================================
// Tests
// =============================================================================
