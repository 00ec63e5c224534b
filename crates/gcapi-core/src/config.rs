use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";
pub const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

const CLIENT_ID_ENV: &str = "GCAPI_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "GCAPI_CLIENT_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The client cannot be built from this config.
    Error,
    /// Usable, but some operations will fail (e.g. no OAuth credentials).
    Warning,
}

/// One finding from [`Config::validate`], scoped to a dotted config key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    issues: Vec<ConfigIssue>,
}

impl ValidationResult {
    fn push(&mut self, severity: Severity, field: &'static str, message: impl Into<String>) {
        self.issues.push(ConfigIssue {
            severity,
            field,
            message: message.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Warnings do not make a config invalid.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Fail with every error joined into one message, or hand back the warnings.
    pub fn into_warnings(self) -> Result<Vec<ConfigIssue>> {
        if !self.is_valid() {
            let joined = self
                .errors()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!("Configuration validation failed: {}", joined);
        }
        Ok(self
            .issues
            .into_iter()
            .filter(|i| i.severity == Severity::Warning)
            .collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Google OAuth client credentials
    #[serde(default)]
    pub google: GoogleConfig,

    /// API and OAuth endpoints
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Google OAuth client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client ID from the Google Cloud console
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered for the client
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

impl GoogleConfig {
    /// Check if credentials are configured (not placeholders)
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.client_id.starts_with("YOUR_")
            && !self.client_secret.starts_with("YOUR_")
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: "YOUR_GOOGLE_CLIENT_ID".to_string(),
            client_secret: "YOUR_GOOGLE_CLIENT_SECRET".to_string(),
            redirect_uri: default_redirect_uri(),
        }
    }
}

/// Endpoints the client talks to. Defaults point at Google; tests and
/// proxies override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Root of the Calendar REST API; request paths are appended to it
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// OAuth2 authorization (consent) endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Scope requested during authorization
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_scope() -> String {
    DEFAULT_CALENDAR_SCOPE.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            scope: default_scope(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing.
    /// `GCAPI_CLIENT_ID` / `GCAPI_CLIENT_SECRET` override the file.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Ok(Self::load_from(&config_path)?.with_env_overrides())
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration and reject it if validation reports errors.
    /// Returns the warnings alongside the config after logging them.
    pub fn load_validated() -> Result<(Self, Vec<ConfigIssue>)> {
        let config = Self::load()?;
        let warnings = config.validate().into_warnings()?;

        for warning in &warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, warnings))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var(CLIENT_ID_ENV) {
            self.google.client_id = id;
        }
        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            self.google.client_secret = secret;
        }
        self
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.endpoints.api_base, "endpoints.api_base", &mut result);
        validate_url(&self.endpoints.auth_url, "endpoints.auth_url", &mut result);
        validate_url(&self.endpoints.token_url, "endpoints.token_url", &mut result);

        if self.endpoints.scope.trim().is_empty() {
            result.push(Severity::Error, "endpoints.scope", "Scope must not be empty");
        }

        if self.google.redirect_uri.is_empty() {
            result.push(Severity::Error, "google.redirect_uri", "Redirect URI must not be empty");
        }

        if !self.google.is_configured() {
            result.push(
                Severity::Warning,
                "google",
                "Google OAuth client not configured - authorization will fail",
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("gcapi");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field: &'static str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.push(
                    Severity::Error,
                    field,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.push(Severity::Error, field, "URL must have a host");
            }
        }
        Err(e) => {
            result.push(Severity::Error, field, format!("Invalid URL: {}", e));
        }
    }
}
