//! Service configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in service defaults
//! 2. **Configuration file** – `.repogate.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REPOGATE_*`, plus the legacy
//!    `SUPABASE_URL` and `SUPABASE_ANON_KEY` for the identity store
//! 4. **Command-line arguments** – `--bind-address`, `--identity-url`, ...
//!
//! # Configuration File
//!
//! ```toml
//! bind_address = "127.0.0.1:8787"
//! identity_url = "https://project.supabase.co"
//! identity_api_key = "public-anon-key"
//! profile_table = "profiles"
//! username_column = "github_username"
//! log_filter = "repogate=debug,tower_http=info"
//! ```

use std::env;
use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::github::UpstreamSettings;
use crate::identity::IdentitySettings;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8787";
const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_PROFILE_TABLE: &str = "profiles";
const DEFAULT_USERNAME_COLUMN: &str = "github_username";
const DEFAULT_USER_AGENT: &str = "repogate";
const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration values that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No identity store URL was configured.
    #[error("identity store URL is required (use --identity-url or SUPABASE_URL)")]
    MissingIdentityUrl,

    /// No identity store API key was configured.
    #[error("identity store API key is required (use --identity-api-key or SUPABASE_ANON_KEY)")]
    MissingIdentityApiKey,

    /// A configured value is malformed.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Configuration key.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Service configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `REPOGATE_BIND_ADDRESS` or `--bind-address`: listen address
/// - `REPOGATE_GITHUB_API_BASE` or `--github-api-base`: GitHub REST base URL
/// - `REPOGATE_IDENTITY_URL`, `SUPABASE_URL`, or `--identity-url`
/// - `REPOGATE_IDENTITY_API_KEY`, `SUPABASE_ANON_KEY`, or
///   `--identity-api-key`
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use repogate::RepogateConfig;
///
/// let config = RepogateConfig::load().expect("failed to load configuration");
/// let identity = config.resolve_identity().expect("identity store required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REPOGATE",
    discovery(
        dotfile_name = ".repogate.toml",
        config_file_name = "repogate.toml",
        app_name = "repogate"
    )
)]
pub struct RepogateConfig {
    /// Socket address the HTTP server listens on.
    ///
    /// Defaults to `0.0.0.0:8787`.
    #[ortho_config(cli_short = 'b')]
    pub bind_address: String,

    /// GitHub REST API base URL.
    ///
    /// Defaults to `https://api.github.com`.
    #[ortho_config()]
    pub github_api_base: String,

    /// Base URL of the Supabase project used to resolve callers.
    ///
    /// Can be provided via:
    /// - CLI: `--identity-url <URL>`
    /// - Environment: `REPOGATE_IDENTITY_URL` or `SUPABASE_URL` (legacy)
    /// - Config file: `identity_url = "..."`
    #[ortho_config()]
    pub identity_url: Option<String>,

    /// Public API key sent to the identity store.
    ///
    /// Can be provided via:
    /// - CLI: `--identity-api-key <KEY>`
    /// - Environment: `REPOGATE_IDENTITY_API_KEY` or `SUPABASE_ANON_KEY`
    ///   (legacy)
    /// - Config file: `identity_api_key = "..."`
    #[ortho_config()]
    pub identity_api_key: Option<String>,

    /// Table holding user profiles.
    #[ortho_config()]
    pub profile_table: String,

    /// Profile column holding the linked GitHub login.
    #[ortho_config()]
    pub username_column: String,

    /// `User-Agent` sent to GitHub.
    #[ortho_config()]
    pub user_agent: String,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[ortho_config()]
    pub log_filter: String,
}

impl Default for RepogateConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            github_api_base: DEFAULT_GITHUB_API_BASE.to_owned(),
            identity_url: None,
            identity_api_key: None,
            profile_table: DEFAULT_PROFILE_TABLE.to_owned(),
            username_column: DEFAULT_USERNAME_COLUMN.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl RepogateConfig {
    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address is not a socket
    /// address.
    pub fn resolve_bind_address(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|error: std::net::AddrParseError| ConfigError::Invalid {
                field: "bind_address",
                message: error.to_string(),
            })
    }

    /// Builds the upstream settings used for every GitHub call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the API base is not an absolute
    /// URL or the user agent is blank.
    pub fn resolve_upstream(&self) -> Result<UpstreamSettings, ConfigError> {
        let api_base = parse_base_url("github_api_base", &self.github_api_base)?;
        let user_agent = require_non_blank("user_agent", &self.user_agent)?;
        Ok(UpstreamSettings {
            api_base,
            user_agent,
        })
    }

    /// Builds the identity store settings, falling back to the legacy
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingIdentityUrl`] or
    /// [`ConfigError::MissingIdentityApiKey`] when no source provides a
    /// value, and [`ConfigError::Invalid`] for malformed values.
    pub fn resolve_identity(&self) -> Result<IdentitySettings, ConfigError> {
        self.resolve_identity_with(|name| env::var(name).ok())
    }

    fn resolve_identity_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<IdentitySettings, ConfigError> {
        let raw_url = self
            .identity_url
            .clone()
            .or_else(|| lookup("SUPABASE_URL"))
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingIdentityUrl)?;
        let api_key = self
            .identity_api_key
            .clone()
            .or_else(|| lookup("SUPABASE_ANON_KEY"))
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingIdentityApiKey)?;

        Ok(IdentitySettings {
            base_url: parse_base_url("identity_url", &raw_url)?,
            api_key,
            profile_table: require_non_blank("profile_table", &self.profile_table)?,
            username_column: require_non_blank("username_column", &self.username_column)?,
        })
    }
}

/// Parses an absolute base URL and guarantees a trailing slash so relative
/// joins keep any path prefix.
fn parse_base_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|error| ConfigError::Invalid {
        field,
        message: error.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            field,
            message: "must be an http(s) URL".to_owned(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn require_non_blank(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid {
            field,
            message: "must not be blank".to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests;
