//! Provider configuration parsed from environment variables.
//!
//! Two entry points exist because the browser-facing client and the server
//! route authenticate with different keys. A missing value only fails the
//! path that needs it.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_DIR: &str = ".userapp";

pub const ENV_URL: &str = "SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_REQUEST_TIMEOUT: &str = "PROVIDER_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT: &str = "PROVIDER_CONNECT_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "USERAPP_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Connection settings for the hosted auth + database provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL without a trailing slash, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    /// Key sent as `apikey` on every request.
    pub api_key: String,
    pub timeouts: ProviderTimeouts,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl ProviderConfig {
    /// Client-side config: `SUPABASE_URL` and `SUPABASE_ANON_KEY` are required.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing, the URL is not http(s),
    /// or a timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Server-side config: `SUPABASE_URL` is required; the key is
    /// `SUPABASE_SERVICE_ROLE_KEY`, falling back to `SUPABASE_ANON_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or both keys are missing, or a timeout is
    /// not a positive integer.
    pub fn server_from_env() -> Result<Self, ConfigError> {
        Self::server_from_lookup(env_lookup)
    }

    /// Build the client-side config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ProviderConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(&lookup)?;
        let api_key = required(&lookup, ENV_ANON_KEY)?;
        Ok(Self { base_url, api_key, timeouts: parse_timeouts(&lookup)? })
    }

    /// Build the server-side config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ProviderConfig::server_from_env`].
    pub fn server_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(&lookup)?;
        let api_key = required(&lookup, ENV_SERVICE_ROLE_KEY)
            .or_else(|_| required(&lookup, ENV_ANON_KEY))
            .map_err(|_| ConfigError::Missing { var: ENV_SERVICE_ROLE_KEY })?;
        Ok(Self { base_url, api_key, timeouts: parse_timeouts(&lookup)? })
    }
}

/// Directory for the durable key-value store (`USERAPP_DATA_DIR`, default `.userapp`).
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    data_dir_from_lookup(env_lookup)
}

pub fn data_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(&lookup, ENV_DATA_DIR).map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, var).ok_or(ConfigError::Missing { var })
}

fn parse_base_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, ENV_URL)?;
    if !(raw.starts_with("https://") || raw.starts_with("http://")) {
        return Err(ConfigError::Invalid { var: ENV_URL, value: raw });
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

fn parse_timeouts<F>(lookup: &F) -> Result<ProviderTimeouts, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(ProviderTimeouts {
        request_secs: parse_secs(lookup, ENV_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECS)?,
        connect_secs: parse_secs(lookup, ENV_CONNECT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT_SECS)?,
    })
}

/// Unset or blank uses `default`; anything else must be a positive integer.
fn parse_secs<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup, var) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}
