//! Server configuration from the environment.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use userapp_client::config::{ConfigError, ProviderConfig};

pub const ENV_PORT: &str = "PORT";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub provider: ProviderConfig,
    pub port: u16,
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns an error if provider settings are missing or `PORT` is not a
    /// valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`], reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = ProviderConfig::server_from_lookup(&lookup)?;
        let port = match lookup(ENV_PORT) {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var: ENV_PORT, value: raw })?,
        };
        Ok(Self { provider, port })
    }
}
