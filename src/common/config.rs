//! Configuration loading
//!
//! The only knob is the API base URL, read once from `API_URL`.

use reqwest::Url;

use super::{Error, Result};

/// Environment variable holding the API base URL
pub const API_URL_VAR: &str = "API_URL";

/// Base URL used when `API_URL` is unset or blank
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the billing API, without a trailing slash
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_URL_VAR) {
            Some(raw) if !raw.trim().is_empty() => Self::with_base_url(&raw),
            _ => Ok(Self::default()),
        }
    }

    /// Build a configuration for an explicit base URL
    pub fn with_base_url(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');

        let url = Url::parse(trimmed).map_err(|e| Error::invalid_base_url(raw, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::invalid_base_url(
                raw,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::invalid_base_url(
                raw,
                "query strings and fragments are not allowed",
            ));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }
}
