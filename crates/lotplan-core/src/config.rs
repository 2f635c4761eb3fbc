//! Pipeline configuration from environment variables
//!
//!   LOTPLAN_RESOLVER_URL : search endpoint (default: http://127.0.0.1:8000/search)
//!   LOTPLAN_TIMEOUT_SECS : per-request timeout (default: 30)

use std::time::Duration;

use crate::dispatch::{HttpResolver, DEFAULT_TIMEOUT_SECS};
use crate::error::{ConfigError, DispatchError};

pub const DEFAULT_RESOLVER_URL: &str = "http://127.0.0.1:8000/search";

const RESOLVER_URL_VAR: &str = "LOTPLAN_RESOLVER_URL";
const TIMEOUT_VAR: &str = "LOTPLAN_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub resolver_url: String,
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolver_url: DEFAULT_RESOLVER_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`, falling back to defaults for unset variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(RESOLVER_URL_VAR) {
            config.resolver_url = parse_url(RESOLVER_URL_VAR, &url)?;
        }
        if let Some(secs) = lookup(TIMEOUT_VAR) {
            config.timeout = Duration::from_secs(parse_secs(TIMEOUT_VAR, &secs)?);
        }

        Ok(config)
    }

    pub fn http_resolver(&self) -> Result<HttpResolver, DispatchError> {
        HttpResolver::with_timeout(self.resolver_url.clone(), self.timeout)
    }
}

/// Validate an http(s) URL, returning it trimmed
pub fn parse_url(var: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let url = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Parse a positive number of seconds
pub fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        Ok(_) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("LOTPLAN_RESOLVER_URL", " https://parcels.example.com/search "),
            ("LOTPLAN_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.resolver_url, "https://parcels.example.com/search");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(PipelineConfig::from_lookup(lookup(&[("LOTPLAN_TIMEOUT_SECS", "soon")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("LOTPLAN_TIMEOUT_SECS", "0")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("LOTPLAN_RESOLVER_URL", "not a url")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("LOTPLAN_RESOLVER_URL", "ftp://host/x")])).is_err());
    }
}
