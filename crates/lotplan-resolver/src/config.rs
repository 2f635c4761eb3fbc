//! Resolver configuration from environment variables
//!
//!   LOTPLAN_BIND_ADDR              listen address (default: 0.0.0.0:8000)
//!   LOTPLAN_UPSTREAM_TIMEOUT_SECS  per ArcGIS request timeout (default: 10)
//!   LOTPLAN_{QLD,NSW,SA,VIC}_URL   layer query endpoint overrides

use std::net::SocketAddr;
use std::time::Duration;

use lotplan_core::config::{parse_secs, parse_url};
use lotplan_core::ConfigError;

use crate::arcgis::Endpoints;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
/// Upper bound on queries accepted in one `/search` body
pub const DEFAULT_MAX_QUERIES: usize = 1000;

const BIND_ADDR_VAR: &str = "LOTPLAN_BIND_ADDR";
const UPSTREAM_TIMEOUT_VAR: &str = "LOTPLAN_UPSTREAM_TIMEOUT_SECS";
const QLD_URL_VAR: &str = "LOTPLAN_QLD_URL";
const NSW_URL_VAR: &str = "LOTPLAN_NSW_URL";
const SA_URL_VAR: &str = "LOTPLAN_SA_URL";
const VIC_URL_VAR: &str = "LOTPLAN_VIC_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Duration,
    pub endpoints: Endpoints,
    pub max_queries: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
            max_queries: DEFAULT_MAX_QUERIES,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: BIND_ADDR_VAR,
                    value: addr.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(secs) = lookup(UPSTREAM_TIMEOUT_VAR) {
            config.upstream_timeout =
                Duration::from_secs(parse_secs(UPSTREAM_TIMEOUT_VAR, &secs)?);
        }

        let endpoints = &mut config.endpoints;
        for (var, slot) in [
            (QLD_URL_VAR, &mut endpoints.qld),
            (NSW_URL_VAR, &mut endpoints.nsw),
            (SA_URL_VAR, &mut endpoints.sa),
            (VIC_URL_VAR, &mut endpoints.vic),
        ] {
            if let Some(url) = lookup(var) {
                *slot = parse_url(var, &url)?;
            }
        }

        Ok(config)
    }
}
