//! Relay configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::limiter::RateLimiter;

/// Relay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listen address, `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    /// Path prefix injected into `config.js` for reverse-proxy deployments
    #[serde(default)]
    pub reverse_proxy_base: String,

    /// Directory served for non-relay paths
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Per-session rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            reverse_proxy_base: String::new(),
            static_dir: default_static_dir(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-session rate limiting configuration.
///
/// Tokens are denominated in bits so the limits read as bitrates: the
/// defaults allow 0.5 Mbps sustained with a 10 Mbit burst.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained refill rate in bits per second
    #[serde(default = "default_rate_bits_per_sec")]
    pub rate_bits_per_sec: u64,

    /// Burst capacity in bits
    #[serde(default = "default_burst_bits")]
    pub burst_bits: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_bits_per_sec: default_rate_bits_per_sec(),
            burst_bits: default_burst_bits(),
        }
    }
}

impl RateLimitConfig {
    /// Builds a fresh limiter for one session.
    #[must_use]
    pub fn new_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.rate_bits_per_sec, self.burst_bits)
    }
}

fn default_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_rate_bits_per_sec() -> u64 {
    500_000
}

fn default_burst_bits() -> u64 {
    10_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_default() {
        let config = RelayConfig::default();
        assert_eq!(config.address, "0.0.0.0:8080");
        assert_eq!(config.reverse_proxy_base, "");
        assert_eq!(config.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.rate_bits_per_sec, 500_000);
        assert_eq!(config.burst_bits, 10_000_000);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: RelayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.address, "0.0.0.0:8080");
        assert_eq!(config.rate_limit.burst_bits, 10_000_000);
    }

    #[test]
    fn test_config_deserialize_overrides() {
        let config: RelayConfig = serde_json::from_str(
            r#"{"address":"127.0.0.1:9000","rate_limit":{"burst_bits":80}}"#,
        )
        .unwrap();
        assert_eq!(config.address, "127.0.0.1:9000");
        assert_eq!(config.rate_limit.burst_bits, 80);
        assert_eq!(config.rate_limit.rate_bits_per_sec, 500_000);
    }
}
