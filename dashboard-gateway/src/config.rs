//! Environment-driven configuration.

use std::str::FromStr;
use std::time::Duration;

use probe_core::source::DEFAULT_MAX_POINTS;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub addr: String,
    pub backend_base: String,
    pub backend_timeout: Duration,
    /// Zero disables the response cache.
    pub cache_ttl: Duration,
    pub attention_limit: u32,
    pub max_points: u32,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn number<T: FromStr>(value: Option<String>, default: T) -> T {
            value
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        }

        Self {
            addr: lookup("GATEWAY_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            backend_base: lookup("BACKEND_API_BASE")
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            backend_timeout: Duration::from_secs(number(lookup("BACKEND_TIMEOUT_SECS"), 10)),
            cache_ttl: Duration::from_secs(number(lookup("BACKEND_CACHE_TTL_SECS"), 60)),
            attention_limit: number(lookup("ATTENTION_LIMIT"), 20),
            max_points: number(lookup("SERIES_MAX_POINTS"), DEFAULT_MAX_POINTS),
        }
    }
}
