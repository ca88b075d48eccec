use serde::Deserialize;

/// App-level cache configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheAppConfig {
    /// Whether the Redis cache is enabled. Default: true.
    /// When disabled, counters live in process memory and are lost on restart.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_cache_url")]
    pub url: String,
    /// Connection timeout in milliseconds. Default: 5000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Reconnect attempts before a command fails. Default: 3.
    #[serde(default = "default_cache_retries")]
    pub retries: usize,
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_url() -> String {
    "redis://localhost:6379".into()
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_cache_retries() -> usize {
    3
}

impl Default for CacheAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            url: default_cache_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retries: default_cache_retries(),
        }
    }
}
