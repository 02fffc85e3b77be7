use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTL cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// TTL applied when a caller does not override it. Also the yardstick
    /// for the `expired` count in [`CacheStats`].
    ///
    /// [`CacheStats`]: super::CacheStats
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

fn default_ttl() -> u64 {
    300
}
