use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Upper bound on live connections (idle + loaned).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Connections opened eagerly at pool construction.
    #[serde(default = "default_initial_connections")]
    pub initial_connections: usize,

    /// Busy timeout applied to each connection when it is opened.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long `acquire` waits for a released connection once the pool
    /// is saturated.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Wall-clock deadline for a single query issued through `execute`.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            initial_connections: default_initial_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl PoolConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn default_max_connections() -> usize {
    10
}

fn default_initial_connections() -> usize {
    3
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    60
}
