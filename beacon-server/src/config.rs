use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime knobs, overridable through the environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    /// Shared pub/sub store for multi-process deployments. Without it the
    /// relay runs on the in-process bus, single-process only.
    pub redis_url: Option<String>,
    pub heartbeat_interval: Duration,
    pub idle_timeout: Duration,
    /// Capacity of each connection's outbound channel; deliveries beyond
    /// it are dropped rather than queued without bound.
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            redis_url: None,
            heartbeat_interval: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(60),
            channel_capacity: 64,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parsed("BEACON_PORT").unwrap_or(defaults.port),
            redis_url: env::var("BEACON_REDIS_URL").ok(),
            heartbeat_interval: env_parsed("BEACON_HEARTBEAT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            idle_timeout: env_parsed("BEACON_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            channel_capacity: env_parsed("BEACON_CHANNEL_CAPACITY")
                .unwrap_or(defaults.channel_capacity),
        }
    }
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
