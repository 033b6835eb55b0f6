use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_IDLE_GRACE_SECS: u64 = 30;

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (`PORT`).
    pub port: u16,
    /// How long an empty room survives before the registry reclaims it
    /// (`ROOM_IDLE_GRACE_SECS`).
    pub idle_grace: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let idle_grace = env::var("ROOM_IDLE_GRACE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_IDLE_GRACE_SECS));

        Self { port, idle_grace }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            idle_grace: Duration::from_secs(DEFAULT_IDLE_GRACE_SECS),
        }
    }
}
