use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Fixed length of every night
    pub night_seconds: u64,
    pub static_dir: String,
    /// Longest discussion a room may ask for
    pub max_duration_seconds: u64,
    /// How long a room may stay empty before the reaper removes it
    pub empty_room_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            night_seconds: 30,
            static_dir: "static".to_string(),
            max_duration_seconds: 600,
            empty_room_grace_seconds: 60,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or invalid
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.static_dir);

        let config = Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            port: env_or("PORT", defaults.port),
            night_seconds: env_or("NIGHT_SECONDS", defaults.night_seconds).max(1),
            static_dir,
            max_duration_seconds: env_or("MAX_DURATION_SECONDS", defaults.max_duration_seconds)
                .max(1),
            empty_room_grace_seconds: env_or(
                "EMPTY_ROOM_GRACE_SECONDS",
                defaults.empty_room_grace_seconds,
            )
            .max(1),
        };

        tracing::info!(
            port = config.port,
            night_seconds = config.night_seconds,
            max_duration_seconds = config.max_duration_seconds,
            static_dir = %config.static_dir,
            "Server config loaded"
        );

        config
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn night_duration(&self) -> Duration {
        Duration::from_secs(self.night_seconds)
    }

    pub fn empty_room_grace(&self) -> Duration {
        Duration::from_secs(self.empty_room_grace_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "BIND_ADDR",
        "PORT",
        "NIGHT_SECONDS",
        "STATIC_DIR",
        "MAX_DURATION_SECONDS",
        "EMPTY_ROOM_GRACE_SECONDS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config.port, 5000);
        assert_eq!(config.night_seconds, 30);
        assert_eq!(config.max_duration_seconds, 600);
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    #[serial]
    fn test_reads_overrides() {
        clear_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("BIND_ADDR", "127.0.0.1");
        std::env::set_var("NIGHT_SECONDS", "5");

        let config = ServerConfig::from_env();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.night_duration(), Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("NIGHT_SECONDS", "0");

        let config = ServerConfig::from_env();
        assert_eq!(config.port, 5000);
        assert_eq!(config.night_seconds, 1);
        clear_env();
    }
}
