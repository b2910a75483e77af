//! Connection configuration
//!
//! Options governing the lifecycle of stream sessions. Datagram transports
//! ignore everything except nothing at all: the configuration is carried but
//! connectionless sockets have no lifecycle to manage.

use std::time::Duration;

/// Stream-session lifecycle options
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Interval between liveness probes on an idle session; None disables
    /// keep-alive
    pub keep_alive_interval: Option<Duration>,
    /// Upper bound on a single connect, including the TLS handshake for
    /// secure streams
    pub connection_timeout: Duration,
    /// Re-establish broken sessions transparently
    pub auto_reconnect_enabled: bool,
    /// Cap on consecutive reconnect tries; exceeding is fatal
    pub max_reconnect_attempts: u32,
    /// Delay between reconnect tries
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            keep_alive_interval: Some(Duration::from_secs(300)),
            connection_timeout: Duration::from_secs(30),
            auto_reconnect_enabled: true,
            max_reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    /// Configuration with keep-alive and automatic reconnection disabled
    pub fn minimal() -> Self {
        ConnectionConfig {
            keep_alive_interval: None,
            auto_reconnect_enabled: false,
            ..ConnectionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.keep_alive_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert!(config.auto_reconnect_enabled);
        assert_eq!(config.max_reconnect_attempts, 3);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_minimal() {
        let config = ConnectionConfig::minimal();
        assert!(config.keep_alive_interval.is_none());
        assert!(!config.auto_reconnect_enabled);
    }
}
