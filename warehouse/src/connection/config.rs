use crate::common::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_PORT, HOST_ENV_VAR, PORT_ENV_VAR,
};
use std::env;
use std::time::Duration;

/// Configuration for establishing a store connection.
///
/// # Purpose
/// Carries the endpoint address and connect timeout for
/// [MessageCollection::open]. Host and port left unset are resolved from the
/// surrounding environment (`WAREHOUSE_HOST` / `WAREHOUSE_PORT`), falling
/// back to `localhost:27017`.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
/// use warehouse::connection::ConnectionConfig;
///
/// // environment-resolved endpoint, default timeout
/// let config = ConnectionConfig::new();
///
/// // explicit endpoint with a short timeout
/// let config = ConnectionConfig::new()
///     .with_host("db.example.org")
///     .with_port(27018)
///     .with_timeout(Duration::from_secs(5));
/// ```
///
/// [MessageCollection::open]: crate::collection::MessageCollection::open
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: Option<String>,
    port: Option<u16>,
    timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionConfig {
    /// Creates a configuration with environment-resolved host/port and the
    /// default connect timeout.
    pub fn new() -> Self {
        ConnectionConfig {
            host: None,
            port: None,
            timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Overrides the host instead of resolving it from the environment.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Overrides the port instead of resolving it from the environment.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the connect timeout. Connecting fails with
    /// [ErrorKind::ConnectionFailed] when no connection can be established
    /// before it elapses.
    ///
    /// [ErrorKind::ConnectionFailed]: crate::errors::ErrorKind::ConnectionFailed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves the effective host: explicit override, then the
    /// `WAREHOUSE_HOST` environment variable, then the default.
    pub fn resolve_host(&self) -> String {
        match &self.host {
            Some(host) => host.clone(),
            None => env::var(HOST_ENV_VAR).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        }
    }

    /// Resolves the effective port: explicit override, then the
    /// `WAREHOUSE_PORT` environment variable (ignored when unparsable),
    /// then the default.
    pub fn resolve_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None => env::var(PORT_ENV_VAR)
                .ok()
                .and_then(|raw| match raw.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(e) => {
                        log::warn!(
                            "Ignoring unparsable {} value '{}': {}",
                            PORT_ENV_VAR,
                            raw,
                            e
                        );
                        None
                    }
                })
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_overrides_win() {
        let config = ConnectionConfig::new()
            .with_host("db.example.org")
            .with_port(4242)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.resolve_host(), "db.example.org");
        assert_eq!(config.resolve_port(), 4242);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_timeout() {
        let config = ConnectionConfig::new();
        assert_eq!(
            config.timeout(),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        );
    }

    // Environment-variable resolution is covered in the integration tests;
    // mutating process environment in parallel unit tests is racy.
    #[test]
    fn test_defaults_without_overrides() {
        let config = ConnectionConfig::new();
        // with no explicit override, resolution yields either the env value
        // or the built-in default; both are non-empty
        assert!(!config.resolve_host().is_empty());
        assert!(config.resolve_port() > 0);
    }
}
