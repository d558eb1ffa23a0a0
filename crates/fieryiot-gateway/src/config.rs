// Gateway listener configuration loaded from environment variables.

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;

/// Where the credential intake endpoint listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("GATEWAY_HOST").ok(),
            std::env::var("GATEWAY_PORT").ok(),
        )
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> Self {
        let host = host
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match port {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "GATEWAY_PORT is not a valid port, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self { host, port }
    }

    /// `host:port` string accepted by `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_address(), "localhost:8080");
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_vars(Some("0.0.0.0".into()), Some("9090".into()));
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = GatewayConfig::from_vars(None, Some("http".into()));
        assert_eq!(config, GatewayConfig::default());

        let config = GatewayConfig::from_vars(Some(String::new()), Some("70000".into()));
        assert_eq!(config, GatewayConfig::default());
    }
}
