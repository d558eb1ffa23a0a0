// Firebase project configuration loaded from environment variables.
// Decision: Compiled-in defaults point at the demo project, env vars override them

use thiserror::Error;
use url::Url;

const DEFAULT_API_KEY: &str = "abcdefghijklmnopqrstuvwxyz1234567890";
const DEFAULT_AUTH_DOMAIN: &str = "fieryiot-12345.firebaseapp.com";
const DEFAULT_DATABASE_URL: &str = "https://fieryiot-12345.firebaseio.com";
const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";

/// Errors raised while setting up Firebase clients
#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Firebase project connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Web API key of the project
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    /// Identity Toolkit base URL (overridable for tests)
    pub identity_url: String,
    /// Secure Token base URL (overridable for tests)
    pub secure_token_url: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            auth_domain: DEFAULT_AUTH_DOMAIN.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            secure_token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
        }
    }
}

impl FirebaseConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, FirebaseError> {
        let defaults = Self::default();
        let var = |name: &str, default: String| {
            std::env::var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };

        let config = Self {
            api_key: var("FIREBASE_API_KEY", defaults.api_key),
            auth_domain: var("FIREBASE_AUTH_DOMAIN", defaults.auth_domain),
            database_url: var("FIREBASE_DATABASE_URL", defaults.database_url),
            identity_url: var("FIREBASE_IDENTITY_URL", defaults.identity_url),
            secure_token_url: var("FIREBASE_SECURE_TOKEN_URL", defaults.secure_token_url),
        };
        config.validate()?;
        Ok(config)
    }

    /// Point all services at one base URL (used with mock servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.database_url = base_url.to_string();
        self.identity_url = base_url.to_string();
        self.secure_token_url = base_url.to_string();
        self
    }

    /// Check that every URL parses and the API key is set
    pub fn validate(&self) -> Result<(), FirebaseError> {
        if self.api_key.is_empty() {
            return Err(FirebaseError::Configuration(
                "FIREBASE_API_KEY must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("FIREBASE_DATABASE_URL", &self.database_url),
            ("FIREBASE_IDENTITY_URL", &self.identity_url),
            ("FIREBASE_SECURE_TOKEN_URL", &self.secure_token_url),
        ] {
            Url::parse(value)
                .map_err(|e| FirebaseError::Configuration(format!("{name} is invalid: {e}")))?;
        }
        Ok(())
    }

    /// URL passed as `requestUri` when signing in with an IdP credential
    pub fn request_uri(&self) -> String {
        format!("http://{}", self.auth_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FirebaseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_uri(), "http://fieryiot-12345.firebaseapp.com");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = FirebaseConfig {
            database_url: "not a url".to_string(),
            ..FirebaseConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("FIREBASE_DATABASE_URL"));
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let config = FirebaseConfig {
            api_key: String::new(),
            ..FirebaseConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FirebaseError::Configuration(_))
        ));
    }

    #[test]
    fn test_with_base_url() {
        let config = FirebaseConfig::default().with_base_url("http://127.0.0.1:1234");
        assert_eq!(config.database_url, "http://127.0.0.1:1234");
        assert_eq!(config.identity_url, "http://127.0.0.1:1234");
        assert_eq!(config.secure_token_url, "http://127.0.0.1:1234");
        assert_eq!(config.auth_domain, "fieryiot-12345.firebaseapp.com");
    }
}
