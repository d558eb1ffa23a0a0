// Publisher configuration
// Decision: Fixed period with a compiled-in default; env override only for local experiments

use fieryiot_core::DEFAULT_SENSOR_VALUE;
use std::time::Duration;

/// Period between two sensor events
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(15_000);

/// Configuration for the sensor event publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub interval: Duration,
    /// Reading reported by the synthetic sensor
    pub sensor_value: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PUBLISH_INTERVAL,
            sensor_value: DEFAULT_SENSOR_VALUE.to_string(),
        }
    }
}

impl PublisherConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("PUBLISH_INTERVAL_MS").ok(),
            std::env::var("SENSOR_VALUE").ok(),
        )
    }

    fn from_vars(interval_ms: Option<String>, sensor_value: Option<String>) -> Self {
        let defaults = Self::default();

        let interval = match interval_ms {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "PUBLISH_INTERVAL_MS is not a positive integer, using default"
                    );
                    defaults.interval
                }
            },
            None => defaults.interval,
        };

        let sensor_value = sensor_value
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.sensor_value);

        Self {
            interval,
            sensor_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.sensor_value, "foo-sensor-value");
    }

    #[test]
    fn test_overrides() {
        let config = PublisherConfig::from_vars(Some("500".into()), Some("42".into()));
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.sensor_value, "42");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = PublisherConfig::from_vars(Some("soon".into()), Some(String::new()));
        assert_eq!(config, PublisherConfig::default());

        let config = PublisherConfig::from_vars(Some("0".into()), None);
        assert_eq!(config.interval, DEFAULT_PUBLISH_INTERVAL);
    }
}
