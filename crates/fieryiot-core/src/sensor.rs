// Sensor data sources
//
// Real deployments read from a hardware/driver layer; the gateway ships
// with a synthetic source returning a fixed placeholder reading.

/// Placeholder reading used by the synthetic sensor
pub const DEFAULT_SENSOR_VALUE: &str = "foo-sensor-value";

/// Source of sensor readings
pub trait SensorSource: Send + Sync {
    /// Take one reading
    fn read(&self) -> String;
}

/// Synthetic sensor that always reports the same value
#[derive(Debug, Clone)]
pub struct PlaceholderSensor {
    value: String,
}

impl PlaceholderSensor {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Default for PlaceholderSensor {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_VALUE)
    }
}

impl SensorSource for PlaceholderSensor {
    fn read(&self) -> String {
        self.value.clone()
    }
}
