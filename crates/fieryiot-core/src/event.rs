// Sensor event domain types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of the per-user event namespaces
pub const SENSOR_EVENTS_ROOT: &str = "sensorevents";

/// A single sensor reading as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub value: String,
    /// RFC 3339 wall-clock time the reading was taken
    pub time: String,
}

impl SensorEvent {
    /// Create an event stamped with the current time
    pub fn new(value: impl Into<String>) -> Self {
        Self::at(value, Utc::now())
    }

    pub fn at(value: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parse the timestamp back, if it is well formed
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Slash-separated database location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabasePath(String);

impl DatabasePath {
    /// Namespace holding all events of one user: `sensorevents/<uid>`
    pub fn sensor_events(uid: &str) -> Self {
        Self(format!("{}/{}", SENSOR_EVENTS_ROOT, uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
