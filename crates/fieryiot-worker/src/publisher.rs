// Sensor event publisher
// Decision: Each tick reads the session store once; no session means nothing is sent
// Decision: Writes are dispatched on detached tasks and their outcome is only traced
//
// There is no catch-up: ticks without a session are dropped, not queued.

use std::sync::Arc;

use fieryiot_core::{
    DatabasePath, EventDatabase, PlaceholderSensor, SensorEvent, SensorSource, SessionStore,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::PublisherConfig;

/// Result of a single publisher tick
#[derive(Debug)]
pub enum TickOutcome {
    /// No user was signed in; nothing was sent
    Skipped,
    /// An append was dispatched for the signed-in user
    Dispatched {
        path: DatabasePath,
        /// The detached write; awaiting it is optional
        handle: JoinHandle<()>,
    },
}

/// Periodically appends a sensor reading for the signed-in user
pub struct Publisher {
    store: SessionStore,
    database: Arc<dyn EventDatabase>,
    sensor: Arc<dyn SensorSource>,
    interval: Duration,
}

impl Publisher {
    pub fn new(
        config: &PublisherConfig,
        store: SessionStore,
        database: Arc<dyn EventDatabase>,
    ) -> Self {
        Self {
            store,
            database,
            sensor: Arc::new(PlaceholderSensor::new(config.sensor_value.clone())),
            interval: config.interval,
        }
    }

    /// Replace the synthetic sensor with another source
    pub fn with_sensor(mut self, sensor: Arc<dyn SensorSource>) -> Self {
        self.sensor = sensor;
        self
    }

    /// Publish one reading if a user is signed in
    pub fn tick(&self) -> TickOutcome {
        info!("Sensor event");

        let Some(session) = self.store.current() else {
            return TickOutcome::Skipped;
        };

        let path = DatabasePath::sensor_events(&session.uid);
        let event = SensorEvent::new(self.sensor.read());
        let database = self.database.clone();
        let write_path = path.clone();

        let handle = tokio::spawn(async move {
            match database.append(&session, &write_path, &event).await {
                Ok(key) => debug!(path = %write_path, key = %key, "Sensor event stored"),
                Err(e) => debug!(path = %write_path, error = %e, "Sensor event write failed"),
            }
        });

        info!(path = %path, "Added new item to database");
        TickOutcome::Dispatched { path, handle }
    }

    /// Tick every interval until shutdown is signalled
    ///
    /// The first tick happens one full interval after start. Late ticks are
    /// delayed rather than bursted.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_ms = self.interval.as_millis() as u64, "Sensor publisher started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                _ = shutdown.changed() => {
                    info!("Sensor publisher shutting down");
                    break;
                }
            }
        }
    }

    /// Run the publisher on a background task
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
