// Sensor Publisher
//
// This crate turns the shared session into periodic sensor events:
// - Every interval the publisher reads the session store once
// - A signed-in user gets one reading appended under sensorevents/<uid>
// - Ticks without a session are dropped, never queued

pub mod config;
pub mod publisher;

// Re-export main types
pub use config::{PublisherConfig, DEFAULT_PUBLISH_INTERVAL};
pub use publisher::{Publisher, TickOutcome};
