// Gateway Core Abstractions
//
// This crate provides the backend-agnostic pieces shared by the credential
// intake endpoint and the sensor event publisher.
//
// Key design decisions:
// - The process-wide session is an explicit SessionStore, injected into both components
// - Collaborators (identity provider, database, sensor) are traits with in-memory doubles
// - Credential exchange is fire-and-forget: failures are logged, never returned to callers

pub mod auth;
pub mod error;
pub mod event;
pub mod sensor;
pub mod session;
pub mod traits;

// In-memory implementations for testing
pub mod memory;

// Re-exports for convenience
pub use auth::{spawn_session_listener, spawn_token_refresher, Authenticator, REFRESH_MARGIN};
pub use error::{DatabaseError, IdentityError};
pub use event::{DatabasePath, SensorEvent, SENSOR_EVENTS_ROOT};
pub use sensor::{PlaceholderSensor, SensorSource, DEFAULT_SENSOR_VALUE};
pub use session::{IdentityToken, Session, SessionStore};
pub use traits::{EventDatabase, IdentityProvider};
