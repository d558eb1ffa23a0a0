// Collaborator traits
//
// These traits let the gateway run against different backends:
// - Firebase REST clients in production
// - In-memory implementations for testing

use async_trait::async_trait;

use crate::error::{DatabaseError, IdentityError};
use crate::event::{DatabasePath, SensorEvent};
use crate::session::{IdentityToken, Session};

// ============================================================================
// IdentityProvider - Exchanges credentials for sessions
// ============================================================================

/// Trait for identity providers
///
/// Implementations exchange an externally issued identity token (e.g. a
/// Google ID token) for a provider session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an identity token for a new session
    async fn exchange_credential(&self, token: &IdentityToken) -> Result<Session, IdentityError>;

    /// Mint a fresh ID token for an existing session
    async fn refresh_session(&self, session: &Session) -> Result<Session, IdentityError>;
}

// ============================================================================
// EventDatabase - Append-only event storage
// ============================================================================

/// Trait for the remote event database
///
/// Every append creates a new record under `path` and returns its key;
/// existing records are never overwritten.
#[async_trait]
pub trait EventDatabase: Send + Sync {
    /// Append a record on behalf of `session`, returning the new record key
    async fn append(
        &self,
        session: &Session,
        path: &DatabasePath,
        event: &SensorEvent,
    ) -> Result<String, DatabaseError>;
}
