// In-memory implementations for testing
//
// These implementations keep all data in memory, making them useful for:
// - Unit tests of the intake endpoint and publisher
// - Running the gateway without Firebase credentials

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::error::{DatabaseError, IdentityError};
use crate::event::{DatabasePath, SensorEvent};
use crate::session::{IdentityToken, Session};
use crate::traits::{EventDatabase, IdentityProvider};

// ============================================================================
// InMemoryEventDatabase - Records appended events
// ============================================================================

/// A record written through [`InMemoryEventDatabase`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedEvent {
    /// User the write was made on behalf of
    pub uid: String,
    pub path: DatabasePath,
    pub key: String,
    pub event: SensorEvent,
}

/// In-memory event database
///
/// Appends are kept in arrival order. Keys are zero-padded counters, so they
/// sort in the same order they were issued.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventDatabase {
    records: Arc<RwLock<Vec<AppendedEvent>>>,
    next_key: Arc<AtomicU64>,
    append_calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl InMemoryEventDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail with a permission error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of append calls, including failed ones
    pub fn append_count(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// All stored records
    pub async fn records(&self) -> Vec<AppendedEvent> {
        self.records.read().await.clone()
    }

    /// Records stored under a specific path
    pub async fn records_at(&self, path: &DatabasePath) -> Vec<AppendedEvent> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventDatabase for InMemoryEventDatabase {
    async fn append(
        &self,
        session: &Session,
        path: &DatabasePath,
        event: &SensorEvent,
    ) -> Result<String, DatabaseError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::rejected(401, "Permission denied"));
        }

        let key = format!("-evt{:016}", self.next_key.fetch_add(1, Ordering::SeqCst));
        self.records.write().await.push(AppendedEvent {
            uid: session.uid.clone(),
            path: path.clone(),
            key: key.clone(),
            event: event.clone(),
        });
        Ok(key)
    }
}

// ============================================================================
// ScriptedIdentityProvider - Maps known tokens to sessions
// ============================================================================

/// Identity provider with a fixed token → session table
///
/// Unknown tokens are rejected with `INVALID_IDP_RESPONSE`. An optional gate
/// holds every exchange until it is notified.
#[derive(Debug, Default, Clone)]
pub struct ScriptedIdentityProvider {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    exchanges: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
    fail_refreshes: Arc<AtomicBool>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedIdentityProvider {
    /// Create a provider that knows no tokens
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold exchanges until `gate` is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Register the session a token exchanges for
    pub async fn add_session(&self, token: impl Into<String>, session: Session) {
        self.sessions.write().await.insert(token.into(), session);
    }

    /// Make refreshes fail
    pub fn fail_refreshes(&self, fail: bool) {
        self.fail_refreshes.store(fail, Ordering::SeqCst);
    }

    /// Number of exchange attempts so far
    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Number of refresh attempts so far
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    async fn exchange_credential(&self, token: &IdentityToken) -> Result<Session, IdentityError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.sessions
            .read()
            .await
            .get(token.as_str())
            .cloned()
            .ok_or_else(|| IdentityError::rejected(400, "INVALID_IDP_RESPONSE"))
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, IdentityError> {
        let attempt = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_refreshes.load(Ordering::SeqCst) {
            return Err(IdentityError::rejected(400, "TOKEN_EXPIRED"));
        }

        Ok(Session {
            id_token: format!("{}-refreshed-{}", session.id_token, attempt),
            expires_at: Utc::now() + ChronoDuration::hours(1),
            ..session.clone()
        })
    }
}
