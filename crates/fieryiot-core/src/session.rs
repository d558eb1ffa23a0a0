// Session domain types
//
// The gateway holds at most one authenticated session. It is created by a
// successful credential exchange, replaced by later exchanges or token
// refreshes, and never persisted.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Opaque identity token presented by a client for exchange
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for IdentityToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for IdentityToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityToken")
            .field(&format_args!("<{} bytes>", self.0.len()))
            .finish()
    }
}

/// Authenticated session issued by the identity provider
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// User identifier; scopes the database namespace
    pub uid: String,
    /// Short-lived token authorizing database writes
    pub id_token: String,
    /// Long-lived token used to mint a new `id_token`
    pub refresh_token: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session that expires `expires_in` from now
    pub fn new(
        uid: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        let expires_in = ChronoDuration::from_std(expires_in).unwrap_or(ChronoDuration::zero());
        Self {
            uid: uid.into(),
            id_token: id_token.into(),
            refresh_token: refresh_token.into(),
            email: None,
            expires_at: Utc::now() + expires_in,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// How long to wait before refreshing, keeping `margin` before expiry.
    /// Zero if that point has already passed.
    pub fn refresh_delay(&self, now: DateTime<Utc>, margin: Duration) -> Duration {
        let margin = ChronoDuration::from_std(margin).unwrap_or(ChronoDuration::zero());
        (self.expires_at - margin - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holder of the current session
///
/// Cloning is cheap; all clones share the same underlying channel.
/// Readers borrow the latest value, listeners subscribe for changes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty store (no user signed in)
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Receiver notified whenever the session changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Replace the current session, whatever it was
    pub fn replace(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    /// Replace the current session only if it belongs to the same user.
    /// Returns whether the store was updated.
    pub fn replace_same_user(&self, session: Session) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(existing) if existing.uid == session.uid => {
                *current = Some(session);
                true
            }
            _ => false,
        })
    }
}
