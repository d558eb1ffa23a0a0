// Credential exchange and session lifecycle
// Decision: Exchange is dispatched on a detached task; the caller only gets a JoinHandle
// Decision: Failed exchanges are logged and otherwise swallowed, the previous session stays
// Decision: Token refresh happens once per session lifetime; a failed refresh is not retried

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::session::{IdentityToken, Session, SessionStore};
use crate::traits::IdentityProvider;

/// How long before expiry the refresher mints a new ID token
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Exchanges identity tokens for sessions and publishes them to the store
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
}

impl Authenticator {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: SessionStore) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Start exchanging `token` for a session without waiting for the result
    ///
    /// On success the new session replaces whatever the store held. On
    /// failure the error is logged and the store is left untouched.
    pub fn submit(&self, token: IdentityToken) -> JoinHandle<()> {
        let provider = self.provider.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            match provider.exchange_credential(&token).await {
                Ok(session) => {
                    debug!(uid = %session.uid, "Credential exchanged for session");
                    store.replace(session);
                }
                Err(e) => {
                    error!(
                        code = %e.code(),
                        email = e.email().unwrap_or("unknown"),
                        "Error signing in to Firebase with user {}: {} ({})",
                        e.email().unwrap_or("unknown"),
                        e.message(),
                        e.code()
                    );
                }
            }
        })
    }
}

/// Log sign-in state changes until shutdown
///
/// The current state is logged once on start. Token refreshes that keep the
/// same user are not reported.
pub fn spawn_session_listener(
    mut sessions: watch::Receiver<Option<Session>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_uid: Option<Option<String>> = None;

        loop {
            let uid = sessions.borrow_and_update().as_ref().map(|s| s.uid.clone());
            if let Some(state) = sign_in_transition(&last_uid, &uid) {
                match state {
                    SignInState::SignedIn(uid) => info!(uid = %uid, "Signed in to Firebase"),
                    SignInState::SignedOut => info!("No user signed in"),
                }
                last_uid = Some(uid);
            }

            tokio::select! {
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    debug!("Session listener shutting down");
                    break;
                }
            }
        }
    })
}

/// Sign-in state as reported by the session listener
#[derive(Debug, PartialEq, Eq)]
enum SignInState<'a> {
    SignedIn(&'a str),
    SignedOut,
}

/// State to report when the signed-in uid moves from `last` to `now`
///
/// `last` is `None` until the first report. Changes that keep the same uid
/// (token refreshes, re-sign-in of the same user) report nothing.
fn sign_in_transition<'a>(
    last: &Option<Option<String>>,
    now: &'a Option<String>,
) -> Option<SignInState<'a>> {
    if last.as_ref() == Some(now) {
        return None;
    }
    Some(match now {
        Some(uid) => SignInState::SignedIn(uid),
        None => SignInState::SignedOut,
    })
}

/// Keep the active session's ID token fresh until shutdown
pub fn spawn_token_refresher(
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sessions = store.subscribe();

        loop {
            let current = sessions.borrow_and_update().clone();

            let session = match current {
                Some(session) => session,
                None => {
                    if wait_for_session_change(&mut sessions, &mut shutdown).await {
                        continue;
                    }
                    break;
                }
            };

            let delay = session.refresh_delay(Utc::now(), REFRESH_MARGIN);
            debug!(uid = %session.uid, delay_secs = delay.as_secs(), "Scheduled token refresh");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = shutdown.changed() => break,
            }

            match provider.refresh_session(&session).await {
                Ok(refreshed) => {
                    if store.replace_same_user(refreshed) {
                        info!(uid = %session.uid, "Session token refreshed");
                        continue;
                    }
                    debug!(uid = %session.uid, "Session changed during refresh, discarding result");
                }
                Err(e) => {
                    warn!(uid = %session.uid, error = %e, "Failed to refresh session token");
                }
            }

            // Wait for the next sign-in rather than retrying
            if !wait_for_session_change(&mut sessions, &mut shutdown).await {
                break;
            }
        }

        debug!("Token refresher shutting down");
    })
}

/// Returns false once shutdown is signalled or the store is gone
async fn wait_for_session_change(
    sessions: &mut watch::Receiver<Option<Session>>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        changed = sessions.changed() => changed.is_ok(),
        _ = shutdown.changed() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ScriptedIdentityProvider;

    fn session(uid: &str, expires_in: Duration) -> Session {
        Session::new(uid, format!("id-{uid}"), format!("refresh-{uid}"), expires_in)
    }

    #[tokio::test]
    async fn test_submit_replaces_session_on_success() {
        let provider = ScriptedIdentityProvider::new();
        provider
            .add_session("tok123", session("u1", Duration::from_secs(3600)))
            .await;
        let auth = Authenticator::new(Arc::new(provider.clone()), SessionStore::new());

        auth.submit(IdentityToken::new("tok123")).await.unwrap();

        assert_eq!(auth.store().current().map(|s| s.uid), Some("u1".to_string()));
        assert_eq!(provider.exchange_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_exchange_keeps_previous_session() {
        let provider = ScriptedIdentityProvider::new();
        let store = SessionStore::new();
        store.replace(session("u1", Duration::from_secs(3600)));
        let auth = Authenticator::new(Arc::new(provider.clone()), store.clone());

        auth.submit(IdentityToken::new("unknown")).await.unwrap();

        assert_eq!(store.current().map(|s| s.uid), Some("u1".to_string()));
        assert_eq!(provider.exchange_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_exchange_without_session_stays_signed_out() {
        let provider = ScriptedIdentityProvider::new();
        let auth = Authenticator::new(Arc::new(provider), SessionStore::new());

        auth.submit(IdentityToken::new("bad")).await.unwrap();

        assert!(auth.store().current().is_none());
    }

    #[tokio::test]
    async fn test_later_exchange_supersedes_earlier() {
        let provider = ScriptedIdentityProvider::new();
        provider
            .add_session("tok-a", session("ua", Duration::from_secs(3600)))
            .await;
        provider
            .add_session("tok-b", session("ub", Duration::from_secs(3600)))
            .await;
        let auth = Authenticator::new(Arc::new(provider), SessionStore::new());

        auth.submit(IdentityToken::new("tok-a")).await.unwrap();
        auth.submit(IdentityToken::new("tok-b")).await.unwrap();

        assert_eq!(auth.store().current().map(|s| s.uid), Some("ub".to_string()));
    }

    #[test]
    fn test_sign_in_transition_reports_initial_empty_state() {
        assert_eq!(sign_in_transition(&None, &None), Some(SignInState::SignedOut));
    }

    #[test]
    fn test_sign_in_transition_reports_sign_in() {
        let now = Some("u1".to_string());
        assert_eq!(
            sign_in_transition(&Some(None), &now),
            Some(SignInState::SignedIn("u1"))
        );
        assert_eq!(
            sign_in_transition(&None, &now),
            Some(SignInState::SignedIn("u1"))
        );
    }

    #[test]
    fn test_sign_in_transition_ignores_same_user() {
        let last = Some(Some("u1".to_string()));
        assert_eq!(sign_in_transition(&last, &Some("u1".to_string())), None);
        assert_eq!(sign_in_transition(&Some(None), &None), None);
    }

    #[test]
    fn test_sign_in_transition_reports_user_switch() {
        let last = Some(Some("u1".to_string()));
        let now = Some("u2".to_string());
        assert_eq!(
            sign_in_transition(&last, &now),
            Some(SignInState::SignedIn("u2"))
        );
    }

    #[tokio::test]
    async fn test_session_listener_stops_on_shutdown() {
        let store = SessionStore::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_session_listener(store.subscribe(), shutdown_rx);

        store.replace(session("u1", Duration::from_secs(3600)));
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener did not stop")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_refreshes_before_expiry() {
        let provider = ScriptedIdentityProvider::new();
        let store = SessionStore::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = spawn_token_refresher(Arc::new(provider.clone()), store.clone(), shutdown_rx);

        store.replace(session("u1", Duration::from_secs(600)));

        // Expiry is wall-clock based, so the refresh is due roughly 300s from now
        tokio::time::sleep(Duration::from_secs(310)).await;
        tokio::task::yield_now().await;

        assert_eq!(provider.refresh_count(), 1);
        let current = store.current().unwrap();
        assert_eq!(current.uid, "u1");
        assert_eq!(current.id_token, "id-u1-refreshed-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_does_not_retry_failures() {
        let provider = ScriptedIdentityProvider::new();
        provider.fail_refreshes(true);
        let store = SessionStore::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = spawn_token_refresher(Arc::new(provider.clone()), store.clone(), shutdown_rx);

        // Already inside the refresh margin, so the refresh is due immediately
        store.replace(session("u1", Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(3600)).await;
        tokio::task::yield_now().await;

        assert_eq!(provider.refresh_count(), 1);
        assert_eq!(store.current().map(|s| s.id_token), Some("id-u1".to_string()));
    }

    #[tokio::test]
    async fn test_refresher_stops_on_shutdown() {
        let provider = ScriptedIdentityProvider::new();
        let store = SessionStore::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_token_refresher(Arc::new(provider), store, shutdown_rx);

        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("refresher did not stop")
            .unwrap();
    }
}
