// FieryIoT gateway
// Decision: One process hosts the credential intake endpoint and the sensor publisher
// Decision: Current-thread runtime; nothing here needs parallelism, only interleaving

mod config;
mod intake;

use std::sync::Arc;

use anyhow::{Context, Result};
use fieryiot_core::{
    spawn_session_listener, spawn_token_refresher, Authenticator, EventDatabase,
    IdentityProvider, SessionStore,
};
use fieryiot_firebase::{FirebaseAuth, FirebaseConfig, RealtimeDatabase};
use fieryiot_worker::{Publisher, PublisherConfig};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::GatewayConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fieryiot_gateway=info,fieryiot_core=info,fieryiot_worker=info,fieryiot_firebase=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("fieryiot-gateway starting...");

    // Load configuration from environment
    let gateway_config = GatewayConfig::from_env();
    let firebase_config = FirebaseConfig::from_env().context("Invalid Firebase configuration")?;
    let publisher_config = PublisherConfig::from_env();
    tracing::info!(
        database_url = %firebase_config.database_url,
        auth_domain = %firebase_config.auth_domain,
        interval_ms = publisher_config.interval.as_millis() as u64,
        "Gateway configured"
    );

    // Firebase collaborators
    let identity: Arc<dyn IdentityProvider> = Arc::new(
        FirebaseAuth::new(&firebase_config).context("Failed to create Firebase auth client")?,
    );
    let database: Arc<dyn EventDatabase> = Arc::new(
        RealtimeDatabase::new(&firebase_config)
            .context("Failed to create Firebase database client")?,
    );

    let store = SessionStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background tasks
    let background = [
        spawn_session_listener(store.subscribe(), shutdown_rx.clone()),
        spawn_token_refresher(identity.clone(), store.clone(), shutdown_rx.clone()),
        Publisher::new(&publisher_config, store.clone(), database).spawn(shutdown_rx),
    ];

    // Build HTTP routes
    let authenticator = Authenticator::new(identity, store);
    let app = intake::routes(intake::AppState::new(authenticator)).layer(TraceLayer::new_for_http());

    // Start server
    let addr = gateway_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop background tasks
    let _ = shutdown_tx.send(true);
    for handle in background {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    tracing::info!("Gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server simply runs until killed
            tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use fieryiot_core::memory::{InMemoryEventDatabase, ScriptedIdentityProvider};
    use fieryiot_core::{DatabasePath, Session};
    use fieryiot_worker::TickOutcome;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_credential_then_tick_appends_for_user() {
        let provider = ScriptedIdentityProvider::new();
        provider
            .add_session(
                "tok123",
                Session::new("u1", "id", "refresh", Duration::from_secs(3600)),
            )
            .await;
        let store = SessionStore::new();
        let db = InMemoryEventDatabase::new();
        let publisher = Publisher::new(
            &PublisherConfig::default(),
            store.clone(),
            Arc::new(db.clone()),
        );
        let app = intake::routes(intake::AppState::new(Authenticator::new(
            Arc::new(provider),
            store.clone(),
        )));

        // Before sign-in the tick is a no-op
        assert!(matches!(publisher.tick(), TickOutcome::Skipped));

        let mut sessions = store.subscribe();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/")
                    .body(Body::from("tok123"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::timeout(Duration::from_secs(1), sessions.changed())
            .await
            .expect("session was not published")
            .unwrap();

        match publisher.tick() {
            TickOutcome::Dispatched { path, handle } => {
                assert_eq!(path.as_str(), "sensorevents/u1");
                handle.await.unwrap();
            }
            TickOutcome::Skipped => panic!("expected a dispatched tick"),
        }

        let records = db.records_at(&DatabasePath::sensor_events("u1")).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event.value, "foo-sensor-value");
        assert!(records[0].event.timestamp().is_some());
        assert_eq!(db.append_count(), 1);
    }
}
