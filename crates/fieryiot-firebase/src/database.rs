// Firebase Realtime Database Client
//
// Implements the EventDatabase trait from fieryiot-core on top of the
// Realtime Database REST API. An append is a PUT to a freshly generated
// push key, authorized with the session's ID token.

use async_trait::async_trait;
use fieryiot_core::{DatabaseError, DatabasePath, EventDatabase, SensorEvent, Session};
use reqwest::Client;

use crate::config::{FirebaseConfig, FirebaseError};
use crate::push_id::PushIdGenerator;
use crate::types::DatabaseErrorResponse;

/// Realtime Database event store
pub struct RealtimeDatabase {
    client: Client,
    database_url: String,
    push_ids: PushIdGenerator,
}

impl RealtimeDatabase {
    /// Create a client for the configured project database
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(concat!("fieryiot-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            database_url: config.database_url.trim_end_matches('/').to_string(),
            push_ids: PushIdGenerator::new(),
        })
    }

    fn record_url(&self, path: &DatabasePath, key: &str) -> String {
        format!("{}/{}/{}.json", self.database_url, path, key)
    }
}

#[async_trait]
impl EventDatabase for RealtimeDatabase {
    async fn append(
        &self,
        session: &Session,
        path: &DatabasePath,
        event: &SensorEvent,
    ) -> Result<String, DatabaseError> {
        let key = self.push_ids.generate();
        tracing::debug!(path = %path, key = %key, "Writing record to Realtime Database");

        let response = self
            .client
            .put(self.record_url(path, &key))
            .query(&[("auth", session.id_token.as_str())])
            .json(event)
            .send()
            .await
            .map_err(|e| DatabaseError::transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<DatabaseErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(DatabaseError::rejected(status, message));
        }

        Ok(key)
    }
}
