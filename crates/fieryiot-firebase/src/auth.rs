// Firebase Authentication Client
//
// Implements the IdentityProvider trait from fieryiot-core:
// - Google ID tokens are exchanged via accounts:signInWithIdp
// - Sessions are refreshed via the Secure Token API

use async_trait::async_trait;
use fieryiot_core::{IdentityError, IdentityProvider, IdentityToken, Session};
use reqwest::{Client, Response};
use std::time::Duration;
use url::form_urlencoded;

use crate::config::{FirebaseConfig, FirebaseError};
use crate::types::{
    parse_expires_in, GoogleApiErrorResponse, RefreshTokenResponse, SignInWithIdpRequest,
    SignInWithIdpResponse,
};

const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Firebase Authentication identity provider
pub struct FirebaseAuth {
    client: Client,
    api_key: String,
    sign_in_url: String,
    refresh_url: String,
    request_uri: String,
}

impl FirebaseAuth {
    /// Create a client for the configured project
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(concat!("fieryiot-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            sign_in_url: format!(
                "{}/v1/accounts:signInWithIdp",
                config.identity_url.trim_end_matches('/')
            ),
            refresh_url: format!("{}/v1/token", config.secure_token_url.trim_end_matches('/')),
            request_uri: config.request_uri(),
        })
    }

    /// Map a non-success Google API response to an identity error
    async fn rejection(response: Response) -> IdentityError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<GoogleApiErrorResponse>(&body) {
            Ok(parsed) => IdentityError::rejected(parsed.error.code, parsed.error.message),
            Err(_) => IdentityError::rejected(status, body),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn exchange_credential(&self, token: &IdentityToken) -> Result<Session, IdentityError> {
        let request = SignInWithIdpRequest {
            post_body: form_urlencoded::Serializer::new(String::new())
                .append_pair("id_token", token.as_str())
                .append_pair("providerId", GOOGLE_PROVIDER_ID)
                .finish(),
            request_uri: self.request_uri.clone(),
            return_idp_credential: true,
            return_secure_token: true,
        };

        tracing::debug!(token_bytes = token.len(), "Signing in to Firebase with Google credential");

        let response = self
            .client
            .post(&self.sign_in_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| IdentityError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let status = response.status().as_u16();
        let body: SignInWithIdpResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::invalid_response(e.to_string()))?;

        if let Some(message) = body.error_message {
            return Err(IdentityError::Rejected {
                code: status,
                message,
                email: body.email,
            });
        }

        match (body.local_id, body.id_token, body.refresh_token) {
            (Some(uid), Some(id_token), Some(refresh_token)) => {
                let expires_in = parse_expires_in(body.expires_in.as_deref());
                let session =
                    Session::new(uid, id_token, refresh_token, Duration::from_secs(expires_in));
                Ok(match body.email {
                    Some(email) => session.with_email(email),
                    None => session,
                })
            }
            _ => Err(IdentityError::invalid_response(
                "signInWithIdp response is missing localId, idToken or refreshToken",
            )),
        }
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, IdentityError> {
        tracing::debug!(uid = %session.uid, "Refreshing Firebase ID token");

        let response = self
            .client
            .post(&self.refresh_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: RefreshTokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::invalid_response(e.to_string()))?;

        let expires_in = parse_expires_in(Some(&body.expires_in));
        let refreshed = Session::new(
            body.user_id,
            body.id_token,
            body.refresh_token,
            Duration::from_secs(expires_in),
        );
        Ok(Session {
            email: session.email.clone(),
            ..refreshed
        })
    }
}
