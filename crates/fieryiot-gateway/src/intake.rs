// Credential intake HTTP routes
// Decision: The whole request body is the identity token; no parsing, no size limit
// Decision: 200 only means "received"; the exchange outcome never reaches the caller
// Decision: Every path behaves like `/`, and every non-POST method gets the same 405

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use fieryiot_core::{Authenticator, IdentityToken};

/// App state for the intake routes
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }
}

/// Create the credential intake routes
pub fn routes(state: AppState) -> Router {
    let intake = post(receive_credential)
        .fallback(method_not_supported)
        .with_state(state);

    Router::new()
        .route("/", intake.clone())
        .fallback_service(intake)
        .layer(DefaultBodyLimit::disable())
}

/// POST / - Accept an identity token and start exchanging it for a session
async fn receive_credential(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    tracing::info!(bytes = body.len(), "POST request");

    let token = IdentityToken::new(String::from_utf8_lossy(&body).into_owned());
    // Detached: the response does not wait for the identity provider
    let _exchange = state.authenticator.submit(token);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        "Credential received\n",
    )
}

/// Any other method - 405 with the allowed method listed
async fn method_not_supported(method: Method) -> impl IntoResponse {
    tracing::info!(method = %method, "Unsupported HTTP request");

    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::CONTENT_TYPE, "text/plain"), (header::ALLOW, "POST")],
        "Method not supported\n",
    )
}
