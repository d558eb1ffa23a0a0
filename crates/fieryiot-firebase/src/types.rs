// Firebase REST Protocol Types
//
// Request and response bodies for the Identity Toolkit, Secure Token and
// Realtime Database endpoints. Only the fields the gateway uses are modelled.

use serde::{Deserialize, Serialize};

/// accounts:signInWithIdp request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWithIdpRequest {
    /// Form-encoded IdP credential, e.g. `id_token=...&providerId=google.com`
    pub post_body: String,
    pub request_uri: String,
    pub return_idp_credential: bool,
    pub return_secure_token: bool,
}

/// accounts:signInWithIdp response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWithIdpResponse {
    pub local_id: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Seconds, encoded as a string
    pub expires_in: Option<String>,
    pub email: Option<String>,
    /// Set instead of tokens when the sign-in needs user action (e.g. account linking)
    pub error_message: Option<String>,
}

/// Secure Token refresh response body
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
    /// Seconds, encoded as a string
    pub expires_in: String,
}

/// Google API error envelope: `{"error": {"code": 400, "message": "..."}}`
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleApiErrorResponse {
    pub error: GoogleApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleApiError {
    pub code: u16,
    pub message: String,
}

/// Realtime Database error envelope: `{"error": "Permission denied"}`
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseErrorResponse {
    pub error: String,
}

/// Parse Firebase's stringly-typed `expiresIn`, defaulting to one hour
pub fn parse_expires_in(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_in_request_uses_camel_case() {
        let request = SignInWithIdpRequest {
            post_body: "id_token=t&providerId=google.com".to_string(),
            request_uri: "http://localhost".to_string(),
            return_idp_credential: true,
            return_secure_token: true,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "postBody": "id_token=t&providerId=google.com",
                "requestUri": "http://localhost",
                "returnIdpCredential": true,
                "returnSecureToken": true
            })
        );
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in(Some("1800")), 1800);
        assert_eq!(parse_expires_in(Some("soon")), 3600);
        assert_eq!(parse_expires_in(None), 3600);
    }
}
