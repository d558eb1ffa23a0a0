// Error types for the gateway collaborators

use thiserror::Error;

/// Errors returned by an identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the credential (bad or expired token, disabled account, ...)
    #[error("{message} ({code})")]
    Rejected {
        /// Provider status code
        code: u16,
        /// Provider error message, e.g. `INVALID_IDP_RESPONSE`
        message: String,
        /// Account the credential belonged to, when the provider reports it
        email: Option<String>,
    },

    /// The provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with something we could not decode
    #[error("Invalid identity provider response: {0}")]
    InvalidResponse(String),
}

impl IdentityError {
    /// Create a rejection error
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        IdentityError::Rejected {
            code,
            message: message.into(),
            email: None,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        IdentityError::Transport(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        IdentityError::InvalidResponse(msg.into())
    }

    /// Error code for logging: the provider status, or a short tag for local failures
    pub fn code(&self) -> String {
        match self {
            IdentityError::Rejected { code, .. } => code.to_string(),
            IdentityError::Transport(_) => "transport".to_string(),
            IdentityError::InvalidResponse(_) => "invalid-response".to_string(),
        }
    }

    /// Human readable message without the code suffix
    pub fn message(&self) -> &str {
        match self {
            IdentityError::Rejected { message, .. } => message,
            IdentityError::Transport(msg) | IdentityError::InvalidResponse(msg) => msg,
        }
    }

    /// Email of the account the failed attempt was for, if known
    pub fn email(&self) -> Option<&str> {
        match self {
            IdentityError::Rejected { email, .. } => email.as_deref(),
            _ => None,
        }
    }
}

/// Errors returned by an event database
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database refused the write (permission denied, bad path, ...)
    #[error("Database rejected write with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The database could not be reached
    #[error("Database unreachable: {0}")]
    Transport(String),
}

impl DatabaseError {
    /// Create a rejection error
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        DatabaseError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        DatabaseError::Transport(msg.into())
    }
}
