//! Client error types

use erp_core::SessionError;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed and could not be renewed for this request
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The refresh endpoint rejected the refresh token
    #[error("Token refresh failed with status {status}: {message}")]
    RefreshFailed { status: u16, message: String },

    /// Credentials were cleared; the user has to log in again
    #[error("Session invalidated, log in again at {redirect_to}: {cause}")]
    SessionInvalidated {
        redirect_to: String,
        cause: Box<ClientError>,
    },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential storage error
    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub(crate) fn session_invalidated(redirect_to: String, cause: Self) -> Self {
        Self::SessionInvalidated {
            redirect_to,
            cause: Box::new(cause),
        }
    }

    /// Whether the session is gone and the user must log in again
    pub fn is_session_invalidated(&self) -> bool {
        matches!(self, Self::SessionInvalidated { .. })
    }

    /// Login entry point to send the user to, for invalidated sessions
    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Self::SessionInvalidated { redirect_to, .. } => Some(redirect_to),
            _ => None,
        }
    }

    /// The failure that invalidated the session, or `self` for any other error
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::SessionInvalidated { cause, .. } => cause,
            other => other,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::ServerError { status, .. } | Self::RefreshFailed { status, .. } => Some(*status),
            Self::AuthenticationFailed(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Forbidden(_) => Some(403),
            Self::SessionInvalidated { cause, .. } => cause.status(),
            Self::Serialization(_) | Self::Session(_) | Self::Configuration(_) => None,
        }
    }
}
