//! Credential storage errors

/// Standard result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors raised while reading or writing stored credentials
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Credential storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Credential storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl SessionError {
    /// Create an unavailable-storage error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
