//! Error types for docreview-core.
//!
//! Each concern gets its own enum. None of these are fatal: callers degrade to
//! a default state and log instead of propagating past the component boundary.

/// Failure of the physical key/value store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage quota exceeded writing '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Rejected settings access.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("unknown settings path '{0}'")]
    UnknownPath(String),

    #[error("invalid value for '{path}': {reason}")]
    InvalidValue { path: String, reason: String },
}

/// Outcome of a failed request to the review server.
///
/// Every transport outcome is normalised into one of these variants; nothing
/// past the request boundary sees a raw `reqwest` or JSON error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Network failure: connection refused, DNS, TLS, reset.
    #[error("network error: {0}")]
    Transport(String),

    /// The caller cancelled the request.
    #[error("request aborted")]
    Aborted,

    /// Non-OK HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered `{success: false, error}`.
    #[error("server error: {0}")]
    Server(String),

    /// The body could not be parsed as the expected JSON shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Short human text suitable for a one-line notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Could not reach the review server.".to_owned(),
            ApiError::Aborted => "Operation cancelled.".to_owned(),
            ApiError::Status { status: 413, .. } => "The document is too large to upload.".to_owned(),
            ApiError::Status { status: 429, .. } => {
                "Too many requests. Please wait a moment and try again.".to_owned()
            }
            ApiError::Status { status, message } => format!("Server returned {status}: {message}"),
            ApiError::Server(msg) => msg.clone(),
            ApiError::InvalidResponse(_) => "The server sent an unreadable response.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_for_mapped_statuses() {
        let too_big = ApiError::Status { status: 413, message: "Payload Too Large".into() };
        assert_eq!(too_big.user_message(), "The document is too large to upload.");
        let busy = ApiError::Status { status: 429, message: String::new() };
        assert!(busy.user_message().starts_with("Too many requests"));
        let other = ApiError::Status { status: 500, message: "boom".into() };
        assert_eq!(other.user_message(), "Server returned 500: boom");
        assert_eq!(ApiError::Server("Job not found".into()).user_message(), "Job not found");
    }
}
