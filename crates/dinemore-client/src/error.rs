use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failures of the client-local key/value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Value refused before anything was written.
    #[error("refusing to store {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Errors returned by the DineMore API client and the state built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the body text, or the status text when
    /// the body is empty.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// A non-admin account tried to sign in to the admin portal.
    #[error("account type '{user_type}' is not allowed to sign in to the admin portal")]
    RoleMismatch { user_type: String },

    #[error("not signed in")]
    NotAuthenticated,

    #[error("branch context used outside an authenticated restaurant session")]
    NoBranchContext,

    #[error("branch context has no restaurant to load branches for")]
    MissingRestaurant,

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Error of a de-duplicated fetch, shared by every caller that awaited it.
    #[error(transparent)]
    Shared(Arc<ClientError>),
}

impl ClientError {
    /// HTTP status code, if this error came from a non-2xx response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
