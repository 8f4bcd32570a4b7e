use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt::Display;

/// Message shown to the user when a listing fetch fails
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch movies. Please check your API key.";

/// Coarse classification of catalog failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response: connect failure, timeout, transport error
    Network,
    /// Missing or rejected credential
    Auth,
    /// Valid request for a resource that does not exist
    NotFound,
    /// Response body could not be parsed
    Malformed,
    Unknown,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Errors surfaced by the movie catalog client
///
/// The client never retries; every failure is handed to the caller as one of
/// these variants.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Catalog error: {0}")]
    Unknown(String),
}

/// Error body TMDB returns alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    status_message: Option<String>,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Network(_) => ErrorKind::Network,
            CatalogError::Auth(_) => ErrorKind::Auth,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Malformed(_) => ErrorKind::Malformed,
            CatalogError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Maps a non-2xx response to an error, preferring TMDB's `status_message`
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<TmdbErrorBody>(body)
            .ok()
            .and_then(|b| b.status_message)
            .unwrap_or_else(|| body.to_string());
        let message = format!("Catalog API returned status {}: {}", status, detail);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Auth(message),
            StatusCode::NOT_FOUND => CatalogError::NotFound(message),
            _ => CatalogError::Unknown(message),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CatalogError::from_status(status, "");
        }
        if err.is_decode() {
            CatalogError::Malformed(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            CatalogError::Network(err.to_string())
        } else {
            CatalogError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Malformed(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by the persisted key-value storage
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
