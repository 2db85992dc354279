use thiserror::Error;

/// Failures of a single request against the news API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request timed out")]
    Timeout,

    #[error("Offline mode is active")]
    OfflineModeActive,

    #[error("Client error: HTTP {0}")]
    ClientStatus(u16),

    #[error("Server error: HTTP {0}")]
    ServerStatus(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl NetworkError {
    pub fn from_status(code: u16) -> Self {
        if (500..600).contains(&code) {
            Self::ServerStatus(code)
        } else {
            Self::ClientStatus(code)
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures of the key-value persistence layer.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Storage lock poisoned: {0}")]
    Lock(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum NewsdeskError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Unknown category: {0}")]
    InvalidCategory(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, NewsdeskError>;
