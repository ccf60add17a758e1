use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("access denied for {0}")]
    AccessDenied(String),

    #[error("retry budget exhausted after {attempts} attempts: {cause}")]
    Exhausted { attempts: u32, cause: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid collection id: {0}")]
    InvalidCollectionId(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("fetch cancelled")]
    Cancelled,
}

/// Coarse classification of a failed request, consumed by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    Server,
    Network,
    Denied,
    Malformed,
}

impl ErrorKind {
    /// Rate-limit signals, 5xx responses and transport failures are worth
    /// another attempt; denied and malformed never are.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited | ErrorKind::Server | ErrorKind::Network
        )
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
