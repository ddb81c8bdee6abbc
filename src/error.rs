use thiserror::Error;

/// Failures talking to the upstream dictionary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("upstream answered with HTTP {0}")]
    HttpStatus(u16),

    #[error("unexpected upstream payload: {0}")]
    Malformed(String),

    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether the user should be told to check their connection.
    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Transport(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if err.is_decode() || err.is_body() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum DictError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cached entry for `{keyword}` is unreadable")]
    CacheCorrupt {
        keyword: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{0}` is not in the word list")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = DictError> = std::result::Result<T, E>;
