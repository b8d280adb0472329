use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenflowError {
    /// Rejected before any network call (bad address, bad date range, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No API key could be resolved, or a setting is out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream reported failure (string result other than the empty sentinel, or null result).
    #[error("Explorer API error: status={status} message={message} result={result} url={url}")]
    Api {
        status: String,
        message: String,
        result: String,
        url: String,
    },

    #[error("Unexpected API response shape: status={status} message={message} result={result} url={url}")]
    UnexpectedShape {
        status: String,
        message: String,
        result: String,
        url: String,
    },

    #[error("Missing columns {missing:?}. columns={columns:?} sample_row={sample}")]
    Schema {
        missing: Vec<String>,
        columns: Vec<String>,
        sample: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TokenflowError>;

impl TokenflowError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TokenflowError::InvalidInput(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        TokenflowError::Configuration(msg.into())
    }

    /// Errors raised before any request was issued.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TokenflowError::InvalidInput(_) | TokenflowError::Configuration(_)
        )
    }
}
