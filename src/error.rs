use thiserror::Error;

/// Closed error-kind set for the retrieval/rendering core.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request error: {0}")]
    Request(String),

    #[error("parameter error: {0}")]
    Params(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("processing error: {0}")]
    Processing(String),

    #[error("translate error: {0}")]
    Translate(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Request(format!("json decode: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// The error kind name as used in the HTTP server's `{error: "Kind: message"}` body.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Request(_) => "Request",
            FetchError::Params(_) => "Parameter",
            FetchError::NotFound(_) => "NotFound",
            FetchError::Decrypt(_) => "Decrypt",
            FetchError::Processing(_) => "Processing",
            FetchError::Translate(_) => "Translate",
        }
    }
}
