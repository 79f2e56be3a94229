use reqour_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallbackError {
    /// Nothing was sent: the payload, method or URL was rejected up front.
    #[error("Invalid callback: {0}")]
    Validation(String),

    /// The request could not be completed by the transport.
    #[error("Callback delivery to {url} failed: {source}")]
    Delivery {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CoreError> for CallbackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => CallbackError::Validation(msg),
        }
    }
}

impl CallbackError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }
}

pub type Result<T> = std::result::Result<T, CallbackError>;
