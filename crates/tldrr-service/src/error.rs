//! Service error types

use tldrr_core::ServiceResponse;

/// Broad failure classes reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No credential; nothing was sent
    Configuration,
    /// Network failure or non-2xx status
    Transport,
    /// 2xx response without the expected text
    MalformedResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("API key not configured. Please set your Gemini API key in the extension popup.")]
    MissingApiKey,
    #[error("API request failed: {status} {reason}")]
    Http { status: u16, reason: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid response from Gemini API")]
    MalformedResponse,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey => ErrorKind::Configuration,
            Self::Http { .. } | Self::Network(_) => ErrorKind::Transport,
            Self::MalformedResponse => ErrorKind::MalformedResponse,
        }
    }
}

impl From<ServiceError> for ServiceResponse {
    fn from(err: ServiceError) -> Self {
        ServiceResponse::failure(err.to_string())
    }
}
