//! Upload error taxonomy
//!
//! None of the variants carry credential material. Provider errors keep the
//! raw status and body so callers can inspect the provider's XML error detail.

use thiserror::Error;

/// Errors surfaced by policy signing and POST uploads
#[derive(Error, Debug)]
pub enum UploadError {
    /// A required option is missing or invalid. Raised before any network I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Clock or serialization failure while building the policy
    #[error("Signing error: {0}")]
    Signing(String),

    /// No response was received from the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("Provider error: {status} - {body}")]
    Provider { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::Signing(format!("Policy serialization failed: {}", err))
    }
}

impl From<hyper::http::Error> for UploadError {
    fn from(err: hyper::http::Error) -> Self {
        UploadError::Transport(format!("Request build error: {}", err))
    }
}

impl From<hyper_util::client::legacy::Error> for UploadError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        UploadError::Transport(format!("Request failed: {}", err))
    }
}

impl UploadError {
    /// Status code of a provider rejection, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
