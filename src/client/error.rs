use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status and (usually) a message
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("Not found")]
    NotFound,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::NotFound => Some(404),
            _ => None,
        }
    }
}
