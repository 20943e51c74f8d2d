use thiserror::Error;

#[derive(Error, Debug)]
pub enum StonksError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer from the backend, carrying the message it sent back.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StonksError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StonksError::Api { status, .. } => Some(*status),
            StonksError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StonksError>;
